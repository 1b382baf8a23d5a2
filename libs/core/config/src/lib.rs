pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Deployment environment, selected by `APP_ENV`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read an environment variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable or fail with [`ConfigError::MissingEnvVar`]
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read and parse an environment variable, using `default` when unset
///
/// The default goes through the same parser, so a bad default is reported
/// exactly like a bad value.
pub fn env_parse<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        })
}

/// Read a comma-separated list; blank entries are skipped
pub fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("REGIONS_MISSING_REQUIRED", || {
            let err = env_required("REGIONS_MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("REGIONS_MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_parse_default_and_value() {
        temp_env::with_var_unset("REGIONS_PARSE_NUM", || {
            let value: u32 = env_parse("REGIONS_PARSE_NUM", "7").unwrap();
            assert_eq!(value, 7);
        });

        temp_env::with_var("REGIONS_PARSE_NUM", Some(" 42 "), || {
            let value: u32 = env_parse("REGIONS_PARSE_NUM", "7").unwrap();
            assert_eq!(value, 42);
        });
    }

    #[test]
    fn test_env_parse_invalid_names_key() {
        temp_env::with_var("REGIONS_PARSE_BAD", Some("nope"), || {
            let err = env_parse::<u32>("REGIONS_PARSE_BAD", "1").unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { .. }));
            assert!(err.to_string().contains("REGIONS_PARSE_BAD"));
        });
    }

    #[test]
    fn test_env_list_skips_blanks() {
        temp_env::with_var("REGIONS_LIST", Some("a, b,,  c ,"), || {
            assert_eq!(env_list("REGIONS_LIST"), vec!["a", "b", "c"]);
        });

        temp_env::with_var_unset("REGIONS_LIST", || {
            assert!(env_list("REGIONS_LIST").is_empty());
        });
    }
}
