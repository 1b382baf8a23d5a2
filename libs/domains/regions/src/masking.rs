//! Redaction of sensitive region configuration values
//!
//! A key is sensitive when its upper-cased form contains one of the policy
//! fragments. Sensitive values keep their last two characters per
//! whitespace-separated word; everything else becomes `*`.

use core_config::{ConfigError, FromEnv, env_list};
use serde_json::{Map, Value};

/// Fragments matched against upper-cased config keys
pub const DEFAULT_SENSITIVE_FRAGMENTS: &[&str] =
    &["KEY", "SECRET", "CREDENTIALS", "API", "PASSWORD", "TOKEN"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskingPolicy {
    fragments: Vec<String>,
}

impl MaskingPolicy {
    /// A policy matching exactly `fragments` (no defaults)
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self {
            fragments: Vec::new(),
        };
        for fragment in fragments {
            policy = policy.with_fragment(fragment.as_ref());
        }
        policy
    }

    pub fn with_fragment(mut self, fragment: &str) -> Self {
        let fragment = fragment.trim().to_uppercase();
        if !fragment.is_empty() && !self.fragments.contains(&fragment) {
            self.fragments.push(fragment);
        }
        self
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_uppercase();
        self.fragments.iter().any(|f| key.contains(f.as_str()))
    }

    /// Mask every character that is followed by at least two more
    /// non-whitespace characters, e.g. `"AKIAXYZ"` -> `"*****YZ"`
    pub fn mask_value(value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();

        chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let hidden = !c.is_whitespace()
                    && chars
                        .get(i + 1..i + 3)
                        .is_some_and(|next| next.iter().all(|n| !n.is_whitespace()));
                if hidden { '*' } else { c }
            })
            .collect()
    }

    /// Return a redacted copy of a JSON document
    ///
    /// Objects are walked recursively; scalar values under sensitive keys are
    /// masked through their string form. The input is never modified.
    pub fn mask_json(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let masked: Map<String, Value> = map
                    .iter()
                    .map(|(key, inner)| {
                        let inner = match inner {
                            Value::Object(_) | Value::Array(_) => self.mask_json(inner),
                            Value::Null => Value::Null,
                            Value::String(s) if self.is_sensitive(key) => {
                                Value::String(Self::mask_value(s))
                            }
                            other if self.is_sensitive(key) => {
                                Value::String(Self::mask_value(&other.to_string()))
                            }
                            other => other.clone(),
                        };
                        (key.clone(), inner)
                    })
                    .collect();
                Value::Object(masked)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.mask_json(v)).collect()),
            other => other.clone(),
        }
    }
}

impl Default for MaskingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_FRAGMENTS)
    }
}

/// `REGION_CONFIG_MASKED_KEYS` (comma-separated) adds fragments on top of the
/// defaults.
impl FromEnv for MaskingPolicy {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(env_list("REGION_CONFIG_MASKED_KEYS")
            .iter()
            .fold(Self::default(), |policy, fragment| {
                policy.with_fragment(fragment)
            }))
    }
}
