//! Configuration for the region admin tool

use core_config::{ConfigError, Environment, FromEnv};
use database::common::RetryConfig;
use database::postgres::PostgresConfig;
use domain_regions::MaskingPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub database: PostgresConfig,
    pub retry: RetryConfig,
    /// Key fragments whose config values are redacted by `masked-config`
    pub masking: MaskingPolicy,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            database: PostgresConfig::from_env()?,
            retry: RetryConfig::from_env()?,
            masking: MaskingPolicy::from_env()?,
        })
    }
}
