/// Configuration Module
///
/// API and database connection configuration. Every required parameter is
/// validated for presence before any network attempt; nothing required is
/// silently defaulted.
use std::env;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::error::{EtlError, EtlResult};

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// HTTP API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry_attempts: u32,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }

    /// Load API settings from the environment. The base URL is required;
    /// timeout and retry budget are tunables with defaults.
    pub fn from_env() -> EtlResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from a key lookup. Seam for tests to inject parameter maps.
    pub fn from_lookup<F>(lookup: F) -> EtlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("API_BASE_URL")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| EtlError::Configuration("API_BASE_URL is not set".to_string()))?;

        let mut config = Self::new(base_url);

        if let Some(raw) = lookup("API_TIMEOUT_SECS") {
            let secs = raw
                .parse()
                .map_err(|_| EtlError::Configuration(format!("API_TIMEOUT_SECS is not a number: {raw}")))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("API_RETRY_ATTEMPTS") {
            config.retry_attempts = raw
                .parse()
                .map_err(|_| EtlError::Configuration(format!("API_RETRY_ATTEMPTS is not a number: {raw}")))?;
        }

        Ok(config)
    }
}

/// Database connection parameters. Owned by the caller that constructs a
/// `DataStore`, not persisted elsewhere.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    /// Load connection parameters from the environment. All keys are
    /// required; absence of any fails before any connection attempt.
    pub fn from_env() -> EtlResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from a key lookup. Seam for tests to inject parameter maps.
    pub fn from_lookup<F>(lookup: F) -> EtlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |key: &'static str| match lookup(key) {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                missing.push(key);
                None
            }
        };

        let host = require("DB_HOST");
        let port = require("DB_PORT");
        let dbname = require("DB_NAME");
        let user = require("DB_USER");
        let password = require("DB_PASSWORD");

        if !missing.is_empty() {
            return Err(EtlError::Configuration(format!(
                "missing required database parameters: {}. Please check your environment variables",
                missing.join(", ")
            )));
        }

        let (Some(host), Some(port), Some(dbname), Some(user), Some(password)) =
            (host, port, dbname, user, password)
        else {
            return Err(EtlError::Configuration("missing required database parameters".to_string()));
        };

        let port = port
            .parse()
            .map_err(|_| EtlError::Configuration(format!("DB_PORT is not a valid port number: {port}")))?;

        Ok(Self { host, port, dbname, user, password })
    }

    /// Connection options for the pool
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user)
            .password(&self.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_db_config_lists_every_missing_parameter() {
        let err = DbConfig::from_lookup(lookup_from(&[("DB_HOST", "localhost"), ("DB_PORT", "5432")])).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("DB_NAME"));
        assert!(message.contains("DB_USER"));
        assert!(message.contains("DB_PASSWORD"));
        assert!(!message.contains("DB_HOST"));
    }

    #[test]
    fn test_db_config_rejects_empty_values() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_NAME", "store"),
            ("DB_USER", "postgres"),
            ("DB_PASSWORD", ""),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("DB_PASSWORD"));
    }

    #[test]
    fn test_db_config_accepts_complete_parameters() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_NAME", "store"),
            ("DB_USER", "postgres"),
            ("DB_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "store");
    }

    #[test]
    fn test_db_config_rejects_bad_port() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "not-a-port"),
            ("DB_NAME", "store"),
            ("DB_USER", "postgres"),
            ("DB_PASSWORD", "secret"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_api_config_requires_base_url() {
        assert!(ApiConfig::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn test_api_config_applies_tunables() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("API_BASE_URL", "https://fakestoreapi.in/api"),
            ("API_TIMEOUT_SECS", "10"),
            ("API_RETRY_ATTEMPTS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://fakestoreapi.in/api");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.retry_attempts, 5);
    }

    #[test]
    fn test_api_config_defaults_tunables() {
        let config =
            ApiConfig::from_lookup(lookup_from(&[("API_BASE_URL", "https://fakestoreapi.in/api")])).unwrap();

        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
    }
}
