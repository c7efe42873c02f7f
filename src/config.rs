//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Anything that is set but cannot be parsed aborts startup instead of
//! silently falling back to a default.

use std::time::Duration;

use thiserror::Error;

use crate::generator::{DEFAULT_ID_LENGTH, MAX_ID_LENGTH, MIN_ID_LENGTH};

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_DATABASE_URL: &str = "short-url.db";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration of the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server port number (`PORT`)
    pub port: u16,
    /// Path to the redb file (`DATABASE_URL`)
    pub database_url: String,
    /// Base used to compose the shareable link (`PUBLIC_URL`), without trailing slash
    pub public_url: String,
    /// Upper bound on one storage round trip (`STORE_TIMEOUT_MS`)
    pub store_timeout: Duration,
    /// Length of generated short ids (`ID_LENGTH`)
    pub id_length: usize,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(value) => parse("PORT", &value)?,
            None => DEFAULT_PORT,
        };

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let public_url = get("PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let timeout_ms: u64 = match get("STORE_TIMEOUT_MS") {
            Some(value) => parse("STORE_TIMEOUT_MS", &value)?,
            None => DEFAULT_STORE_TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(invalid("STORE_TIMEOUT_MS", "0", "must be greater than zero"));
        }

        let id_length: usize = match get("ID_LENGTH") {
            Some(value) => parse("ID_LENGTH", &value)?,
            None => DEFAULT_ID_LENGTH,
        };
        if !(MIN_ID_LENGTH..=MAX_ID_LENGTH).contains(&id_length) {
            return Err(invalid(
                "ID_LENGTH",
                &id_length.to_string(),
                &format!("must be between {} and {}", MIN_ID_LENGTH, MAX_ID_LENGTH),
            ));
        }

        Ok(Self {
            port,
            database_url,
            public_url,
            store_timeout: Duration::from_millis(timeout_ms),
            id_length,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            public_url: format!("http://localhost:{}", DEFAULT_PORT),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            id_length: DEFAULT_ID_LENGTH,
        }
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| invalid(name, value, &err.to_string()))
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
