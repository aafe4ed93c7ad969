use std::{env, str::FromStr};

use thiserror::Error;

use crate::oauth2::OAuth2Config;
use crate::passkey::PasskeyConfig;
use crate::storage::{StorageConfig, StorageError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<StorageError> for ConfigError {
    fn from(err: StorageError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Non-empty value of an environment variable.
pub(crate) fn env_or(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset or unparsable.
pub(crate) fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env_or(key) {
        Some(v) => v.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {}. Using default", key, v);
            default
        }),
        None => default,
    }
}

/// Everything needed to build a [`crate::ModernAuth`] service.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    pub passkey: PasskeyConfig,
    pub oauth2: OAuth2Config,
    pub storage: StorageConfig,
    /// Client id recorded on grants issued directly by a ceremony
    pub auth_client_id: String,
}

impl AuthConfig {
    /// Settings for `origin` with in-memory stores.
    pub fn new(origin: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            passkey: PasskeyConfig::new(origin)?,
            oauth2: OAuth2Config::new(origin),
            storage: StorageConfig::default(),
            auth_client_id: "modern-auth".to_string(),
        })
    }

    /// Read the configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let origin = env_or("ORIGIN").ok_or_else(|| ConfigError::Missing("ORIGIN".to_string()))?;

        Ok(Self {
            passkey: PasskeyConfig::from_env(&origin)?,
            oauth2: OAuth2Config::from_env(&origin),
            storage: StorageConfig::from_env()?,
            auth_client_id: env_or("AUTH_CLIENT_ID").unwrap_or_else(|| "modern-auth".to_string()),
        })
    }
}
