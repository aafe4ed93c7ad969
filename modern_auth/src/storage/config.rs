use std::{env, fmt, str::FromStr};

use super::errors::StorageError;

/// Backend kinds accepted by `GENERIC_CACHE_STORE_TYPE` and `GENERIC_DATA_STORE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
    Sqlite,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" => Ok(Self::Postgres),
            t => Err(StorageError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'memory', 'redis', 'sqlite' and 'postgres'"
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub cache_store_type: StoreBackend,
    pub cache_store_url: String,
    pub data_store_type: StoreBackend,
    pub data_store_url: String,
    pub table_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_store_type: StoreBackend::Memory,
            cache_store_url: String::new(),
            data_store_type: StoreBackend::Memory,
            data_store_url: String::new(),
            table_prefix: "ma_".to_string(),
        }
    }
}

impl StorageConfig {
    pub(crate) fn from_env() -> Result<Self, StorageError> {
        let defaults = Self::default();

        let cache_store_type = match env::var("GENERIC_CACHE_STORE_TYPE") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.cache_store_type,
        };
        let data_store_type = match env::var("GENERIC_DATA_STORE_TYPE") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.data_store_type,
        };

        let config = Self {
            cache_store_type,
            cache_store_url: env::var("GENERIC_CACHE_STORE_URL").unwrap_or_default(),
            data_store_type,
            data_store_url: env::var("GENERIC_DATA_STORE_URL").unwrap_or_default(),
            table_prefix: env::var("DB_TABLE_PREFIX").unwrap_or(defaults.table_prefix),
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), StorageError> {
        if self.data_store_type == StoreBackend::Redis {
            return Err(StorageError::Config(
                "Redis cannot back the user/credential/client repositories".to_string(),
            ));
        }
        if self.cache_store_type != StoreBackend::Memory && self.cache_store_url.is_empty() {
            return Err(StorageError::Config(
                "GENERIC_CACHE_STORE_URL must be set".to_string(),
            ));
        }
        if self.data_store_type != StoreBackend::Memory && self.data_store_url.is_empty() {
            return Err(StorageError::Config(
                "GENERIC_DATA_STORE_URL must be set".to_string(),
            ));
        }
        if !self
            .table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StorageError::Config(format!(
                "Invalid table prefix: {}",
                self.table_prefix
            )));
        }
        Ok(())
    }
}
