mod memory;
mod redis;
mod sql;
mod types;

use std::sync::Arc;

use crate::storage::config::{StorageConfig, StoreBackend};
use crate::storage::data_store::connect_data_store;
use crate::storage::errors::StorageError;

pub use types::{InMemoryKeyValueStore, KeyValueStore, RedisKeyValueStore, SqlKeyValueStore};

/// Build and initialize the key-value store selected by `config`.
pub async fn create_cache_store(
    config: &StorageConfig,
) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    let store_type = config.cache_store_type;
    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Arc<dyn KeyValueStore> = match store_type {
        StoreBackend::Memory => Arc::new(InMemoryKeyValueStore::new()),
        StoreBackend::Redis => Arc::new(RedisKeyValueStore::new(&config.cache_store_url)?),
        StoreBackend::Sqlite | StoreBackend::Postgres => {
            let data_store = connect_data_store(store_type, &config.cache_store_url)?;
            Arc::new(SqlKeyValueStore::new(data_store, &config.table_prefix))
        }
    };

    store.init().await.inspect_err(|e| {
        tracing::error!("Failed to initialize cache store: {}", e);
    })?;

    tracing::info!("Connected to cache store: type={}", store_type);
    Ok(store)
}
