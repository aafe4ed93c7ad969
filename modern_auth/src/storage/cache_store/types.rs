use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::data_store::DataStore;
use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

pub struct InMemoryKeyValueStore {
    pub(super) entry: Mutex<HashMap<String, CacheData>>,
}

pub struct RedisKeyValueStore {
    pub(super) client: redis::Client,
}

pub struct SqlKeyValueStore {
    pub(super) store: Arc<dyn DataStore>,
    pub(super) table: String,
}

/// Shared store for ceremonies, authorization state and token digests.
///
/// Entries past their `expires_at` are reported as absent by every read.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    /// Get an entry without consuming it.
    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError>;

    /// Insert or replace an entry.
    async fn put(&self, prefix: &str, key: &str, value: CacheData) -> Result<(), StorageError>;

    /// Remove an entry. Removing a missing key is not an error.
    async fn remove(&self, prefix: &str, key: &str) -> Result<(), StorageError>;

    /// Atomically get an entry and delete it.
    ///
    /// At most one of any number of concurrent callers observes `Some` for a given key.
    async fn take(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError>;
}
