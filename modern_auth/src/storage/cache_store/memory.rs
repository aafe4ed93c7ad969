use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

use super::types::{InMemoryKeyValueStore, KeyValueStore};

const CACHE_PREFIX: &str = "cache";

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory key-value store");
        Self {
            entry: Mutex::new(HashMap::new()),
        }
    }

    fn make_key(prefix: &str, key: &str) -> String {
        format!("{CACHE_PREFIX}:{prefix}:{key}")
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let key = Self::make_key(prefix, key);
        let mut entry = self.entry.lock().await;
        match entry.get(&key) {
            Some(data) if data.is_expired() => {
                entry.remove(&key);
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn put(&self, prefix: &str, key: &str, value: CacheData) -> Result<(), StorageError> {
        let key = Self::make_key(prefix, key);
        let mut entry = self.entry.lock().await;
        entry.retain(|_, v| !v.is_expired());
        entry.insert(key, value);
        Ok(())
    }

    async fn remove(&self, prefix: &str, key: &str) -> Result<(), StorageError> {
        let key = Self::make_key(prefix, key);
        self.entry.lock().await.remove(&key);
        Ok(())
    }

    async fn take(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let key = Self::make_key(prefix, key);
        let removed = self.entry.lock().await.remove(&key);
        Ok(removed.filter(|data| !data.is_expired()))
    }
}
