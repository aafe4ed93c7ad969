use async_trait::async_trait;
use redis::{self, AsyncCommands};

use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

use super::types::{KeyValueStore, RedisKeyValueStore};

const CACHE_PREFIX: &str = "cache";

impl RedisKeyValueStore {
    pub fn new(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client })
    }

    fn make_key(prefix: &str, key: &str) -> String {
        format!("{CACHE_PREFIX}:{prefix}:{key}")
    }

    fn decode(value: Option<String>) -> Result<Option<CacheData>, StorageError> {
        match value {
            Some(v) => {
                let data: CacheData = serde_json::from_str(&v)?;
                Ok((!data.is_expired()).then_some(data))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn init(&self) -> Result<(), StorageError> {
        // Verify the connection works
        let _conn = self.client.get_multiplexed_async_connection().await?;
        Ok(())
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = Self::make_key(prefix, key);
        let value: Option<String> = conn.get(&key).await?;
        Self::decode(value)
    }

    async fn put(&self, prefix: &str, key: &str, value: CacheData) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = Self::make_key(prefix, key);
        let ttl = value.ttl_secs();
        let value = serde_json::to_string(&value)?;
        let _: () = conn.set_ex(&key, value, ttl).await?;
        Ok(())
    }

    async fn remove(&self, prefix: &str, key: &str) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = Self::make_key(prefix, key);
        let _: () = conn.del(&key).await?;
        Ok(())
    }

    async fn take(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = Self::make_key(prefix, key);
        // GETDEL is atomic on the server
        let value: Option<String> = conn.get_del(&key).await?;
        Self::decode(value)
    }
}
