use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use super::cache_store::KeyValueStore;
use super::errors::StorageError;
use super::types::CacheData;

/// Serialize `value` as JSON and store it until `expires_at`.
pub(crate) async fn store_json<T: Serialize>(
    store: &dyn KeyValueStore,
    prefix: &str,
    key: &str,
    value: &T,
    expires_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    let data = CacheData {
        value: serde_json::to_string(value)?,
        expires_at,
    };
    store.put(prefix, key, data).await
}

/// Read a JSON entry without consuming it.
pub(crate) async fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    prefix: &str,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(prefix, key).await? {
        Some(data) => Ok(Some(serde_json::from_str(&data.value)?)),
        None => Ok(None),
    }
}

/// Consume a JSON entry.
pub(crate) async fn take_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    prefix: &str,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.take(prefix, key).await? {
        Some(data) => Ok(Some(serde_json::from_str(&data.value)?)),
        None => Ok(None),
    }
}
