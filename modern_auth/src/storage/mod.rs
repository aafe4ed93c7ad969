mod cache_store;
mod config;
mod data_store;
mod errors;
mod operations;
mod types;

pub use cache_store::{
    InMemoryKeyValueStore, KeyValueStore, RedisKeyValueStore, SqlKeyValueStore, create_cache_store,
};
pub use config::{StorageConfig, StoreBackend};
pub use data_store::{DataStore, connect_data_store};
pub use errors::StorageError;
pub use types::CacheData;

pub(crate) use operations::{get_json, store_json, take_json};
pub(crate) use types::prefix;
