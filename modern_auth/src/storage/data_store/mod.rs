mod types;

use std::{str::FromStr, sync::Arc};

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::config::StoreBackend;
use super::errors::StorageError;

pub use types::DataStore;

/// Open a lazily connected pool for `backend`.
///
/// In-memory SQLite databases live as long as their connection, so such URLs get a
/// single connection that is never recycled.
pub fn connect_data_store(
    backend: StoreBackend,
    url: &str,
) -> Result<Arc<dyn DataStore>, StorageError> {
    tracing::info!("Initializing data store with type: {}", backend);

    let store: Arc<dyn DataStore> = match backend {
        StoreBackend::Sqlite => {
            let opts = SqliteConnectOptions::from_str(url)
                .map_err(|e| StorageError::Config(format!("Invalid SQLite URL: {e}")))?
                .create_if_missing(true);

            let pool = if url.contains(":memory:") || url.contains("mode=memory") {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_lazy_with(opts)
            } else {
                SqlitePoolOptions::new().connect_lazy_with(opts)
            };
            Arc::new(pool)
        }
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .connect_lazy(url)
                .map_err(|e| StorageError::Config(format!("Invalid Postgres URL: {e}")))?;
            Arc::new(pool)
        }
        t => {
            return Err(StorageError::Config(format!(
                "Unsupported data store type: {t}. Supported types are 'sqlite' and 'postgres'"
            )));
        }
    };

    Ok(store)
}
