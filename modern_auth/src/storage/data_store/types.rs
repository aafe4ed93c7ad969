use sqlx::{PgPool, SqlitePool};

use crate::storage::StoreBackend;

/// Handle to a relational pool. Callers dispatch on the backend they get back.
pub trait DataStore: Send + Sync + 'static {
    fn backend(&self) -> StoreBackend;

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_postgres(&self) -> Option<&PgPool> {
        None
    }
}

impl DataStore for SqlitePool {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(self)
    }
}

impl DataStore for PgPool {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    fn as_postgres(&self) -> Option<&PgPool> {
        Some(self)
    }
}
