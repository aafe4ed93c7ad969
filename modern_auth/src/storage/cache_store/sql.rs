use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Sqlite};
use std::sync::Arc;

use crate::storage::data_store::DataStore;
use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

use super::types::{KeyValueStore, SqlKeyValueStore};

type Row = (String, DateTime<Utc>);

impl SqlKeyValueStore {
    pub fn new(store: Arc<dyn DataStore>, table_prefix: &str) -> Self {
        Self {
            store,
            table: format!("{table_prefix}kv_store"),
        }
    }

    fn unsupported() -> StorageError {
        StorageError::Storage("Unsupported database type".to_string())
    }

    /// Deletes every row whose expiry has passed.
    pub(crate) async fn purge_expired(&self) -> Result<u64, StorageError> {
        let now = Utc::now();
        let removed = if let Some(pool) = self.store.as_sqlite() {
            sqlx::query(&format!("DELETE FROM {} WHERE expires_at <= ?", self.table))
                .bind(now)
                .execute(pool)
                .await?
                .rows_affected()
        } else if let Some(pool) = self.store.as_postgres() {
            sqlx::query(&format!("DELETE FROM {} WHERE expires_at <= $1", self.table))
                .bind(now)
                .execute(pool)
                .await?
                .rows_affected()
        } else {
            return Err(Self::unsupported());
        };

        if removed > 0 {
            tracing::debug!("Purged {} expired rows from {}", removed, self.table);
        }
        Ok(removed)
    }
}

fn into_cache_data(row: Option<Row>) -> Option<CacheData> {
    row.map(|(value, expires_at)| CacheData { value, expires_at })
        .filter(|data| !data.is_expired())
}

#[async_trait]
impl KeyValueStore for SqlKeyValueStore {
    async fn init(&self) -> Result<(), StorageError> {
        tracing::debug!("Creating cache table {} on {}", self.table, self.store.backend());
        if let Some(pool) = self.store.as_sqlite() {
            create_table_sqlite(pool, &self.table).await
        } else if let Some(pool) = self.store.as_postgres() {
            create_table_postgres(pool, &self.table).await
        } else {
            Err(Self::unsupported())
        }
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        let row: Option<Row> = if let Some(pool) = self.store.as_sqlite() {
            sqlx::query_as(&format!(
                "SELECT value, expires_at FROM {} WHERE prefix = ? AND cache_key = ?",
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .fetch_optional(pool)
            .await?
        } else if let Some(pool) = self.store.as_postgres() {
            sqlx::query_as(&format!(
                "SELECT value, expires_at FROM {} WHERE prefix = $1 AND cache_key = $2",
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .fetch_optional(pool)
            .await?
        } else {
            return Err(Self::unsupported());
        };

        Ok(into_cache_data(row))
    }

    async fn put(&self, prefix: &str, key: &str, value: CacheData) -> Result<(), StorageError> {
        self.purge_expired().await?;

        if let Some(pool) = self.store.as_sqlite() {
            sqlx::query(&format!(
                r#"
                INSERT OR REPLACE INTO {} (prefix, cache_key, value, expires_at)
                VALUES (?, ?, ?, ?)
                "#,
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .bind(&value.value)
            .bind(value.expires_at)
            .execute(pool)
            .await?;
        } else if let Some(pool) = self.store.as_postgres() {
            sqlx::query(&format!(
                r#"
                INSERT INTO {} (prefix, cache_key, value, expires_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (prefix, cache_key) DO UPDATE
                SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
                "#,
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .bind(&value.value)
            .bind(value.expires_at)
            .execute(pool)
            .await?;
        } else {
            return Err(Self::unsupported());
        }

        Ok(())
    }

    async fn remove(&self, prefix: &str, key: &str) -> Result<(), StorageError> {
        if let Some(pool) = self.store.as_sqlite() {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE prefix = ? AND cache_key = ?",
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .execute(pool)
            .await?;
        } else if let Some(pool) = self.store.as_postgres() {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE prefix = $1 AND cache_key = $2",
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .execute(pool)
            .await?;
        } else {
            return Err(Self::unsupported());
        }

        Ok(())
    }

    async fn take(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        // A single DELETE ... RETURNING statement keeps the read and the delete atomic
        let row: Option<Row> = if let Some(pool) = self.store.as_sqlite() {
            sqlx::query_as(&format!(
                "DELETE FROM {} WHERE prefix = ? AND cache_key = ? RETURNING value, expires_at",
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .fetch_optional(pool)
            .await?
        } else if let Some(pool) = self.store.as_postgres() {
            sqlx::query_as(&format!(
                "DELETE FROM {} WHERE prefix = $1 AND cache_key = $2 RETURNING value, expires_at",
                self.table
            ))
            .bind(prefix)
            .bind(key)
            .fetch_optional(pool)
            .await?
        } else {
            return Err(Self::unsupported());
        };

        Ok(into_cache_data(row))
    }
}

async fn create_table_sqlite(pool: &Pool<Sqlite>, table: &str) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            prefix TEXT NOT NULL,
            cache_key TEXT NOT NULL,
            value TEXT NOT NULL,
            expires_at TIMESTAMP NOT NULL,
            PRIMARY KEY (prefix, cache_key)
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_table_postgres(pool: &Pool<Postgres>, table: &str) -> Result<(), StorageError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            prefix TEXT NOT NULL,
            cache_key TEXT NOT NULL,
            value TEXT NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (prefix, cache_key)
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}
