mod postgres;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::errors::RepositoryError;
use super::repository::{ClientRepository, CredentialRepository, UserRepository};
use super::types::{Credential, User};
use crate::oauth2::Client;
use crate::storage::DataStore;
use crate::utils::{base64url_decode, base64url_encode};

use postgres::*;
use sqlite::*;

type UserRow = (String, String, String, DateTime<Utc>);
type CredentialRow = (String, String, String, String, String, DateTime<Utc>);
type ClientRow = (String, String, String);

const CREDENTIAL_COLUMNS: &str =
    "id, credential_id, public_key_cose, owner_user_id, status, created_at";

struct Tables {
    users: String,
    credentials: String,
    clients: String,
}

/// User, credential and client repositories on a SQLite or Postgres pool.
///
/// Binary fields are stored as base64url text, client scope and redirect lists as JSON.
pub struct SqlRepository {
    store: Arc<dyn DataStore>,
    tables: Tables,
}

fn write_error(err: sqlx::Error, what: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate(what.to_string())
        }
        _ => RepositoryError::from(err),
    }
}

fn decode_bytes(value: &str) -> Result<Vec<u8>, RepositoryError> {
    base64url_decode(value).map_err(|e| RepositoryError::InvalidData(e.to_string()))
}

fn user_from_row((id, user_handle, status, created_at): UserRow) -> Result<User, RepositoryError> {
    Ok(User {
        id,
        user_handle: decode_bytes(&user_handle)?,
        status: status.parse()?,
        created_at,
    })
}

fn user_to_row(user: User) -> UserRow {
    (
        user.id,
        base64url_encode(&user.user_handle),
        user.status.to_string(),
        user.created_at,
    )
}

fn credential_from_row(row: CredentialRow) -> Result<Credential, RepositoryError> {
    let (id, credential_id, public_key_cose, owner_user_id, status, created_at) = row;
    Ok(Credential {
        id,
        credential_id: decode_bytes(&credential_id)?,
        public_key_cose: decode_bytes(&public_key_cose)?,
        owner_user_id,
        status: status.parse()?,
        created_at,
    })
}

fn credential_to_row(credential: Credential) -> CredentialRow {
    (
        credential.id,
        base64url_encode(&credential.credential_id),
        base64url_encode(&credential.public_key_cose),
        credential.owner_user_id,
        credential.status.to_string(),
        credential.created_at,
    )
}

fn client_from_row((id, scopes, redirect_uris): ClientRow) -> Result<Client, RepositoryError> {
    Ok(Client {
        id,
        scopes: serde_json::from_str(&scopes)?,
        redirect_uris: serde_json::from_str(&redirect_uris)?,
    })
}

impl SqlRepository {
    pub fn new(store: Arc<dyn DataStore>, table_prefix: &str) -> Self {
        Self {
            store,
            tables: Tables {
                users: format!("{table_prefix}users"),
                credentials: format!("{table_prefix}credentials"),
                clients: format!("{table_prefix}clients"),
            },
        }
    }

    fn unsupported() -> RepositoryError {
        RepositoryError::Storage("Unsupported database type".to_string())
    }

    pub async fn create_tables(&self) -> Result<(), RepositoryError> {
        tracing::info!(
            "Creating user tables {} on {}",
            self.tables.users,
            self.store.backend()
        );
        if let Some(pool) = self.store.as_sqlite() {
            create_tables_sqlite(pool, &self.tables).await
        } else if let Some(pool) = self.store.as_postgres() {
            create_tables_postgres(pool, &self.tables).await
        } else {
            Err(Self::unsupported())
        }
    }

    async fn credential_by(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<Credential>, RepositoryError> {
        let row = if let Some(pool) = self.store.as_sqlite() {
            get_credential_by_field_sqlite(pool, &self.tables, field, value).await?
        } else if let Some(pool) = self.store.as_postgres() {
            get_credential_by_field_postgres(pool, &self.tables, field, value).await?
        } else {
            return Err(Self::unsupported());
        };
        row.map(credential_from_row).transpose()
    }
}

#[async_trait]
impl UserRepository for SqlRepository {
    async fn find_by_user_handle(&self, user_handle: &[u8]) -> Result<Option<User>, RepositoryError> {
        let handle = base64url_encode(user_handle);
        let row = if let Some(pool) = self.store.as_sqlite() {
            get_user_by_handle_sqlite(pool, &self.tables, &handle).await?
        } else if let Some(pool) = self.store.as_postgres() {
            get_user_by_handle_postgres(pool, &self.tables, &handle).await?
        } else {
            return Err(Self::unsupported());
        };
        row.map(user_from_row).transpose()
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let row = if let Some(pool) = self.store.as_sqlite() {
            get_user_sqlite(pool, &self.tables, id).await?
        } else if let Some(pool) = self.store.as_postgres() {
            get_user_postgres(pool, &self.tables, id).await?
        } else {
            return Err(Self::unsupported());
        };
        row.map(user_from_row).transpose()
    }

    async fn save_user(&self, user: User) -> Result<String, RepositoryError> {
        let id = user.id.clone();
        let row = user_to_row(user);
        if let Some(pool) = self.store.as_sqlite() {
            upsert_user_sqlite(pool, &self.tables, row).await?;
        } else if let Some(pool) = self.store.as_postgres() {
            upsert_user_postgres(pool, &self.tables, row).await?;
        } else {
            return Err(Self::unsupported());
        }
        Ok(id)
    }
}

#[async_trait]
impl CredentialRepository for SqlRepository {
    async fn find_by_credential_id(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<Credential>, RepositoryError> {
        self.credential_by("credential_id", &base64url_encode(credential_id))
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Credential>, RepositoryError> {
        self.credential_by("id", id).await
    }

    async fn find_all_by_user_id(&self, user_id: &str) -> Result<Vec<Credential>, RepositoryError> {
        let rows = if let Some(pool) = self.store.as_sqlite() {
            get_credentials_by_owner_sqlite(pool, &self.tables, user_id).await?
        } else if let Some(pool) = self.store.as_postgres() {
            get_credentials_by_owner_postgres(pool, &self.tables, user_id).await?
        } else {
            return Err(Self::unsupported());
        };
        rows.into_iter().map(credential_from_row).collect()
    }

    async fn save_credential(&self, credential: Credential) -> Result<(), RepositoryError> {
        let row = credential_to_row(credential);
        if let Some(pool) = self.store.as_sqlite() {
            upsert_credential_sqlite(pool, &self.tables, row).await
        } else if let Some(pool) = self.store.as_postgres() {
            upsert_credential_postgres(pool, &self.tables, row).await
        } else {
            Err(Self::unsupported())
        }
    }
}

#[async_trait]
impl ClientRepository for SqlRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Client>, RepositoryError> {
        let row = if let Some(pool) = self.store.as_sqlite() {
            get_client_sqlite(pool, &self.tables, id).await?
        } else if let Some(pool) = self.store.as_postgres() {
            get_client_postgres(pool, &self.tables, id).await?
        } else {
            return Err(Self::unsupported());
        };
        row.map(client_from_row).transpose()
    }

    async fn save_client(&self, client: Client) -> Result<(), RepositoryError> {
        let row = (
            client.id,
            serde_json::to_string(&client.scopes)?,
            serde_json::to_string(&client.redirect_uris)?,
        );
        if let Some(pool) = self.store.as_sqlite() {
            upsert_client_sqlite(pool, &self.tables, row).await
        } else if let Some(pool) = self.store.as_postgres() {
            upsert_client_postgres(pool, &self.tables, row).await
        } else {
            Err(Self::unsupported())
        }
    }
}
