use sqlx::{Pool, Postgres};

use super::{CREDENTIAL_COLUMNS, ClientRow, CredentialRow, Tables, UserRow, write_error};
use crate::userdb::errors::RepositoryError;

pub(super) async fn create_tables_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
) -> Result<(), RepositoryError> {
    let Tables {
        users,
        credentials,
        clients,
    } = tables;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {users} (
            id TEXT PRIMARY KEY,
            user_handle TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {credentials} (
            id TEXT PRIMARY KEY,
            credential_id TEXT NOT NULL UNIQUE,
            public_key_cose TEXT NOT NULL,
            owner_user_id TEXT NOT NULL REFERENCES {users}(id),
            status TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{credentials}_owner ON {credentials}(owner_user_id)"
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {clients} (
            id TEXT PRIMARY KEY,
            scopes TEXT NOT NULL,
            redirect_uris TEXT NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn get_user_by_handle_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    user_handle: &str,
) -> Result<Option<UserRow>, RepositoryError> {
    Ok(sqlx::query_as(&format!(
        "SELECT id, user_handle, status, created_at FROM {} WHERE user_handle = $1",
        tables.users
    ))
    .bind(user_handle)
    .fetch_optional(pool)
    .await?)
}

pub(super) async fn get_user_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    id: &str,
) -> Result<Option<UserRow>, RepositoryError> {
    Ok(sqlx::query_as(&format!(
        "SELECT id, user_handle, status, created_at FROM {} WHERE id = $1",
        tables.users
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

pub(super) async fn upsert_user_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    row: UserRow,
) -> Result<(), RepositoryError> {
    let (id, user_handle, status, created_at) = row;
    sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, user_handle, status, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE SET status = excluded.status
        "#,
        tables.users
    ))
    .bind(id)
    .bind(user_handle)
    .bind(status)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| write_error(e, "user handle"))?;
    Ok(())
}

pub(super) async fn get_credential_by_field_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    field: &str,
    value: &str,
) -> Result<Option<CredentialRow>, RepositoryError> {
    Ok(sqlx::query_as(&format!(
        "SELECT {CREDENTIAL_COLUMNS} FROM {} WHERE {field} = $1",
        tables.credentials
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?)
}

pub(super) async fn get_credentials_by_owner_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    owner_user_id: &str,
) -> Result<Vec<CredentialRow>, RepositoryError> {
    Ok(sqlx::query_as(&format!(
        "SELECT {CREDENTIAL_COLUMNS} FROM {} WHERE owner_user_id = $1 ORDER BY created_at",
        tables.credentials
    ))
    .bind(owner_user_id)
    .fetch_all(pool)
    .await?)
}

pub(super) async fn upsert_credential_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    row: CredentialRow,
) -> Result<(), RepositoryError> {
    let (id, credential_id, public_key_cose, owner_user_id, status, created_at) = row;
    sqlx::query(&format!(
        r#"
        INSERT INTO {} ({CREDENTIAL_COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET status = excluded.status
        "#,
        tables.credentials
    ))
    .bind(id)
    .bind(credential_id)
    .bind(public_key_cose)
    .bind(owner_user_id)
    .bind(status)
    .bind(created_at)
    .execute(pool)
    .await
    .map_err(|e| write_error(e, "credential id"))?;
    Ok(())
}

pub(super) async fn get_client_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    id: &str,
) -> Result<Option<ClientRow>, RepositoryError> {
    Ok(sqlx::query_as(&format!(
        "SELECT id, scopes, redirect_uris FROM {} WHERE id = $1",
        tables.clients
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

pub(super) async fn upsert_client_postgres(
    pool: &Pool<Postgres>,
    tables: &Tables,
    row: ClientRow,
) -> Result<(), RepositoryError> {
    let (id, scopes, redirect_uris) = row;
    sqlx::query(&format!(
        r#"
        INSERT INTO {} (id, scopes, redirect_uris)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET
            scopes = excluded.scopes,
            redirect_uris = excluded.redirect_uris
        "#,
        tables.clients
    ))
    .bind(id)
    .bind(scopes)
    .bind(redirect_uris)
    .execute(pool)
    .await?;
    Ok(())
}
