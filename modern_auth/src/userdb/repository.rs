use async_trait::async_trait;

use super::errors::RepositoryError;
use super::types::{Credential, User};
use crate::oauth2::Client;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_user_handle(&self, user_handle: &[u8]) -> Result<Option<User>, RepositoryError>;

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Insert or replace `user`, returning its id.
    async fn save_user(&self, user: User) -> Result<String, RepositoryError>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_by_credential_id(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<Credential>, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Credential>, RepositoryError>;

    async fn find_all_by_user_id(&self, user_id: &str) -> Result<Vec<Credential>, RepositoryError>;

    /// Insert or replace `credential`. A credential id owned by another record is a duplicate.
    async fn save_credential(&self, credential: Credential) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Client>, RepositoryError>;

    async fn save_client(&self, client: Client) -> Result<(), RepositoryError>;
}
