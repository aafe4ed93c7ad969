use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::errors::RepositoryError;
use super::repository::{ClientRepository, CredentialRepository, UserRepository};
use super::types::{Credential, User};
use crate::oauth2::Client;

/// Repositories kept in process memory, mainly for tests and single-node setups.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<String, User>>,
    credentials: RwLock<HashMap<String, Credential>>,
    clients: RwLock<HashMap<String, Client>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn find_by_user_handle(&self, user_handle: &[u8]) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.user_handle == user_handle)
            .cloned())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn save_user(&self, user: User) -> Result<String, RepositoryError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.user_handle == user.user_handle && u.id != user.id)
        {
            return Err(RepositoryError::Duplicate("user handle".to_string()));
        }
        let id = user.id.clone();
        users.insert(id.clone(), user);
        Ok(id)
    }
}

#[async_trait]
impl CredentialRepository for InMemoryRepository {
    async fn find_by_credential_id(
        &self,
        credential_id: &[u8],
    ) -> Result<Option<Credential>, RepositoryError> {
        let credentials = self.credentials.read().await;
        Ok(credentials
            .values()
            .find(|c| c.credential_id == credential_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Credential>, RepositoryError> {
        Ok(self.credentials.read().await.get(id).cloned())
    }

    async fn find_all_by_user_id(&self, user_id: &str) -> Result<Vec<Credential>, RepositoryError> {
        let credentials = self.credentials.read().await;
        let mut owned: Vec<Credential> = credentials
            .values()
            .filter(|c| c.owner_user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|c| c.created_at);
        Ok(owned)
    }

    async fn save_credential(&self, credential: Credential) -> Result<(), RepositoryError> {
        let mut credentials = self.credentials.write().await;
        if credentials
            .values()
            .any(|c| c.credential_id == credential.credential_id && c.id != credential.id)
        {
            return Err(RepositoryError::Duplicate("credential id".to_string()));
        }
        credentials.insert(credential.id.clone(), credential);
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for InMemoryRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Client>, RepositoryError> {
        Ok(self.clients.read().await.get(id).cloned())
    }

    async fn save_client(&self, client: Client) -> Result<(), RepositoryError> {
        self.clients.write().await.insert(client.id.clone(), client);
        Ok(())
    }
}
