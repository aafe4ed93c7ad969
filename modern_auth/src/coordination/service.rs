use std::sync::Arc;

use super::errors::CoordinationError;
use crate::config::AuthConfig;
use crate::oauth2::{AuthorizationService, TokenService};
use crate::passkey::CeremonyVerifier;
use crate::storage::{KeyValueStore, StoreBackend, connect_data_store, create_cache_store};
use crate::userdb::{
    ClientRepository, CredentialRepository, InMemoryRepository, SqlRepository, UserRepository,
};

/// Authentication server state: ceremony verifier, authorization flow, token engine and the
/// repositories they consult. Build one per process and share it.
pub struct ModernAuth {
    pub(super) ceremonies: CeremonyVerifier,
    pub(super) authorization: AuthorizationService,
    pub(super) tokens: TokenService,
    pub(super) users: Arc<dyn UserRepository>,
    pub(super) credentials: Arc<dyn CredentialRepository>,
    pub(super) clients: Arc<dyn ClientRepository>,
    pub(super) auth_client_id: String,
}

impl ModernAuth {
    /// Wire the services to an existing store and repositories.
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn KeyValueStore>,
        users: Arc<dyn UserRepository>,
        credentials: Arc<dyn CredentialRepository>,
        clients: Arc<dyn ClientRepository>,
    ) -> Self {
        Self {
            ceremonies: CeremonyVerifier::new(config.passkey, store.clone()),
            authorization: AuthorizationService::new(config.oauth2.clone(), store.clone(), clients.clone()),
            tokens: TokenService::new(config.oauth2, store),
            users,
            credentials,
            clients,
            auth_client_id: config.auth_client_id,
        }
    }

    /// Open the stores named in `config.storage` and build the service on them.
    pub async fn from_config(config: AuthConfig) -> Result<Self, CoordinationError> {
        config.storage.validate()?;
        let store = create_cache_store(&config.storage).await?;

        let (users, credentials, clients): (
            Arc<dyn UserRepository>,
            Arc<dyn CredentialRepository>,
            Arc<dyn ClientRepository>,
        ) = match config.storage.data_store_type {
            StoreBackend::Memory => {
                let repo = Arc::new(InMemoryRepository::new());
                (repo.clone(), repo.clone(), repo)
            }
            backend => {
                let data_store = connect_data_store(backend, &config.storage.data_store_url)?;
                let repo = SqlRepository::new(data_store, &config.storage.table_prefix);
                repo.create_tables().await?;
                let repo = Arc::new(repo);
                (repo.clone(), repo.clone(), repo)
            }
        };

        tracing::info!(
            "Authentication service ready: cache={}, data={}",
            config.storage.cache_store_type,
            config.storage.data_store_type
        );
        Ok(Self::new(config, store, users, credentials, clients))
    }

    /// [`ModernAuth::from_config`] with [`AuthConfig::from_env`].
    pub async fn from_env() -> Result<Self, CoordinationError> {
        Self::from_config(AuthConfig::from_env()?).await
    }

    pub fn ceremonies(&self) -> &CeremonyVerifier {
        &self.ceremonies
    }

    pub fn authorization(&self) -> &AuthorizationService {
        &self.authorization
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Client registry, for seeding and administration.
    pub fn clients(&self) -> &Arc<dyn ClientRepository> {
        &self.clients
    }
}
