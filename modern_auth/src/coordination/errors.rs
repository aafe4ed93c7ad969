use thiserror::Error;

use crate::config::ConfigError;
use crate::oauth2::OAuth2Error;
use crate::passkey::PasskeyError;
use crate::storage::StorageError;
use crate::userdb::RepositoryError;
use crate::utils::UtilError;

/// Errors from the flows that tie ceremonies, users and grants together.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {resource_type} {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// The user or credential exists but was revoked
    #[error("Inactive {0}")]
    Inactive(String),

    #[error("User handle does not match the credential owner")]
    UserHandleMismatch,

    #[error("Passkey error: {0}")]
    PasskeyError(PasskeyError),

    #[error("OAuth2 error: {0}")]
    OAuth2Error(OAuth2Error),

    #[error("Repository error: {0}")]
    RepositoryError(RepositoryError),

    #[error("Storage error: {0}")]
    StorageError(StorageError),

    #[error("Config error: {0}")]
    ConfigError(ConfigError),
}

impl CoordinationError {
    /// Log the error and return self
    pub fn log(self) -> Self {
        match &self {
            Self::InvalidInput(msg) => tracing::error!("Invalid input: {}", msg),
            Self::Unauthorized => tracing::error!("Unauthorized access"),
            Self::Conflict(msg) => tracing::error!("Conflict: {}", msg),
            Self::ResourceNotFound {
                resource_type,
                resource_id,
            } => tracing::error!("Resource not found: {} {}", resource_type, resource_id),
            Self::Inactive(what) => tracing::error!("Inactive {}", what),
            Self::UserHandleMismatch => tracing::error!("User handle mismatch"),
            Self::PasskeyError(err) => tracing::error!("Passkey error: {}", err),
            Self::OAuth2Error(err) => tracing::error!("OAuth2 error: {}", err),
            Self::RepositoryError(err) => tracing::error!("Repository error: {}", err),
            Self::StorageError(err) => tracing::error!("Storage error: {}", err),
            Self::ConfigError(err) => tracing::error!("Config error: {}", err),
        }
        self
    }
}

impl From<PasskeyError> for CoordinationError {
    fn from(err: PasskeyError) -> Self {
        Self::PasskeyError(err).log()
    }
}

impl From<OAuth2Error> for CoordinationError {
    fn from(err: OAuth2Error) -> Self {
        Self::OAuth2Error(err).log()
    }
}

impl From<RepositoryError> for CoordinationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err).log()
    }
}

impl From<StorageError> for CoordinationError {
    fn from(err: StorageError) -> Self {
        Self::StorageError(err).log()
    }
}

impl From<ConfigError> for CoordinationError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err).log()
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        Self::PasskeyError(PasskeyError::from(err)).log()
    }
}
