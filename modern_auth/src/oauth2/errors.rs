use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::form_urlencoded;

use crate::storage::StorageError;
use crate::utils::UtilError;

/// Error codes returned to the client on the authorization redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationErrorType {
    InvalidClient,
    InvalidRequest,
    InvalidScope,
    ServerError,
    BadRequest,
    Unauthenticated,
}

impl AuthorizationErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidClient => "invalid_client",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::BadRequest => "bad_request",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for AuthorizationErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append query parameters to `redirect_uri`, keeping any query it already has.
fn append_query(redirect_uri: &str, params: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    let separator = if redirect_uri.contains('?') { '&' } else { '?' };
    format!("{redirect_uri}{separator}{query}")
}

/// Failure on the authorization endpoint. The transport redirects to
/// [`AuthorizationError::build_response_uri`] instead of rendering it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Authorization error ({error_type}): {description}")]
pub struct AuthorizationError {
    pub redirect_uri: String,
    pub state: String,
    pub issuer: String,
    pub error_type: AuthorizationErrorType,
    pub description: String,
}

impl AuthorizationError {
    pub fn build_response_uri(&self) -> String {
        append_query(
            &self.redirect_uri,
            &[
                ("error", self.error_type.as_str()),
                ("error_description", &self.description),
                ("state", &self.state),
                ("iss", &self.issuer),
            ],
        )
    }
}

/// Successful outcome of an authorization request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationResponse {
    pub redirect_uri: String,
    pub code: String,
    pub state: String,
    pub issuer: String,
}

impl AuthorizationResponse {
    pub fn build_response_uri(&self) -> String {
        append_query(
            &self.redirect_uri,
            &[
                ("code", &self.code),
                ("state", &self.state),
                ("iss", &self.issuer),
            ],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorType {
    InvalidRequest,
    InvalidClient,
    InvalidGrant,
    UnsupportedGrantType,
    ServerError,
}

impl fmt::Display for TokenErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::ServerError => "server_error",
        };
        f.write_str(s)
    }
}

/// JSON body returned by the token endpoint on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("Token error ({error}): {error_description}")]
pub struct TokenError {
    pub error: TokenErrorType,
    pub error_description: String,
}

impl TokenError {
    pub(crate) fn new(error: TokenErrorType, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: description.into(),
        }
    }

    pub(crate) fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new(TokenErrorType::InvalidGrant, description)
    }

    pub(crate) fn server_error() -> Self {
        Self::new(TokenErrorType::ServerError, "internal server error")
    }
}

/// Errors from token handling and introspection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OAuth2Error {
    #[error("Authorization not found")]
    AuthorizationNotFound,

    #[error("Token not found")]
    TokenNotFound,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Invalid authorization header: {0}")]
    InvalidHeader(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Client lookup failed: {0}")]
    Client(String),
}

impl From<StorageError> for OAuth2Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<UtilError> for OAuth2Error {
    fn from(err: UtilError) -> Self {
        Self::Crypto(err.to_string())
    }
}
