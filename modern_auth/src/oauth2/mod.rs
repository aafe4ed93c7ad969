mod config;
mod errors;
mod main;
mod types;

pub use config::OAuth2Config;
pub use errors::{
    AuthorizationError, AuthorizationErrorType, AuthorizationResponse, OAuth2Error, TokenError,
    TokenErrorType,
};
pub use main::{AuthorizationService, RandomTokenHandler, TokenHandler, TokenService};
pub use types::{
    AuthorizationRequest, AuthorizeRequest, Client, CodeChallengeMethod, Grant, TokenRequest,
    TokenResponse,
};
