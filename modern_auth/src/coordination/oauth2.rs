use super::errors::CoordinationError;
use super::service::ModernAuth;
use crate::oauth2::{
    AuthorizationError, AuthorizationResponse, AuthorizeRequest, Grant, TokenError, TokenRequest,
    TokenResponse,
};

impl ModernAuth {
    /// Record an authorization request. The caller redirects to
    /// [`AuthorizationError::build_response_uri`] on failure.
    pub async fn authorize(&self, request: AuthorizeRequest) -> Result<String, AuthorizationError> {
        self.authorization.authorize(request).await
    }

    /// Resume a pending authorization with the verifier returned by a completed ceremony.
    pub async fn verify_authentication(
        &self,
        authorization_id: &str,
        verifier: &str,
    ) -> Result<AuthorizationResponse, AuthorizationError> {
        self.authorization
            .verify_authentication(authorization_id, verifier)
            .await
    }

    /// Token endpoint over a form-url-encoded request body.
    pub async fn token(&self, form: &str) -> Result<TokenResponse, TokenError> {
        let request = TokenRequest::from_form(form)?;
        tracing::debug!(
            "Token request: grant_type={}, client_id={}",
            request.grant_type(),
            request.client_id()
        );
        self.tokens.token(request).await
    }

    /// Resolve a bearer access token. Any failure is reported as `Unauthorized`.
    pub async fn validate_token(&self, access_token: &str) -> Result<Grant, CoordinationError> {
        self.tokens.validate(access_token).await.map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            CoordinationError::Unauthorized.log()
        })
    }

    /// [`ModernAuth::validate_token`] for an `Authorization` header value.
    pub async fn validate_authorization_header(
        &self,
        header: &str,
    ) -> Result<Grant, CoordinationError> {
        self.tokens.validate_bearer_header(header).await.map_err(|e| {
            tracing::debug!("Authorization header rejected: {}", e);
            CoordinationError::Unauthorized.log()
        })
    }
}
