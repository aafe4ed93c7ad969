use chrono::{Duration, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::token_handler::{
    ACCESS_TOKEN_SIZE, REFRESH_TOKEN_SIZE, RandomTokenHandler, TokenHandler, TokenLifetime,
};
use crate::oauth2::config::OAuth2Config;
use crate::oauth2::errors::{OAuth2Error, TokenError};
use crate::oauth2::types::{CodeChallengeMethod, Grant, IssuedCode, TokenRequest, TokenResponse};
use crate::storage::{KeyValueStore, prefix, take_json};
use crate::utils::{base64url_encode, sha256};

const TOKEN_TYPE: &str = "Bearer";

/// Token endpoint and access-token introspection.
pub struct TokenService {
    config: OAuth2Config,
    store: Arc<dyn KeyValueStore>,
    access: Arc<dyn TokenHandler>,
    refresh: Arc<dyn TokenHandler>,
}

impl TokenService {
    /// Random access and refresh token handlers backed by `store`.
    pub fn new(config: OAuth2Config, store: Arc<dyn KeyValueStore>) -> Self {
        let access = Arc::new(RandomTokenHandler::new(
            store.clone(),
            prefix::ACCESS_TOKEN,
            ACCESS_TOKEN_SIZE,
            TokenLifetime::Grant,
        ));
        let refresh = Arc::new(RandomTokenHandler::new(
            store.clone(),
            prefix::REFRESH_TOKEN,
            REFRESH_TOKEN_SIZE,
            TokenLifetime::Fixed(Duration::seconds(config.refresh_token_ttl)),
        ));
        Self::with_handlers(config, store, access, refresh)
    }

    pub fn with_handlers(
        config: OAuth2Config,
        store: Arc<dyn KeyValueStore>,
        access: Arc<dyn TokenHandler>,
        refresh: Arc<dyn TokenHandler>,
    ) -> Self {
        Self {
            config,
            store,
            access,
            refresh,
        }
    }

    /// Fresh grant valid from now for the configured access token lifetime.
    pub(crate) fn new_grant(
        &self,
        id: String,
        client_id: &str,
        subject_id: &str,
        scope: &str,
        allow_refresh: bool,
    ) -> Grant {
        let now = Utc::now();
        Grant {
            id,
            client_id: client_id.to_string(),
            subject_id: subject_id.to_string(),
            scope: scope.to_string(),
            issued_at: now,
            expires_at: now + Duration::seconds(self.config.access_token_ttl),
            not_before: now,
            allow_refresh,
        }
    }

    /// Handle a token endpoint request.
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, TokenError> {
        let grant = match request {
            TokenRequest::AuthorizationCode {
                client_id,
                code,
                redirect_uri,
                code_verifier,
            } => {
                self.grant_from_code(&client_id, &code, &redirect_uri, code_verifier.as_deref())
                    .await?
            }
            TokenRequest::RefreshToken {
                client_id,
                refresh_token,
            } => self.grant_from_refresh(&client_id, &refresh_token).await?,
        };

        self.issue(&grant).await.map_err(|e| {
            tracing::error!("Failed to issue tokens for grant {}: {}", grant.id, e);
            TokenError::server_error()
        })
    }

    async fn grant_from_code(
        &self,
        client_id: &str,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> Result<Grant, TokenError> {
        // The code is spent whether or not the checks below pass
        let issued: IssuedCode = take_json(self.store.as_ref(), prefix::CODE, code)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load authorization code: {}", e);
                TokenError::server_error()
            })?
            .ok_or_else(|| {
                tracing::warn!("Unknown or expired authorization code");
                TokenError::invalid_grant("authorization code not found")
            })?;
        let request = issued.request;

        if request.client_id != client_id {
            tracing::warn!("Code for {} redeemed by {}", request.client_id, client_id);
            return Err(TokenError::invalid_grant("client id does not match"));
        }
        if request.redirect_uri != redirect_uri {
            tracing::warn!("Redirect uri mismatch for authorization {}", request.id);
            return Err(TokenError::invalid_grant("redirect uri does not match"));
        }
        if let Some(challenge) = &request.code_challenge {
            let method = request.code_method.unwrap_or(CodeChallengeMethod::S256);
            let valid = code_verifier
                .is_some_and(|verifier| verify_code_challenge(challenge, method, verifier));
            if !valid {
                tracing::warn!("PKCE check failed for authorization {}", request.id);
                return Err(TokenError::invalid_grant("code verifier invalid"));
            }
        }

        Ok(self.new_grant(
            uuid::Uuid::new_v4().to_string(),
            &request.client_id,
            &issued.subject_id,
            &request.scope,
            true,
        ))
    }

    async fn grant_from_refresh(
        &self,
        client_id: &str,
        refresh_token: &str,
    ) -> Result<Grant, TokenError> {
        let previous = self
            .refresh
            .validate(refresh_token)
            .await
            .map_err(refresh_error)?;

        if previous.client_id != client_id {
            tracing::warn!("Refresh token for {} presented by {}", previous.client_id, client_id);
            return Err(TokenError::invalid_grant("client id does not match"));
        }

        // Another request may have consumed it since validation
        let previous = self
            .refresh
            .consume(refresh_token)
            .await
            .map_err(refresh_error)?;

        Ok(self.new_grant(
            previous.id,
            &previous.client_id,
            &previous.subject_id,
            &previous.scope,
            false,
        ))
    }

    /// Mint tokens for `grant`. A refresh token is only attempted when the grant allows it,
    /// and failing to mint one leaves it out of the response.
    pub async fn issue(&self, grant: &Grant) -> Result<TokenResponse, OAuth2Error> {
        let access_token = self.access.generate_token(grant).await?;

        let refresh_token = if grant.allow_refresh {
            match self.refresh.generate_token(grant).await {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::warn!("Refresh token not issued for grant {}: {}", grant.id, e);
                    None
                }
            }
        } else {
            None
        };

        tracing::info!("Issued tokens for grant {} ({})", grant.id, grant.client_id);

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: (grant.expires_at - Utc::now()).num_seconds().max(0),
            scope: grant.scope.clone(),
            refresh_token,
        })
    }

    /// Resolve an access token to its grant, rejecting it outside the grant's validity window.
    pub async fn validate(&self, access_token: &str) -> Result<Grant, OAuth2Error> {
        let grant = self.access.validate(access_token).await?;
        let now = Utc::now();
        if now < grant.not_before {
            return Err(OAuth2Error::TokenNotYetValid);
        }
        if now >= grant.expires_at {
            return Err(OAuth2Error::TokenExpired);
        }
        Ok(grant)
    }

    /// Validate the token in an `Authorization: Bearer <token>` header value.
    pub async fn validate_bearer_header(&self, header: &str) -> Result<Grant, OAuth2Error> {
        let token = parse_bearer(header)?;
        self.validate(token).await
    }
}

fn refresh_error(err: OAuth2Error) -> TokenError {
    match err {
        OAuth2Error::TokenNotFound => TokenError::invalid_grant("refresh token not found"),
        other => {
            tracing::error!("Failed to load refresh token: {}", other);
            TokenError::server_error()
        }
    }
}

fn verify_code_challenge(challenge: &str, method: CodeChallengeMethod, verifier: &str) -> bool {
    let expected = match method {
        CodeChallengeMethod::S256 => base64url_encode(sha256(verifier.as_bytes())),
        CodeChallengeMethod::Plain => verifier.to_string(),
    };
    bool::from(expected.as_bytes().ct_eq(challenge.as_bytes()))
}

fn parse_bearer(header: &str) -> Result<&str, OAuth2Error> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| OAuth2Error::InvalidHeader("expected `Bearer <token>`".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(OAuth2Error::InvalidHeader(format!(
            "unsupported scheme: {scheme}"
        )));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(OAuth2Error::InvalidHeader("empty token".to_string()));
    }
    Ok(token)
}
