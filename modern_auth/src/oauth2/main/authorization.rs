use chrono::{Duration, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::oauth2::config::OAuth2Config;
use crate::oauth2::errors::{
    AuthorizationError, AuthorizationErrorType, AuthorizationResponse, OAuth2Error,
};
use crate::oauth2::types::{
    AuthenticationVerifier, AuthorizationRequest, AuthorizeRequest, CodeChallengeMethod,
    IssuedCode,
};
use crate::storage::{KeyValueStore, get_json, prefix, store_json, take_json};
use crate::userdb::ClientRepository;
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes, gen_random_string, shake256};

const VERIFIER_LEN: usize = 64;
const CODE_LEN: usize = 32;

/// OAuth2 authorization-code flow: pending requests, the continuation handshake and code issuance.
pub struct AuthorizationService {
    config: OAuth2Config,
    store: Arc<dyn KeyValueStore>,
    clients: Arc<dyn ClientRepository>,
}

impl AuthorizationService {
    pub fn new(
        config: OAuth2Config,
        store: Arc<dyn KeyValueStore>,
        clients: Arc<dyn ClientRepository>,
    ) -> Self {
        Self {
            config,
            store,
            clients,
        }
    }

    fn error(
        &self,
        redirect_uri: &str,
        state: &str,
        error_type: AuthorizationErrorType,
        description: &str,
    ) -> AuthorizationError {
        tracing::warn!("Authorization failed: {} ({})", error_type, description);
        AuthorizationError {
            redirect_uri: redirect_uri.to_string(),
            state: state.to_string(),
            issuer: self.config.issuer.clone(),
            error_type,
            description: description.to_string(),
        }
    }

    /// Record a new authorization request and return its id.
    pub async fn authorize(&self, request: AuthorizeRequest) -> Result<String, AuthorizationError> {
        let redirect_hint = request.redirect_uri.clone().unwrap_or_default();

        let client = self
            .clients
            .find_by_id(&request.client_id)
            .await
            .map_err(|e| {
                tracing::error!("Client lookup failed: {}", e);
                self.error(
                    &redirect_hint,
                    &request.state,
                    AuthorizationErrorType::ServerError,
                    "client lookup failed",
                )
            })?
            .ok_or_else(|| {
                self.error(
                    &redirect_hint,
                    &request.state,
                    AuthorizationErrorType::InvalidClient,
                    "client not found",
                )
            })?;

        let redirect_uri = match request.redirect_uri.as_deref() {
            None | Some("") => client.default_redirect_uri().map(str::to_string).ok_or_else(|| {
                self.error(
                    "",
                    &request.state,
                    AuthorizationErrorType::InvalidRequest,
                    "client has no redirect uri",
                )
            })?,
            Some(uri) if client.validate_redirect_uri(uri) => uri.to_string(),
            // An unregistered redirect must never receive the error
            Some(_) => {
                return Err(self.error(
                    "",
                    &request.state,
                    AuthorizationErrorType::InvalidRequest,
                    "redirect uri not allowed",
                ));
            }
        };

        let code_challenge = request.code_challenge.filter(|c| !c.is_empty());
        let code_method = match &code_challenge {
            Some(_) => Some(
                CodeChallengeMethod::parse(request.code_challenge_method.as_deref()).ok_or_else(
                    || {
                        self.error(
                            &redirect_uri,
                            &request.state,
                            AuthorizationErrorType::InvalidRequest,
                            "code challenge method not supported",
                        )
                    },
                )?,
            ),
            None => None,
        };

        let scope = client.restrict_scopes(&request.scope);
        if scope.is_empty() && !request.scope.trim().is_empty() {
            return Err(self.error(
                &redirect_uri,
                &request.state,
                AuthorizationErrorType::InvalidScope,
                "no requested scope is allowed for this client",
            ));
        }

        let authorization = AuthorizationRequest {
            id: uuid::Uuid::new_v4().to_string(),
            client_id: client.id.clone(),
            scope,
            redirect_uri,
            state: request.state,
            code_challenge,
            code_method,
            created_at: Utc::now(),
        };

        let expires_at = authorization.created_at + Duration::seconds(self.config.authorization_timeout);
        store_json(
            self.store.as_ref(),
            prefix::AUTHORIZATION,
            &authorization.id,
            &authorization,
            expires_at,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to store authorization request: {}", e);
            self.error(
                &authorization.redirect_uri,
                &authorization.state,
                AuthorizationErrorType::ServerError,
                "failed to store authorization request",
            )
        })?;

        tracing::info!(
            "Authorization {} started for client {}",
            authorization.id,
            authorization.client_id
        );
        Ok(authorization.id)
    }

    /// Mint the continuation verifier for a pending authorization after `subject_id` authenticated.
    ///
    /// Stores `SHAKE256(SHAKE256(v))` and returns `base64url(SHAKE256(v))`.
    pub async fn issue_authentication_verifier(
        &self,
        authorization_id: &str,
        subject_id: &str,
    ) -> Result<String, OAuth2Error> {
        let pending: Option<AuthorizationRequest> =
            get_json(self.store.as_ref(), prefix::AUTHORIZATION, authorization_id).await?;
        if pending.is_none() {
            tracing::error!("Authorization {} not found", authorization_id);
            return Err(OAuth2Error::AuthorizationNotFound);
        }

        let v = gen_random_bytes(VERIFIER_LEN)?;
        let presented = shake256(&v);
        let record = AuthenticationVerifier {
            hash: base64url_encode(shake256(&presented)),
            subject_id: subject_id.to_string(),
        };

        store_json(
            self.store.as_ref(),
            prefix::AUTH_VERIFIER,
            authorization_id,
            &record,
            Utc::now() + Duration::seconds(self.config.authorization_timeout),
        )
        .await?;

        tracing::debug!("Issued authentication verifier for {}", authorization_id);
        Ok(base64url_encode(presented))
    }

    /// Check the verifier echoed back by the client and, on success, issue the code.
    pub async fn verify_authentication(
        &self,
        authorization_id: &str,
        presented_verifier: &str,
    ) -> Result<AuthorizationResponse, AuthorizationError> {
        let server_error = |description: &str| {
            self.error("", "", AuthorizationErrorType::ServerError, description)
        };

        let request: AuthorizationRequest =
            get_json(self.store.as_ref(), prefix::AUTHORIZATION, authorization_id)
                .await
                .map_err(|_| server_error("failed to load authorization"))?
                .ok_or_else(|| server_error("authorization not found"))?;

        let record: AuthenticationVerifier =
            take_json(self.store.as_ref(), prefix::AUTH_VERIFIER, authorization_id)
                .await
                .map_err(|_| server_error("failed to load authentication verifier"))?
                .ok_or_else(|| {
                    self.error(
                        &request.redirect_uri,
                        &request.state,
                        AuthorizationErrorType::ServerError,
                        "authentication not completed",
                    )
                })?;

        let failure = match base64url_decode(presented_verifier) {
            Err(_) => Some((AuthorizationErrorType::BadRequest, "verifier malformed")),
            Ok(decoded) => {
                let hash = base64url_encode(shake256(&decoded));
                if bool::from(hash.as_bytes().ct_eq(record.hash.as_bytes())) {
                    None
                } else {
                    Some((AuthorizationErrorType::Unauthenticated, "verifier invalid"))
                }
            }
        };

        if let Some((error_type, description)) = failure {
            // The verifier is spent, so the request can never succeed
            if let Err(e) = self
                .store
                .remove(prefix::AUTHORIZATION, authorization_id)
                .await
            {
                tracing::error!("Failed to abandon authorization {}: {}", authorization_id, e);
            }
            return Err(self.error(
                &request.redirect_uri,
                &request.state,
                error_type,
                description,
            ));
        }

        self.succeed(authorization_id, &record.subject_id).await
    }

    /// Consume the pending request and bind a fresh code to it.
    async fn succeed(
        &self,
        authorization_id: &str,
        subject_id: &str,
    ) -> Result<AuthorizationResponse, AuthorizationError> {
        let request: AuthorizationRequest =
            take_json(self.store.as_ref(), prefix::AUTHORIZATION, authorization_id)
                .await
                .map_err(|_| {
                    self.error("", "", AuthorizationErrorType::ServerError, "failed to load authorization")
                })?
                .ok_or_else(|| {
                    self.error("", "", AuthorizationErrorType::ServerError, "authorization not found")
                })?;

        let code = gen_random_string(CODE_LEN).map_err(|_| {
            self.error(
                &request.redirect_uri,
                &request.state,
                AuthorizationErrorType::ServerError,
                "failed to generate code",
            )
        })?;

        let issued = IssuedCode {
            request: request.clone(),
            subject_id: subject_id.to_string(),
        };
        store_json(
            self.store.as_ref(),
            prefix::CODE,
            &code,
            &issued,
            Utc::now() + Duration::seconds(self.config.code_timeout),
        )
        .await
        .map_err(|_| {
            self.error(
                &request.redirect_uri,
                &request.state,
                AuthorizationErrorType::ServerError,
                "failed to store code",
            )
        })?;

        tracing::info!("Authorization {} succeeded", authorization_id);

        Ok(AuthorizationResponse {
            redirect_uri: request.redirect_uri,
            code,
            state: request.state,
            issuer: self.config.issuer.clone(),
        })
    }
}
