use super::errors::CoordinationError;
use super::service::ModernAuth;
use super::types::{AssertionResponse, CeremonyResult, RegistrationResponse};
use crate::passkey::{CeremonyOptions, PasskeyError};
use crate::userdb::{Credential, CredentialRepository, User, UserRepository};
use crate::utils::{base64url_decode, shake256};

/// Scope recorded on grants issued straight from a ceremony
const CEREMONY_SCOPE: &str = "";

impl ModernAuth {
    /// Start a registration or an authentication for `identifier`.
    ///
    /// Only `SHAKE256(identifier)` is looked up; the identifier itself is shown to the
    /// authenticator as the account name and never stored.
    pub async fn initiate_ceremony(
        &self,
        identifier: &str,
    ) -> Result<CeremonyOptions, CoordinationError> {
        if identifier.trim().is_empty() {
            return Err(CoordinationError::InvalidInput("identifier is empty".to_string()).log());
        }

        let user_handle = shake256(identifier.as_bytes());
        let known_credentials = match self.users.find_by_user_handle(&user_handle).await? {
            Some(user) if !user.is_active() => {
                return Err(CoordinationError::Inactive("user".to_string()).log());
            }
            Some(user) => self
                .credentials
                .find_all_by_user_id(&user.id)
                .await?
                .into_iter()
                .filter(Credential::is_active)
                .map(|c| c.credential_id)
                .collect(),
            None => Vec::new(),
        };

        Ok(self
            .ceremonies
            .initiate(&user_handle, identifier, &known_credentials)
            .await?)
    }

    /// Verify a registration, persist the user and credential, and issue a grant.
    ///
    /// With `authorization_id` the result also carries the verifier that resumes
    /// that pending authorization.
    pub async fn complete_registration(
        &self,
        authentication_id: &str,
        response: &RegistrationResponse,
        authorization_id: Option<&str>,
    ) -> Result<CeremonyResult, CoordinationError> {
        let registration = self
            .ceremonies
            .verify_registration(
                authentication_id,
                &response.client_data_json,
                &response.attestation_object,
            )
            .await?;

        if self
            .credentials
            .find_by_credential_id(&registration.credential_id)
            .await?
            .is_some()
        {
            return Err(
                CoordinationError::Conflict("credential already registered".to_string()).log(),
            );
        }

        let user_handle = registration.user_handle.ok_or_else(|| {
            CoordinationError::InvalidInput("ceremony carries no user handle".to_string()).log()
        })?;

        let user = match self.users.find_by_user_handle(&user_handle).await? {
            Some(user) if !user.is_active() => {
                return Err(CoordinationError::Inactive("user".to_string()).log());
            }
            Some(user) => user,
            None => {
                let user = User::new(user_handle);
                self.users.save_user(user.clone()).await?;
                tracing::info!("Created user {}", user.id);
                user
            }
        };

        let credential = Credential::new(
            registration.credential_id,
            registration.public_key_cose,
            &user.id,
        );
        self.credentials.save_credential(credential.clone()).await?;
        tracing::info!(
            "Registered credential {} (aaguid {}) for user {}",
            credential.id,
            registration.aaguid,
            user.id
        );

        self.issue_grant(&user.id, authorization_id).await
    }

    /// Verify an assertion made with the stored credential `credential_id` (base64url) and
    /// issue a grant for its owner.
    pub async fn complete_assertion(
        &self,
        authentication_id: &str,
        credential_id: &str,
        response: &AssertionResponse,
        authorization_id: Option<&str>,
    ) -> Result<CeremonyResult, CoordinationError> {
        let raw_credential_id = base64url_decode(credential_id)?;

        let credential = self
            .credentials
            .find_by_credential_id(&raw_credential_id)
            .await?
            .ok_or_else(|| {
                CoordinationError::ResourceNotFound {
                    resource_type: "credential".to_string(),
                    resource_id: credential_id.to_string(),
                }
                .log()
            })?;
        if !credential.is_active() {
            return Err(CoordinationError::Inactive("credential".to_string()).log());
        }

        let user = self
            .users
            .find_user(&credential.owner_user_id)
            .await?
            .ok_or_else(|| {
                CoordinationError::ResourceNotFound {
                    resource_type: "user".to_string(),
                    resource_id: credential.owner_user_id.clone(),
                }
                .log()
            })?;
        if !user.is_active() {
            return Err(CoordinationError::Inactive("user".to_string()).log());
        }

        if let Some(presented) = response.user_handle.as_deref().filter(|h| !h.is_empty()) {
            let presented = base64url_decode(presented)
                .map_err(|_| PasskeyError::Decode("userHandle".to_string()))?;
            if presented != user.user_handle {
                return Err(CoordinationError::UserHandleMismatch.log());
            }
        }

        let assertion = self
            .ceremonies
            .verify_assertion(
                authentication_id,
                &credential.credential_id,
                &credential.public_key_cose,
                &response.client_data_json,
                &response.authenticator_data,
                &response.signature,
            )
            .await?;

        if assertion
            .user_handle
            .as_ref()
            .is_some_and(|handle| *handle != user.user_handle)
        {
            return Err(CoordinationError::UserHandleMismatch.log());
        }

        tracing::info!(
            "User {} authenticated with credential {} (sign count {})",
            user.id,
            credential.id,
            assertion.sign_count
        );

        self.issue_grant(&user.id, authorization_id).await
    }

    async fn issue_grant(
        &self,
        subject_id: &str,
        authorization_id: Option<&str>,
    ) -> Result<CeremonyResult, CoordinationError> {
        let authentication_verifier = match authorization_id {
            Some(id) => Some(
                self.authorization
                    .issue_authentication_verifier(id, subject_id)
                    .await?,
            ),
            None => None,
        };

        let grant = self.tokens.new_grant(
            uuid::Uuid::new_v4().to_string(),
            &self.auth_client_id,
            subject_id,
            CEREMONY_SCOPE,
            true,
        );
        let tokens = self.tokens.issue(&grant).await?;

        Ok(CeremonyResult {
            tokens,
            authentication_verifier,
        })
    }
}
