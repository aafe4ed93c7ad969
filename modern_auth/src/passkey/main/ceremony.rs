use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::passkey::config::{PasskeyConfig, UserVerification};
use crate::passkey::errors::PasskeyError;
use crate::passkey::types::{
    AllowCredential, AuthenticatorSelection, Ceremony, CeremonyKind, CeremonyOptions,
    CreationOptions, CredentialOptions, PubKeyCredParam, PublicKeyCredentialUserEntity,
    RelyingParty, RequestOptions, VerifiedAssertion, VerifiedRegistration,
};
use crate::storage::{KeyValueStore, prefix, store_json, take_json};
use crate::utils::{base64url_decode, base64url_encode, gen_random_bytes, sha256};

use super::attestation::AttestationObject;
use super::auth_data::{AuthenticatorData, format_aaguid};
use super::client_data::{ParsedClientData, TYPE_CREATE, TYPE_GET};
use super::cose::decode_cose_key;
use super::signature::{signed_with_client_hash, verify_signature};

const CHALLENGE_LEN: usize = 32;

/// Issues WebAuthn ceremonies and verifies the responses to them.
pub struct CeremonyVerifier {
    config: PasskeyConfig,
    store: Arc<dyn KeyValueStore>,
}

impl CeremonyVerifier {
    pub fn new(config: PasskeyConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &PasskeyConfig {
        &self.config
    }

    /// Start a ceremony for the subject identified by `user_handle`.
    ///
    /// With no known credentials a `Create` ceremony is issued, otherwise a `Get` ceremony
    /// restricted to `known_credentials`. `user_name` only appears in the create options.
    pub async fn initiate(
        &self,
        user_handle: &[u8],
        user_name: &str,
        known_credentials: &[Vec<u8>],
    ) -> Result<CeremonyOptions, PasskeyError> {
        let authentication_id = uuid::Uuid::new_v4().to_string();
        let challenge = base64url_encode(gen_random_bytes(CHALLENGE_LEN)?);
        let user_handle = base64url_encode(user_handle);
        let timeout_ms = self.config.timeout.saturating_mul(1000);

        let (kind, allow_credentials, options) = if known_credentials.is_empty() {
            let options = CredentialOptions::Create(CreationOptions {
                challenge: challenge.clone(),
                rp: RelyingParty {
                    id: self.config.rp_id.clone(),
                    name: self.config.rp_name.clone(),
                },
                user: PublicKeyCredentialUserEntity {
                    id: user_handle.clone(),
                    name: user_name.to_string(),
                    display_name: user_name.to_string(),
                },
                pub_key_cred_params: self
                    .config
                    .allowed_algorithms
                    .iter()
                    .map(|alg| PubKeyCredParam {
                        type_: "public-key".to_string(),
                        alg: *alg,
                    })
                    .collect(),
                authenticator_selection: AuthenticatorSelection {
                    resident_key: "preferred".to_string(),
                    require_resident_key: false,
                    user_verification: self.config.user_verification,
                },
                timeout: timeout_ms,
                attestation: self.config.attestation,
            });
            (CeremonyKind::Create, None, options)
        } else {
            let ids: Vec<String> = known_credentials.iter().map(base64url_encode).collect();
            let options = CredentialOptions::Get(RequestOptions {
                challenge: challenge.clone(),
                rp_id: self.config.rp_id.clone(),
                allow_credentials: ids
                    .iter()
                    .map(|id| AllowCredential {
                        type_: "public-key".to_string(),
                        id: id.clone(),
                    })
                    .collect(),
                timeout: timeout_ms,
                user_verification: self.config.user_verification,
            });
            (CeremonyKind::Get, Some(ids), options)
        };

        let ceremony = Ceremony {
            authentication_id: authentication_id.clone(),
            kind,
            challenge,
            rp_id: self.config.rp_id.clone(),
            allowed_algorithms: self.config.allowed_algorithms.clone(),
            allow_credentials,
            user_handle: Some(user_handle),
            expires_at: Utc::now() + Duration::seconds(self.config.challenge_timeout),
        };

        store_json(
            self.store.as_ref(),
            prefix::CEREMONY,
            &authentication_id,
            &ceremony,
            ceremony.expires_at,
        )
        .await?;

        tracing::info!(
            "Initiated {:?} ceremony {}",
            ceremony.kind,
            authentication_id
        );

        Ok(CeremonyOptions {
            authentication_id,
            options,
        })
    }

    /// Consume the ceremony; any later lookup of the same id fails.
    async fn take_ceremony(
        &self,
        authentication_id: &str,
        expected: CeremonyKind,
    ) -> Result<Ceremony, PasskeyError> {
        let ceremony: Ceremony = take_json(self.store.as_ref(), prefix::CEREMONY, authentication_id)
            .await?
            .ok_or_else(|| {
                tracing::error!("Ceremony {} not found", authentication_id);
                PasskeyError::CeremonyNotFound
            })?;

        if ceremony.kind != expected {
            tracing::error!(
                "Ceremony {} is {:?}, expected {:?}",
                authentication_id,
                ceremony.kind,
                expected
            );
            return Err(PasskeyError::CeremonyKindMismatch(format!(
                "expected {expected:?}, found {:?}",
                ceremony.kind
            )));
        }

        Ok(ceremony)
    }

    fn check_auth_data(
        &self,
        auth_data: &AuthenticatorData,
        rp_id: &str,
    ) -> Result<(), PasskeyError> {
        if auth_data.rp_id_hash.as_slice() != sha256(rp_id.as_bytes()).as_slice() {
            tracing::error!("RP ID hash mismatch for {}", rp_id);
            return Err(PasskeyError::RpIdMismatch);
        }

        if !auth_data.is_user_present() {
            return Err(PasskeyError::Flags("user not present".to_string()));
        }

        if self.config.user_verification == UserVerification::Required
            && !auth_data.is_user_verified()
        {
            return Err(PasskeyError::Flags("user not verified".to_string()));
        }

        tracing::debug!(
            "Flags ok: uv={}, backup_eligible={}, backed_up={}",
            auth_data.is_user_verified(),
            auth_data.is_backup_eligible(),
            auth_data.is_backed_up()
        );

        Ok(())
    }

    /// Verify a registration response against the ceremony it answers.
    pub async fn verify_registration(
        &self,
        authentication_id: &str,
        client_data_json: &str,
        attestation_object: &str,
    ) -> Result<VerifiedRegistration, PasskeyError> {
        let ceremony = self
            .take_ceremony(authentication_id, CeremonyKind::Create)
            .await?;

        let client_data = ParsedClientData::from_base64(client_data_json)?;
        let challenge = base64url_decode(&ceremony.challenge)?;
        client_data.verify(TYPE_CREATE, &challenge, &self.config.origin)?;

        let attestation_bytes = base64url_decode(attestation_object)
            .map_err(|_| PasskeyError::Decode("attestationObject".to_string()))?;
        let attestation = AttestationObject::parse(&attestation_bytes)?;
        if attestation.fmt != super::attestation::FORMAT_PACKED {
            tracing::error!("Unsupported attestation format: {}", attestation.fmt);
            return Err(PasskeyError::UnsupportedFormat(attestation.fmt));
        }

        let auth_data = AuthenticatorData::parse(&attestation.auth_data)?;
        self.check_auth_data(&auth_data, &ceremony.rp_id)?;

        let attested = auth_data
            .attested_credential
            .as_ref()
            .ok_or_else(|| PasskeyError::Flags("attested credential data missing".to_string()))?;

        let key = decode_cose_key(&attested.public_key)?;
        if !ceremony.allowed_algorithms.contains(&key.alg) {
            tracing::error!("Credential algorithm {} not allowed", key.alg);
            return Err(PasskeyError::UnsupportedAlgorithm(key.alg));
        }

        attestation.verify_statement(&client_data.raw_data, &key)?;

        let user_handle = ceremony
            .user_handle
            .as_deref()
            .map(base64url_decode)
            .transpose()?;

        tracing::info!("Registration ceremony {} verified", authentication_id);

        Ok(VerifiedRegistration {
            credential_id: attested.credential_id.clone(),
            public_key_cose: attested.public_key.clone(),
            aaguid: format_aaguid(&attested.aaguid),
            sign_count: auth_data.sign_count,
            user_handle,
        })
    }

    /// Verify an assertion made with a stored credential.
    pub async fn verify_assertion(
        &self,
        authentication_id: &str,
        credential_id: &[u8],
        public_key_cose: &[u8],
        client_data_json: &str,
        authenticator_data: &str,
        signature: &str,
    ) -> Result<VerifiedAssertion, PasskeyError> {
        let ceremony = self
            .take_ceremony(authentication_id, CeremonyKind::Get)
            .await?;

        if let Some(allowed) = &ceremony.allow_credentials {
            let presented = base64url_encode(credential_id);
            if !allowed.iter().any(|id| *id == presented) {
                tracing::error!("Credential not in allow list of ceremony {}", authentication_id);
                return Err(PasskeyError::CredentialNotAllowed);
            }
        }

        let client_data = ParsedClientData::from_base64(client_data_json)?;
        let challenge = base64url_decode(&ceremony.challenge)?;
        client_data.verify(TYPE_GET, &challenge, &self.config.origin)?;

        let auth_data_raw = base64url_decode(authenticator_data)
            .map_err(|_| PasskeyError::Decode("authenticatorData".to_string()))?;
        let auth_data = AuthenticatorData::parse(&auth_data_raw)?;
        self.check_auth_data(&auth_data, &ceremony.rp_id)?;

        let key = decode_cose_key(public_key_cose)?;
        let signature = base64url_decode(signature)
            .map_err(|_| PasskeyError::Decode("signature".to_string()))?;

        let signed = signed_with_client_hash(&auth_data.raw, &client_data.hash());
        if !verify_signature(&key, &signature, &signed) {
            tracing::error!("Assertion signature invalid for ceremony {}", authentication_id);
            return Err(PasskeyError::InvalidSignature);
        }

        let user_handle = ceremony
            .user_handle
            .as_deref()
            .map(base64url_decode)
            .transpose()?;

        tracing::info!("Assertion ceremony {} verified", authentication_id);

        Ok(VerifiedAssertion {
            sign_count: auth_data.sign_count,
            user_handle,
        })
    }
}
