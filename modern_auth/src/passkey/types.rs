use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::{AttestationPreference, UserVerification};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CeremonyKind {
    Create,
    Get,
}

/// Server-side record of an issued ceremony, stored under its authentication id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct Ceremony {
    pub(crate) authentication_id: String,
    pub(crate) kind: CeremonyKind,
    /// base64url encoded challenge
    pub(crate) challenge: String,
    pub(crate) rp_id: String,
    pub(crate) allowed_algorithms: Vec<i64>,
    /// base64url encoded credential ids, only for `Get`
    pub(crate) allow_credentials: Option<Vec<String>>,
    /// base64url encoded user handle
    pub(crate) user_handle: Option<String>,
    pub(crate) expires_at: DateTime<Utc>,
}

/// What the client needs to run a ceremony: the id to echo back plus the WebAuthn options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CeremonyOptions {
    pub authentication_id: String,
    #[serde(flatten)]
    pub options: CredentialOptions,
}

impl CeremonyOptions {
    pub fn kind(&self) -> CeremonyKind {
        match self.options {
            CredentialOptions::Create(_) => CeremonyKind::Create,
            CredentialOptions::Get(_) => CeremonyKind::Get,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "publicKey", rename_all = "lowercase")]
pub enum CredentialOptions {
    Create(CreationOptions),
    Get(RequestOptions),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreationOptions {
    pub challenge: String,
    pub rp: RelyingParty,
    pub user: PublicKeyCredentialUserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    pub authenticator_selection: AuthenticatorSelection,
    pub timeout: u32,
    pub attestation: AttestationPreference,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub challenge: String,
    pub rp_id: String,
    pub allow_credentials: Vec<AllowCredential>,
    pub timeout: u32,
    pub user_verification: UserVerification,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelyingParty {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialUserEntity {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub type_: String,
    pub alg: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub resident_key: String,
    pub require_resident_key: bool,
    pub user_verification: UserVerification,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllowCredential {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
}

/// Credential produced by a successful registration ceremony, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedRegistration {
    pub credential_id: Vec<u8>,
    pub public_key_cose: Vec<u8>,
    pub aaguid: String,
    pub sign_count: u32,
    pub user_handle: Option<Vec<u8>>,
}

/// Outcome of a successful assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedAssertion {
    pub sign_count: u32,
    pub user_handle: Option<Vec<u8>>,
}
