use serde::{Deserialize, Serialize};

use crate::oauth2::TokenResponse;

/// Browser output of `navigator.credentials.create()`, base64url encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub attestation_object: String,
}

/// Browser output of `navigator.credentials.get()`, base64url encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    #[serde(default)]
    pub user_handle: Option<String>,
}

/// Tokens from a completed ceremony, plus the verifier to resume an authorization with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CeremonyResult {
    #[serde(flatten)]
    pub tokens: TokenResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_verifier: Option<String>,
}
