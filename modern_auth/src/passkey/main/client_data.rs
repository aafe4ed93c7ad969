use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::passkey::errors::PasskeyError;
use crate::utils::{base64url_decode, sha256};

pub(crate) const TYPE_CREATE: &str = "webauthn.create";
pub(crate) const TYPE_GET: &str = "webauthn.get";

#[derive(Debug, Deserialize)]
struct ClientDataJson {
    #[serde(rename = "type")]
    type_: String,
    challenge: String,
    origin: String,
}

/// Decoded `clientDataJSON` together with the exact bytes the client sent.
#[derive(Debug, Clone)]
pub(crate) struct ParsedClientData {
    pub(crate) type_: String,
    pub(crate) challenge: Vec<u8>,
    pub(crate) origin: String,
    pub(crate) raw_data: Vec<u8>,
}

impl ParsedClientData {
    pub(crate) fn from_base64(client_data_json: &str) -> Result<Self, PasskeyError> {
        let raw_data = base64url_decode(client_data_json)
            .map_err(|e| PasskeyError::Decode(format!("clientDataJSON: {e}")))?;

        let data: ClientDataJson = serde_json::from_slice(&raw_data)
            .map_err(|e| PasskeyError::Decode(format!("clientDataJSON: {e}")))?;

        let challenge = base64url_decode(&data.challenge)
            .map_err(|_| PasskeyError::Decode("clientDataJSON challenge".to_string()))?;

        Ok(Self {
            type_: data.type_,
            challenge,
            origin: data.origin,
            raw_data,
        })
    }

    /// SHA-256 over the bytes as received, never over a re-serialization.
    pub(crate) fn hash(&self) -> Vec<u8> {
        sha256(&self.raw_data)
    }

    pub(crate) fn verify(
        &self,
        expected_type: &str,
        expected_challenge: &[u8],
        expected_origin: &str,
    ) -> Result<(), PasskeyError> {
        if self.type_ != expected_type {
            tracing::error!("Client data type mismatch: {}", self.type_);
            return Err(PasskeyError::InvalidType(self.type_.clone()));
        }

        if !bool::from(self.challenge.ct_eq(expected_challenge)) {
            tracing::error!("Client data challenge mismatch");
            return Err(PasskeyError::ChallengeMismatch);
        }

        if self.origin != expected_origin {
            tracing::error!(
                "Client data origin mismatch: expected {}, got {}",
                expected_origin,
                self.origin
            );
            return Err(PasskeyError::OriginMismatch(self.origin.clone()));
        }

        Ok(())
    }
}
