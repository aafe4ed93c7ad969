mod packed;

use ciborium::value::Value as CborValue;

use crate::passkey::errors::PasskeyError;

use super::cose::CosePublicKey;

pub(crate) const FORMAT_PACKED: &str = "packed";

/// Top level of a decoded attestation object.
#[derive(Debug, Clone)]
pub(crate) struct AttestationObject {
    pub(crate) fmt: String,
    pub(crate) auth_data: Vec<u8>,
    pub(crate) att_stmt: Vec<(CborValue, CborValue)>,
}

impl AttestationObject {
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, PasskeyError> {
        let value: CborValue = ciborium::de::from_reader(bytes)
            .map_err(|e| PasskeyError::Decode(format!("Invalid attestation object CBOR: {e}")))?;

        let CborValue::Map(map) = value else {
            return Err(PasskeyError::Decode(
                "Attestation object is not a map".to_string(),
            ));
        };

        let mut fmt = None;
        let mut auth_data = None;
        let mut att_stmt = None;

        for (key, value) in map {
            match (key, value) {
                (CborValue::Text(k), CborValue::Text(v)) if k == "fmt" => fmt = Some(v),
                (CborValue::Text(k), CborValue::Bytes(v)) if k == "authData" => {
                    auth_data = Some(v)
                }
                (CborValue::Text(k), CborValue::Map(v)) if k == "attStmt" => att_stmt = Some(v),
                _ => {}
            }
        }

        match (fmt, auth_data, att_stmt) {
            (Some(fmt), Some(auth_data), Some(att_stmt)) => Ok(Self {
                fmt,
                auth_data,
                att_stmt,
            }),
            _ => Err(PasskeyError::Decode(
                "Attestation object missing fmt, authData or attStmt".to_string(),
            )),
        }
    }

    /// Check the attestation statement for this object's format.
    pub(crate) fn verify_statement(
        &self,
        client_data_raw: &[u8],
        credential_key: &CosePublicKey,
    ) -> Result<(), PasskeyError> {
        match self.fmt.as_str() {
            FORMAT_PACKED => packed::verify_packed_attestation(
                &self.auth_data,
                client_data_raw,
                &self.att_stmt,
                credential_key,
            ),
            other => {
                tracing::error!("Unsupported attestation format: {}", other);
                Err(PasskeyError::UnsupportedFormat(other.to_string()))
            }
        }
    }
}
