use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

/// Errors raised while issuing or verifying a passkey ceremony.
///
/// Every decoding and cryptographic check fails closed with one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PasskeyError {
    /// The ceremony was never issued, already consumed, or expired
    #[error("Ceremony not found")]
    CeremonyNotFound,

    /// A create ceremony was presented to assertion or vice versa
    #[error("Ceremony kind mismatch: {0}")]
    CeremonyKindMismatch(String),

    #[error("Invalid client data type: {0}")]
    InvalidType(String),

    #[error("Challenge mismatch")]
    ChallengeMismatch,

    #[error("Origin mismatch: {0}")]
    OriginMismatch(String),

    #[error("Relying party id hash mismatch")]
    RpIdMismatch,

    /// Malformed base64url, JSON, CBOR or authenticator data
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported attestation format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported attestation: {0}")]
    UnsupportedAttestation(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(i64),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(i64),

    #[error("Invalid authenticator flags: {0}")]
    Flags(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Certificate chain attestation is not supported")]
    CertificateChainUnsupported,

    #[error("Credential not allowed for this ceremony")]
    CredentialNotAllowed,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl From<StorageError> for PasskeyError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<UtilError> for PasskeyError {
    fn from(err: UtilError) -> Self {
        match err {
            UtilError::Format(msg) => Self::Decode(msg),
            UtilError::Crypto(msg) => Self::Crypto(msg),
        }
    }
}
