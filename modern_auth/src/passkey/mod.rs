mod config;
mod errors;
mod main;
mod types;

pub use config::{AttestationPreference, PasskeyConfig, UserVerification};
pub use errors::PasskeyError;
pub use main::{
    CeremonyVerifier, CosePublicKey, EcCurve, decode_cose_key, signature_base, verify_signature,
};
pub use types::{
    AllowCredential, AuthenticatorSelection, CeremonyKind, CeremonyOptions, CreationOptions,
    CredentialOptions, PubKeyCredParam, PublicKeyCredentialUserEntity, RelyingParty,
    RequestOptions, VerifiedAssertion, VerifiedRegistration,
};

#[cfg(test)]
pub(crate) use main::test_utils;
