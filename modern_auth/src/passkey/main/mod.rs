mod attestation;
mod auth_data;
mod ceremony;
mod client_data;
mod cose;
mod signature;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ceremony::CeremonyVerifier;
pub use cose::{CosePublicKey, EcCurve};

pub use cose::decode_cose_key;
pub use signature::{signature_base, verify_signature};
