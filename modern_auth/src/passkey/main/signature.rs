use p256::ecdsa::signature::hazmat::PrehashVerifier;
use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::passkey::config::{ES256, ES384, ES512};
use crate::utils::sha256;

use super::cose::{CosePublicKey, EcCurve};

/// The WebAuthn signature base: `authenticatorData || SHA-256(clientDataJSON)`.
pub fn signature_base(auth_data_raw: &[u8], client_data_raw: &[u8]) -> Vec<u8> {
    signed_with_client_hash(auth_data_raw, &sha256(client_data_raw))
}

/// [`signature_base`] for a client data hash that is already computed.
pub(crate) fn signed_with_client_hash(auth_data_raw: &[u8], client_data_hash: &[u8]) -> Vec<u8> {
    let mut signed = Vec::with_capacity(auth_data_raw.len() + client_data_hash.len());
    signed.extend_from_slice(auth_data_raw);
    signed.extend_from_slice(client_data_hash);
    signed
}

/// ring verifier for a curve and COSE algorithm, where ring has one.
fn ring_algorithm(curve: EcCurve, alg: i64) -> Option<&'static dyn VerificationAlgorithm> {
    let algorithm: &'static dyn VerificationAlgorithm = match (curve, alg) {
        (EcCurve::P256, ES256) => &signature::ECDSA_P256_SHA256_ASN1,
        (EcCurve::P256, ES384) => &signature::ECDSA_P256_SHA384_ASN1,
        (EcCurve::P384, ES256) => &signature::ECDSA_P384_SHA256_ASN1,
        (EcCurve::P384, ES384) => &signature::ECDSA_P384_SHA384_ASN1,
        _ => return None,
    };
    Some(algorithm)
}

/// Message digest selected by the COSE `alg` (-7 SHA-256, -35 SHA-384, -36 SHA-512).
fn prehash(alg: i64, message: &[u8]) -> Option<Vec<u8>> {
    match alg {
        ES256 => Some(Sha256::digest(message).to_vec()),
        ES384 => Some(Sha384::digest(message).to_vec()),
        ES512 => Some(Sha512::digest(message).to_vec()),
        _ => None,
    }
}

/// Left-pad a digest shorter than the field so it keeps its integer value.
fn fit_to_field(digest: Vec<u8>, field_len: usize) -> Vec<u8> {
    if digest.len() >= field_len {
        return digest;
    }
    let mut padded = vec![0u8; field_len - digest.len()];
    padded.extend_from_slice(&digest);
    padded
}

/// Uncompressed SEC1 point with coordinates left-padded to the field size.
fn sec1_point(key: &CosePublicKey) -> Option<Vec<u8>> {
    let len = key.curve.field_len();
    if key.x.len() > len || key.y.len() > len || key.x.is_empty() || key.y.is_empty() {
        return None;
    }

    let mut point = Vec::with_capacity(1 + 2 * len);
    point.push(0x04);
    point.resize(1 + len - key.x.len(), 0);
    point.extend_from_slice(&key.x);
    point.resize(1 + 2 * len - key.y.len(), 0);
    point.extend_from_slice(&key.y);
    Some(point)
}

/// Curve/hash pairs ring does not cover: SHA-512 on any curve and everything on P-521.
fn verify_prehashed(curve: EcCurve, point: &[u8], digest: &[u8], signature: &[u8]) -> bool {
    let result = match curve {
        EcCurve::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(point).and_then(|key| {
            let sig = p256::ecdsa::Signature::from_der(signature)?;
            key.verify_prehash(digest, &sig)
        }),
        EcCurve::P384 => p384::ecdsa::VerifyingKey::from_sec1_bytes(point).and_then(|key| {
            let sig = p384::ecdsa::Signature::from_der(signature)?;
            key.verify_prehash(digest, &sig)
        }),
        EcCurve::P521 => p521::ecdsa::VerifyingKey::from_sec1_bytes(point).and_then(|key| {
            let sig = p521::ecdsa::Signature::from_der(signature)?;
            key.verify_prehash(digest, &sig)
        }),
    };
    result.is_ok()
}

/// Verify a DER encoded ECDSA signature. Any failure, including malformed input, is `false`.
pub fn verify_signature(key: &CosePublicKey, signature: &[u8], signed: &[u8]) -> bool {
    let Some(point) = sec1_point(key) else {
        tracing::debug!("Public key coordinates do not fit the curve");
        return false;
    };

    let verified = match ring_algorithm(key.curve, key.alg) {
        Some(algorithm) => UnparsedPublicKey::new(algorithm, &point)
            .verify(signed, signature)
            .is_ok(),
        None => {
            let Some(digest) = prehash(key.alg, signed) else {
                tracing::warn!("Unknown COSE algorithm: {}", key.alg);
                return false;
            };
            let digest = fit_to_field(digest, key.curve.field_len());
            verify_prehashed(key.curve, &point, &digest, signature)
        }
    };

    if !verified {
        tracing::debug!("Signature verification failed");
    }
    verified
}
