//! Test utilities for passkey module tests
//!
//! Builds real credentials with ring key pairs so the verifier can be exercised
//! end to end without a browser.

use ciborium::value::Value as CborValue;
use ring::rand::SystemRandom;
use ring::signature::{
    ECDSA_P256_SHA256_ASN1_SIGNING, ECDSA_P384_SHA384_ASN1_SIGNING, EcdsaKeyPair, KeyPair,
};

use crate::utils::{base64url_encode, sha256};

use super::auth_data::flags;
use super::cose::{CosePublicKey, EcCurve};
use super::signature::signature_base;

fn generate(alg: &'static ring::signature::EcdsaSigningAlgorithm) -> (EcdsaKeyPair, Vec<u8>) {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, &rng).unwrap();
    let key_pair = EcdsaKeyPair::from_pkcs8(alg, pkcs8.as_ref(), &rng).unwrap();
    let public_key = key_pair.public_key().as_ref().to_vec();
    (key_pair, public_key)
}

/// P-256 key pair and its uncompressed public point
pub(crate) fn generate_key_pair() -> (EcdsaKeyPair, Vec<u8>) {
    generate(&ECDSA_P256_SHA256_ASN1_SIGNING)
}

pub(crate) fn generate_p384_key_pair() -> (EcdsaKeyPair, Vec<u8>) {
    generate(&ECDSA_P384_SHA384_ASN1_SIGNING)
}

pub(crate) fn sign(key_pair: &EcdsaKeyPair, message: &[u8]) -> Vec<u8> {
    let rng = SystemRandom::new();
    key_pair.sign(&rng, message).unwrap().as_ref().to_vec()
}

fn split_point(public_key: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let len = (public_key.len() - 1) / 2;
    (
        public_key[1..1 + len].to_vec(),
        public_key[1 + len..].to_vec(),
    )
}

pub(crate) fn cose_public_key(public_key: &[u8], alg: i64) -> CosePublicKey {
    let (x, y) = split_point(public_key);
    CosePublicKey {
        alg,
        curve: EcCurve::P256,
        x,
        y,
    }
}

pub(crate) fn cose_key_bytes_with(public_key: &[u8], alg: i64, crv: i64) -> Vec<u8> {
    let (x, y) = split_point(public_key);
    let map = CborValue::Map(vec![
        (CborValue::Integer(1.into()), CborValue::Integer(2.into())),
        (CborValue::Integer(3.into()), CborValue::Integer(alg.into())),
        (CborValue::Integer((-1).into()), CborValue::Integer(crv.into())),
        (CborValue::Integer((-2).into()), CborValue::Bytes(x)),
        (CborValue::Integer((-3).into()), CborValue::Bytes(y)),
    ]);
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&map, &mut bytes).unwrap();
    bytes
}

/// COSE encoding of a P-256 ES256 key
pub(crate) fn cose_key_bytes(public_key: &[u8]) -> Vec<u8> {
    cose_key_bytes_with(public_key, -7, 1)
}

pub(crate) fn auth_data(
    rp_id: &str,
    flag_bits: u8,
    sign_count: u32,
    credential: Option<(&[u8], &[u8])>,
) -> Vec<u8> {
    let mut data = sha256(rp_id.as_bytes());
    data.push(flag_bits);
    data.extend_from_slice(&sign_count.to_be_bytes());
    if let Some((credential_id, cose_key)) = credential {
        data.extend_from_slice(&[0u8; 16]);
        data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(credential_id);
        data.extend_from_slice(cose_key);
    }
    data
}

pub(crate) fn registration_auth_data(rp_id: &str, credential_id: &[u8], cose_key: &[u8]) -> Vec<u8> {
    auth_data(
        rp_id,
        flags::UP | flags::UV | flags::AT,
        0,
        Some((credential_id, cose_key)),
    )
}

/// Raw clientDataJSON bytes
pub(crate) fn client_data(type_: &str, challenge: &str, origin: &str) -> Vec<u8> {
    format!(
        r#"{{"type":"{type_}","challenge":"{challenge}","origin":"{origin}","crossOrigin":false}}"#
    )
    .into_bytes()
}

pub(crate) fn attestation_object(
    fmt: &str,
    auth_data: &[u8],
    att_stmt: Vec<(CborValue, CborValue)>,
) -> Vec<u8> {
    let map = CborValue::Map(vec![
        (
            CborValue::Text("fmt".to_string()),
            CborValue::Text(fmt.to_string()),
        ),
        (
            CborValue::Text("attStmt".to_string()),
            CborValue::Map(att_stmt),
        ),
        (
            CborValue::Text("authData".to_string()),
            CborValue::Bytes(auth_data.to_vec()),
        ),
    ]);
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&map, &mut bytes).unwrap();
    bytes
}

/// Packed self-attestation statement signed by the credential key itself
pub(crate) fn packed_self_statement(
    key_pair: &EcdsaKeyPair,
    alg: i64,
    auth_data: &[u8],
    client_data: &[u8],
) -> Vec<(CborValue, CborValue)> {
    let sig = sign(key_pair, &signature_base(auth_data, client_data));
    vec![
        (
            CborValue::Text("alg".to_string()),
            CborValue::Integer(alg.into()),
        ),
        (CborValue::Text("sig".to_string()), CborValue::Bytes(sig)),
    ]
}

/// Everything a browser would send back for a registration.
pub(crate) struct RegistrationFixture {
    pub(crate) key_pair: EcdsaKeyPair,
    pub(crate) public_key: Vec<u8>,
    pub(crate) credential_id: Vec<u8>,
    pub(crate) client_data_json: String,
    pub(crate) attestation_object: String,
}

pub(crate) fn registration_fixture(
    rp_id: &str,
    origin: &str,
    challenge: &str,
    credential_id: &[u8],
) -> RegistrationFixture {
    let (key_pair, public_key) = generate_key_pair();
    let cose_key = cose_key_bytes(&public_key);
    let auth_data = registration_auth_data(rp_id, credential_id, &cose_key);
    let client_data = client_data("webauthn.create", challenge, origin);
    let att_stmt = packed_self_statement(&key_pair, -7, &auth_data, &client_data);
    let attestation = attestation_object("packed", &auth_data, att_stmt);

    RegistrationFixture {
        key_pair,
        public_key,
        credential_id: credential_id.to_vec(),
        client_data_json: base64url_encode(&client_data),
        attestation_object: base64url_encode(&attestation),
    }
}

/// Client data, authenticator data and signature for an assertion, all base64url.
pub(crate) fn assertion_fixture(
    key_pair: &EcdsaKeyPair,
    rp_id: &str,
    origin: &str,
    challenge: &str,
    sign_count: u32,
) -> (String, String, String) {
    let auth_data = auth_data(rp_id, flags::UP | flags::UV, sign_count, None);
    let client_data = client_data("webauthn.get", challenge, origin);
    let sig = sign(key_pair, &signature_base(&auth_data, &client_data));
    (
        base64url_encode(&client_data),
        base64url_encode(&auth_data),
        base64url_encode(&sig),
    )
}
