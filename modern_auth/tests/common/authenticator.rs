//! Software authenticator producing packed self-attestations and ES256 assertions.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ciborium::value::Value;
use modern_auth::{AssertionResponse, CeremonyOptions, CredentialOptions, RegistrationResponse};
use ring::digest;
use ring::rand::SystemRandom;
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};

pub const FLAG_UP: u8 = 0x01;
pub const FLAG_UV: u8 = 0x04;
pub const FLAG_AT: u8 = 0x40;

pub fn b64(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA256, data).as_ref().to_vec()
}

pub fn challenge_of(options: &CeremonyOptions) -> String {
    match &options.options {
        CredentialOptions::Create(create) => create.challenge.clone(),
        CredentialOptions::Get(get) => get.challenge.clone(),
    }
}

fn cbor(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).expect("CBOR encoding failed");
    out
}

pub struct MockAuthenticator {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
    pub credential_id: Vec<u8>,
    pub rp_id: String,
    pub origin: String,
    pub sign_count: u32,
}

impl MockAuthenticator {
    pub fn new(credential_id: &[u8], rp_id: &str, origin: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .expect("key generation failed");
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .expect("key parsing failed");
        Self {
            key_pair,
            rng,
            credential_id: credential_id.to_vec(),
            rp_id: rp_id.to_string(),
            origin: origin.to_string(),
            sign_count: 0,
        }
    }

    pub fn credential_id_b64(&self) -> String {
        b64(&self.credential_id)
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key_pair
            .sign(&self.rng, message)
            .expect("signing failed")
            .as_ref()
            .to_vec()
    }

    /// EC2 / ES256 / P-256 COSE key for this authenticator.
    pub fn cose_key(&self) -> Vec<u8> {
        let public = self.key_pair.public_key().as_ref();
        cbor(&Value::Map(vec![
            (Value::Integer(1.into()), Value::Integer(2.into())),
            (Value::Integer(3.into()), Value::Integer((-7).into())),
            (Value::Integer((-1).into()), Value::Integer(1.into())),
            (Value::Integer((-2).into()), Value::Bytes(public[1..33].to_vec())),
            (Value::Integer((-3).into()), Value::Bytes(public[33..65].to_vec())),
        ]))
    }

    pub fn client_data(&self, type_: &str, challenge: &str) -> Vec<u8> {
        serde_json::json!({
            "type": type_,
            "challenge": challenge,
            "origin": self.origin,
            "crossOrigin": false
        })
        .to_string()
        .into_bytes()
    }

    pub fn auth_data(&self, flags: u8, attested: bool) -> Vec<u8> {
        let mut data = sha256(self.rp_id.as_bytes());
        data.push(flags);
        data.extend_from_slice(&self.sign_count.to_be_bytes());
        if attested {
            data.extend_from_slice(&[0u8; 16]);
            data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
            data.extend_from_slice(&self.credential_id);
            data.extend_from_slice(&self.cose_key());
        }
        data
    }

    /// Attestation object with the given format and statement.
    pub fn attestation_object(fmt: &str, auth_data: &[u8], att_stmt: Value) -> Vec<u8> {
        cbor(&Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text(fmt.into())),
            (Value::Text("attStmt".into()), att_stmt),
            (Value::Text("authData".into()), Value::Bytes(auth_data.to_vec())),
        ]))
    }

    /// Packed self-attestation answering a create ceremony.
    pub fn register(&self, options: &CeremonyOptions) -> RegistrationResponse {
        let client_data = self.client_data("webauthn.create", &challenge_of(options));
        let auth_data = self.auth_data(FLAG_UP | FLAG_UV | FLAG_AT, true);
        let mut signed = auth_data.clone();
        signed.extend_from_slice(&sha256(&client_data));
        let att_stmt = Value::Map(vec![
            (Value::Text("alg".into()), Value::Integer((-7).into())),
            (Value::Text("sig".into()), Value::Bytes(self.sign(&signed))),
        ]);

        RegistrationResponse {
            client_data_json: b64(&client_data),
            attestation_object: b64(Self::attestation_object("packed", &auth_data, att_stmt)),
        }
    }

    /// Assertion answering a get ceremony; bumps the signature counter.
    pub fn assert(&mut self, options: &CeremonyOptions, user_handle: Option<&[u8]>) -> AssertionResponse {
        self.sign_count += 1;
        let client_data = self.client_data("webauthn.get", &challenge_of(options));
        let auth_data = self.auth_data(FLAG_UP | FLAG_UV, false);
        let mut signed = auth_data.clone();
        signed.extend_from_slice(&sha256(&client_data));

        AssertionResponse {
            client_data_json: b64(&client_data),
            authenticator_data: b64(&auth_data),
            signature: b64(self.sign(&signed)),
            user_handle: user_handle.map(b64),
        }
    }
}
