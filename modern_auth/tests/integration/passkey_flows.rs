use ciborium::value::Value;
use modern_auth::{
    CeremonyKind, CoordinationError, CredentialOptions, ModernAuth, PasskeyError,
    RegistrationResponse, decode_cose_key, signature_base, verify_signature,
};
use proptest::prelude::*;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::common::authenticator::{FLAG_AT, FLAG_UP, b64, challenge_of, sha256};
use crate::common::constants::{ORIGIN, RP_ID};
use crate::common::{MockAuthenticator, all_backends, memory_auth};

async fn register(auth: &ModernAuth, identifier: &str, authenticator: &MockAuthenticator) -> String {
    let options = auth.initiate_ceremony(identifier).await.unwrap();
    assert_eq!(options.kind(), CeremonyKind::Create);
    let response = authenticator.register(&options);
    let result = auth
        .complete_registration(&options.authentication_id, &response, None)
        .await
        .unwrap();
    result.tokens.access_token
}

fn passkey_error(result: Result<impl std::fmt::Debug, CoordinationError>) -> PasskeyError {
    match result {
        Err(CoordinationError::PasskeyError(err)) => err,
        other => panic!("expected a passkey error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_then_authenticate_on_every_backend() {
    for (backend, auth) in all_backends().await {
        // Given a registered authenticator
        let mut authenticator = MockAuthenticator::new(b"credential-1", RP_ID, ORIGIN);
        let access_token = register(&auth, "alice@example.com", &authenticator).await;
        let registered = auth.validate_token(&access_token).await.unwrap();

        // When the same identifier comes back
        let options = auth.initiate_ceremony("alice@example.com").await.unwrap();

        // Then it is asked for that credential
        match &options.options {
            CredentialOptions::Get(get) => {
                assert_eq!(get.rp_id, RP_ID, "{backend}");
                assert_eq!(get.allow_credentials[0].id, authenticator.credential_id_b64());
            }
            CredentialOptions::Create(_) => panic!("{backend}: expected a get ceremony"),
        }

        // And a signed assertion authenticates the same subject
        let response = authenticator.assert(&options, None);
        let result = auth
            .complete_assertion(
                &options.authentication_id,
                &authenticator.credential_id_b64(),
                &response,
                None,
            )
            .await
            .unwrap();
        let grant = auth.validate_token(&result.tokens.access_token).await.unwrap();
        assert_eq!(grant.subject_id, registered.subject_id, "{backend}");
        assert!(result.tokens.refresh_token.is_some(), "{backend}");
    }
}

#[tokio::test]
async fn test_creation_options_shape() {
    let auth = memory_auth().await;
    let options = auth.initiate_ceremony("carol").await.unwrap();
    let json = serde_json::to_value(&options).unwrap();

    assert_eq!(json["type"], "create");
    assert_eq!(json["publicKey"]["rp"]["id"], RP_ID);
    assert_eq!(json["publicKey"]["user"]["name"], "carol");
    assert_eq!(json["publicKey"]["user"]["id"].as_str().unwrap().len(), 86);
    let algs: Vec<i64> = json["publicKey"]["pubKeyCredParams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["alg"].as_i64().unwrap())
        .collect();
    assert_eq!(algs, vec![-7, -35, -36]);
    assert_eq!(challenge_of(&options).len(), 43);
}

#[tokio::test]
async fn test_ceremony_is_single_use() {
    let auth = memory_auth().await;
    let authenticator = MockAuthenticator::new(b"credential-1", RP_ID, ORIGIN);
    let options = auth.initiate_ceremony("alice").await.unwrap();
    let response = authenticator.register(&options);

    auth.complete_registration(&options.authentication_id, &response, None)
        .await
        .unwrap();
    let replay = auth
        .complete_registration(&options.authentication_id, &response, None)
        .await;

    assert_eq!(passkey_error(replay), PasskeyError::CeremonyNotFound);
}

#[tokio::test]
async fn test_registration_checks() {
    let auth = memory_auth().await;

    // Wrong origin
    let authenticator = MockAuthenticator::new(b"c1", RP_ID, "https://evil.example.com");
    let options = auth.initiate_ceremony("alice").await.unwrap();
    let result = auth
        .complete_registration(&options.authentication_id, &authenticator.register(&options), None)
        .await;
    assert!(matches!(passkey_error(result), PasskeyError::OriginMismatch(_)));

    // Wrong relying party
    let authenticator = MockAuthenticator::new(b"c1", "evil.example.com", ORIGIN);
    let options = auth.initiate_ceremony("alice").await.unwrap();
    let result = auth
        .complete_registration(&options.authentication_id, &authenticator.register(&options), None)
        .await;
    assert_eq!(passkey_error(result), PasskeyError::RpIdMismatch);

    // Answer to a different challenge
    let authenticator = MockAuthenticator::new(b"c1", RP_ID, ORIGIN);
    let first = auth.initiate_ceremony("alice").await.unwrap();
    let second = auth.initiate_ceremony("alice").await.unwrap();
    let result = auth
        .complete_registration(&second.authentication_id, &authenticator.register(&first), None)
        .await;
    assert_eq!(passkey_error(result), PasskeyError::ChallengeMismatch);
}

#[tokio::test]
async fn test_attestation_statement_policy() {
    let auth = memory_auth().await;
    let authenticator = MockAuthenticator::new(b"c1", RP_ID, ORIGIN);

    let attempt = |fmt: &'static str, att_stmt: Value| {
        let auth = &auth;
        let authenticator = &authenticator;
        async move {
            let options = auth.initiate_ceremony("alice").await.unwrap();
            let client_data = authenticator.client_data("webauthn.create", &challenge_of(&options));
            let auth_data = authenticator.auth_data(FLAG_UP | FLAG_AT, true);
            let response = RegistrationResponse {
                client_data_json: b64(&client_data),
                attestation_object: b64(MockAuthenticator::attestation_object(
                    fmt, &auth_data, att_stmt,
                )),
            };
            auth.complete_registration(&options.authentication_id, &response, None)
                .await
        }
    };

    // Certificate chains are never accepted
    let x5c = Value::Map(vec![
        (Value::Text("alg".into()), Value::Integer((-7).into())),
        (Value::Text("sig".into()), Value::Bytes(vec![0x30, 0x00])),
        (
            Value::Text("x5c".into()),
            Value::Array(vec![Value::Bytes(vec![0x30, 0x82])]),
        ),
    ]);
    assert_eq!(
        passkey_error(attempt("packed", x5c).await),
        PasskeyError::CertificateChainUnsupported
    );

    // Formats other than packed are refused
    let result = attempt("fido-u2f", Value::Map(vec![])).await;
    assert!(matches!(passkey_error(result), PasskeyError::UnsupportedFormat(_)));

    // A self attestation with a garbage signature fails closed
    let forged = Value::Map(vec![
        (Value::Text("alg".into()), Value::Integer((-7).into())),
        (Value::Text("sig".into()), Value::Bytes(vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01])),
    ]);
    assert_eq!(
        passkey_error(attempt("packed", forged).await),
        PasskeyError::InvalidSignature
    );
}

#[tokio::test]
async fn test_tampered_assertion_is_rejected() {
    // Given a registered authenticator and a get ceremony
    let auth = memory_auth().await;
    let mut authenticator = MockAuthenticator::new(b"c1", RP_ID, ORIGIN);
    register(&auth, "alice", &authenticator).await;
    let options = auth.initiate_ceremony("alice").await.unwrap();

    // When the signature does not cover the presented data
    let mut response = authenticator.assert(&options, None);
    let other = authenticator.assert(&options, None);
    response.signature = other.signature;
    response.authenticator_data = b64(authenticator.auth_data(FLAG_UP, false));

    let result = auth
        .complete_assertion(
            &options.authentication_id,
            &authenticator.credential_id_b64(),
            &response,
            None,
        )
        .await;

    // Then verification fails
    assert_eq!(passkey_error(result), PasskeyError::InvalidSignature);
}

#[tokio::test]
async fn test_assertion_requires_user_presence() {
    let auth = memory_auth().await;
    let mut authenticator = MockAuthenticator::new(b"c1", RP_ID, ORIGIN);
    register(&auth, "alice", &authenticator).await;
    let options = auth.initiate_ceremony("alice").await.unwrap();

    authenticator.sign_count += 1;
    let client_data = authenticator.client_data("webauthn.get", &challenge_of(&options));
    let auth_data = authenticator.auth_data(0, false);
    let mut signed = auth_data.clone();
    signed.extend_from_slice(&sha256(&client_data));
    let response = modern_auth::AssertionResponse {
        client_data_json: b64(&client_data),
        authenticator_data: b64(&auth_data),
        signature: b64(authenticator.sign(&signed)),
        user_handle: None,
    };

    let result = auth
        .complete_assertion(
            &options.authentication_id,
            &authenticator.credential_id_b64(),
            &response,
            None,
        )
        .await;
    assert!(matches!(passkey_error(result), PasskeyError::Flags(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_single_byte_change_breaks_the_signature(
        message in proptest::collection::vec(any::<u8>(), 37..128),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let authenticator = MockAuthenticator::new(b"c1", RP_ID, ORIGIN);
        let key = decode_cose_key(&authenticator.cose_key()).unwrap();
        let client_data = authenticator.client_data("webauthn.get", "challenge");
        let signed = signature_base(&message, &client_data);
        let signature = authenticator.sign(&signed);
        prop_assert!(verify_signature(&key, &signature, &signed));

        let mut tampered = message.clone();
        let i = position.index(tampered.len());
        tampered[i] ^= flip;
        let tampered = signature_base(&tampered, &client_data);
        prop_assert!(!verify_signature(&key, &signature, &tampered));
    }

    #[test]
    fn prop_any_single_byte_change_rejects_the_registration(
        in_attestation in any::<bool>(),
        position in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(async {
            // Given a fresh create ceremony and the authenticator's genuine answer
            let auth = memory_auth().await;
            let authenticator = MockAuthenticator::new(b"credential-1", RP_ID, ORIGIN);
            let options = auth.initiate_ceremony("alice@example.com").await.unwrap();
            let response = authenticator.register(&options);

            // When one byte of either buffer is altered
            let field = if in_attestation {
                &response.attestation_object
            } else {
                &response.client_data_json
            };
            let mut bytes = URL_SAFE_NO_PAD.decode(field).unwrap();
            let i = position.index(bytes.len());
            bytes[i] ^= flip;
            let tampered = if in_attestation {
                RegistrationResponse {
                    attestation_object: b64(&bytes),
                    ..response
                }
            } else {
                RegistrationResponse {
                    client_data_json: b64(&bytes),
                    ..response
                }
            };

            auth.complete_registration(&options.authentication_id, &tampered, None)
                .await
        });

        // Then the ceremony fails
        prop_assert!(result.is_err());
    }
}
