use modern_auth::{CoordinationError, TokenErrorType};

use crate::common::constants::{ORIGIN, RP_ID, client};
use crate::common::{
    MockAuthenticator, all_backends, authorize_request, code_form, refresh_form,
};

#[tokio::test]
async fn test_login_with_existing_passkey_then_refresh_once() {
    for (backend, auth) in all_backends().await {
        // Given a user who registered earlier
        let mut authenticator = MockAuthenticator::new(b"credential-1", RP_ID, ORIGIN);
        let options = auth.initiate_ceremony("alice").await.unwrap();
        auth.complete_registration(&options.authentication_id, &authenticator.register(&options), None)
            .await
            .unwrap();

        // When a client authorization is completed with an assertion
        let authorization_id = auth
            .authorize(authorize_request(Some(client::REDIRECT_URI), "state-1"))
            .await
            .unwrap();
        let options = auth.initiate_ceremony("alice").await.unwrap();
        let response = authenticator.assert(&options, None);
        let result = auth
            .complete_assertion(
                &options.authentication_id,
                &authenticator.credential_id_b64(),
                &response,
                Some(&authorization_id),
            )
            .await
            .unwrap();
        let subject = auth
            .validate_token(&result.tokens.access_token)
            .await
            .unwrap()
            .subject_id;

        let response = auth
            .verify_authentication(&authorization_id, &result.authentication_verifier.unwrap())
            .await
            .unwrap();
        assert_eq!(response.state, "state-1");

        // Then the code yields tokens for that user
        let tokens = auth
            .token(&code_form(&response.code, client::REDIRECT_URI, None))
            .await
            .unwrap();
        let grant = auth
            .validate_authorization_header(&format!("Bearer {}", tokens.access_token))
            .await
            .unwrap();
        assert_eq!(grant.subject_id, subject, "{backend}");

        // And the refresh token works exactly once, without chaining
        let refresh_token = tokens.refresh_token.unwrap();
        let refreshed = auth.token(&refresh_form(&refresh_token)).await.unwrap();
        assert!(refreshed.refresh_token.is_none(), "{backend}");
        let refreshed_grant = auth.validate_token(&refreshed.access_token).await.unwrap();
        assert_eq!(refreshed_grant.subject_id, subject);
        assert_eq!(refreshed_grant.scope, grant.scope);
        assert!(!refreshed_grant.allow_refresh);

        let err = auth.token(&refresh_form(&refresh_token)).await.unwrap_err();
        assert_eq!(err.error, TokenErrorType::InvalidGrant, "{backend}");
    }
}

#[tokio::test]
async fn test_assertion_cannot_use_someone_elses_ceremony() {
    for (backend, auth) in all_backends().await {
        // Given two users with their own authenticators
        let mut alice = MockAuthenticator::new(b"alice-key", RP_ID, ORIGIN);
        let bob = MockAuthenticator::new(b"bob-key", RP_ID, ORIGIN);
        for (identifier, authenticator) in [("alice", &alice), ("bob", &bob)] {
            let options = auth.initiate_ceremony(identifier).await.unwrap();
            auth.complete_registration(
                &options.authentication_id,
                &authenticator.register(&options),
                None,
            )
            .await
            .unwrap();
        }

        // When alice answers a ceremony issued for bob
        let options = auth.initiate_ceremony("bob").await.unwrap();
        let response = alice.assert(&options, None);
        let result = auth
            .complete_assertion(
                &options.authentication_id,
                &alice.credential_id_b64(),
                &response,
                None,
            )
            .await;

        // Then her credential is not on the allow list
        assert!(
            matches!(result, Err(CoordinationError::PasskeyError(_))),
            "{backend}: {result:?}"
        );
    }
}

#[tokio::test]
async fn test_registered_identifier_is_stored_only_as_digest() {
    let auth = crate::common::memory_auth().await;
    let authenticator = MockAuthenticator::new(b"credential-1", RP_ID, ORIGIN);
    let options = auth.initiate_ceremony("alice@example.com").await.unwrap();
    let json = serde_json::to_string(&options).unwrap();

    // The user id handed to the authenticator is the 64-byte digest, not the identifier
    assert!(json.contains("\"name\":\"alice@example.com\""));
    assert!(!json.contains("\"id\":\"alice@example.com\""));

    auth.complete_registration(&options.authentication_id, &authenticator.register(&options), None)
        .await
        .unwrap();
    let again = auth.initiate_ceremony("alice@example.com").await.unwrap();
    assert_eq!(again.kind(), modern_auth::CeremonyKind::Get);
}
