use modern_auth::{AuthorizationErrorType, ModernAuth, TokenErrorType};

use crate::common::authenticator::{b64, sha256};
use crate::common::constants::{ORIGIN, RP_ID, client};
use crate::common::{
    MockAuthenticator, all_backends, authorize_request, code_form, memory_auth, refresh_form,
};

/// Run a registration bound to `authorization_id` and return the continuation verifier.
async fn authenticate(auth: &ModernAuth, authorization_id: &str, identifier: &str) -> String {
    let authenticator = MockAuthenticator::new(identifier.as_bytes(), RP_ID, ORIGIN);
    let options = auth.initiate_ceremony(identifier).await.unwrap();
    let result = auth
        .complete_registration(
            &options.authentication_id,
            &authenticator.register(&options),
            Some(authorization_id),
        )
        .await
        .unwrap();
    result.authentication_verifier.unwrap()
}

#[tokio::test]
async fn test_authorization_code_exchange_on_every_backend() {
    for (backend, auth) in all_backends().await {
        // Given an authorization for the client
        let authorization_id = auth
            .authorize(authorize_request(Some(client::REDIRECT_URI), "xyz"))
            .await
            .unwrap();
        let verifier = authenticate(&auth, &authorization_id, "alice").await;

        // When the verifier is echoed back
        let response = auth
            .verify_authentication(&authorization_id, &verifier)
            .await
            .unwrap();

        // Then the redirect carries the code, the state and the issuer
        let uri = response.build_response_uri();
        assert!(
            uri.starts_with(&format!("https://cb?code={}&state=xyz&iss=", response.code)),
            "{backend}: {uri}"
        );
        assert!(uri.ends_with("iss=https%3A%2F%2Flogin.example.com"), "{backend}: {uri}");

        // And the code buys an hour-long bearer token
        let tokens = auth
            .token(&code_form(&response.code, client::REDIRECT_URI, None))
            .await
            .unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert!((3590..=3600).contains(&tokens.expires_in), "{backend}");
        assert_eq!(tokens.scope, "openid profile");
        let grant = auth.validate_token(&tokens.access_token).await.unwrap();
        assert_eq!(grant.client_id, client::ID);
    }
}

#[tokio::test]
async fn test_missing_redirect_uri_defaults_to_first_registered() {
    let auth = memory_auth().await;
    let authorization_id = auth.authorize(authorize_request(None, "s1")).await.unwrap();
    let verifier = authenticate(&auth, &authorization_id, "alice").await;

    let response = auth
        .verify_authentication(&authorization_id, &verifier)
        .await
        .unwrap();

    assert_eq!(response.redirect_uri, client::REDIRECT_URI);
    assert!(
        auth.token(&code_form(&response.code, client::REDIRECT_URI, None))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_second_registered_redirect_uri() {
    let auth = memory_auth().await;
    let authorization_id = auth
        .authorize(authorize_request(Some(client::SECOND_REDIRECT_URI), "s1"))
        .await
        .unwrap();
    let verifier = authenticate(&auth, &authorization_id, "alice").await;
    let response = auth
        .verify_authentication(&authorization_id, &verifier)
        .await
        .unwrap();

    // Redeeming against the other registered uri is refused
    let err = auth
        .token(&code_form(&response.code, client::REDIRECT_URI, None))
        .await
        .unwrap_err();
    assert_eq!(err.error, TokenErrorType::InvalidGrant);
}

#[tokio::test]
async fn test_authorize_errors_redirect() {
    let auth = memory_auth().await;

    // Unknown client
    let mut request = authorize_request(Some(client::REDIRECT_URI), "xyz");
    request.client_id = "unknown-client".to_string();
    let err = auth.authorize(request).await.unwrap_err();
    assert_eq!(err.error_type, AuthorizationErrorType::InvalidClient);
    let uri = err.build_response_uri();
    assert!(uri.contains("error=invalid_client"));
    assert!(uri.contains("state=xyz"));

    // Unregistered redirect
    let err = auth
        .authorize(authorize_request(Some("https://evil.example.com/cb"), "xyz"))
        .await
        .unwrap_err();
    assert_eq!(err.error_type, AuthorizationErrorType::InvalidRequest);
    assert!(!err.build_response_uri().contains("evil"));
}

#[tokio::test]
async fn test_verifier_mismatch_abandons_authorization() {
    // Given an authorization with an issued verifier
    let auth = memory_auth().await;
    let authorization_id = auth
        .authorize(authorize_request(Some(client::REDIRECT_URI), "xyz"))
        .await
        .unwrap();
    let verifier = authenticate(&auth, &authorization_id, "alice").await;

    // When a different verifier is presented
    let err = auth
        .verify_authentication(&authorization_id, &b64([7u8; 64]))
        .await
        .unwrap_err();

    // Then the client is told and the request cannot be completed any more
    assert_eq!(err.error_type, AuthorizationErrorType::Unauthenticated);
    assert!(err.build_response_uri().starts_with("https://cb?error=unauthenticated"));
    let err = auth
        .verify_authentication(&authorization_id, &verifier)
        .await
        .unwrap_err();
    assert_eq!(err.error_type, AuthorizationErrorType::ServerError);
}

#[tokio::test]
async fn test_malformed_verifier_is_bad_request() {
    let auth = memory_auth().await;
    let authorization_id = auth.authorize(authorize_request(None, "xyz")).await.unwrap();
    authenticate(&auth, &authorization_id, "alice").await;

    let err = auth
        .verify_authentication(&authorization_id, "not*base64")
        .await
        .unwrap_err();
    assert_eq!(err.error_type, AuthorizationErrorType::BadRequest);
}

#[tokio::test]
async fn test_unknown_authorization_is_server_error() {
    let auth = memory_auth().await;
    let err = auth
        .verify_authentication("00000000-0000-4000-8000-000000000000", "AAAA")
        .await
        .unwrap_err();
    assert_eq!(err.error_type, AuthorizationErrorType::ServerError);
}

#[tokio::test]
async fn test_code_cannot_be_replayed() {
    let auth = memory_auth().await;
    let authorization_id = auth.authorize(authorize_request(None, "xyz")).await.unwrap();
    let verifier = authenticate(&auth, &authorization_id, "alice").await;
    let code = auth
        .verify_authentication(&authorization_id, &verifier)
        .await
        .unwrap()
        .code;

    let form = code_form(&code, client::REDIRECT_URI, None);
    auth.token(&form).await.unwrap();
    let err = auth.token(&form).await.unwrap_err();

    assert_eq!(err.error, TokenErrorType::InvalidGrant);
}

#[tokio::test]
async fn test_pkce_s256() {
    let auth = memory_auth().await;
    let code_verifier = "a-long-enough-code-verifier-with-43-characters-or-more";
    let issue_code = |challenge: String| {
        let auth = &auth;
        async move {
            let mut request = authorize_request(None, "xyz");
            request.code_challenge = Some(challenge);
            request.code_challenge_method = Some("S256".to_string());
            let authorization_id = auth.authorize(request).await.unwrap();
            let verifier = authenticate(auth, &authorization_id, &authorization_id).await;
            auth.verify_authentication(&authorization_id, &verifier)
                .await
                .unwrap()
                .code
        }
    };
    let challenge = b64(sha256(code_verifier.as_bytes()));

    // The matching verifier is accepted
    let code = issue_code(challenge.clone()).await;
    assert!(
        auth.token(&code_form(&code, client::REDIRECT_URI, Some(code_verifier)))
            .await
            .is_ok()
    );

    // A different or missing verifier is not
    let code = issue_code(challenge.clone()).await;
    let err = auth
        .token(&code_form(&code, client::REDIRECT_URI, Some("another-verifier")))
        .await
        .unwrap_err();
    assert_eq!(err.error, TokenErrorType::InvalidGrant);

    let code = issue_code(challenge).await;
    let err = auth
        .token(&code_form(&code, client::REDIRECT_URI, None))
        .await
        .unwrap_err();
    assert_eq!(err.error, TokenErrorType::InvalidGrant);
}

#[tokio::test]
async fn test_token_endpoint_errors() {
    let auth = memory_auth().await;

    let err = auth.token(&refresh_form("garbage")).await.unwrap_err();
    let body = serde_json::to_value(&err).unwrap();
    assert_eq!(body["error"], "invalid_grant");

    let err = auth
        .token("grant_type=password&username=a&password=b&client_id=client1")
        .await
        .unwrap_err();
    assert_eq!(err.error, TokenErrorType::UnsupportedGrantType);

    let err = auth.token("grant_type=authorization_code").await.unwrap_err();
    assert_eq!(err.error, TokenErrorType::InvalidRequest);
}
