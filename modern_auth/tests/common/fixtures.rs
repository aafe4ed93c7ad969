use std::sync::Arc;

use modern_auth::{
    AuthConfig, AuthorizeRequest, Client, ClientRepository, InMemoryKeyValueStore,
    InMemoryRepository, ModernAuth, StorageConfig, StoreBackend,
};

use super::constants::{ORIGIN, client};

pub fn test_client() -> Client {
    Client {
        id: client::ID.to_string(),
        scopes: client::SCOPES.iter().map(|s| s.to_string()).collect(),
        redirect_uris: vec![
            client::REDIRECT_URI.to_string(),
            client::SECOND_REDIRECT_URI.to_string(),
        ],
    }
}

/// Service on in-memory stores with the test client registered.
pub async fn memory_auth() -> ModernAuth {
    let repo = Arc::new(InMemoryRepository::new());
    let auth = ModernAuth::new(
        AuthConfig::new(ORIGIN).expect("valid origin"),
        Arc::new(InMemoryKeyValueStore::new()),
        repo.clone(),
        repo.clone(),
        repo,
    );
    auth.clients()
        .save_client(test_client())
        .await
        .expect("client seeding failed");
    auth
}

/// Service on in-memory SQLite databases with the test client registered.
pub async fn sqlite_auth() -> ModernAuth {
    let mut config = AuthConfig::new(ORIGIN).expect("valid origin");
    config.storage = StorageConfig {
        cache_store_type: StoreBackend::Sqlite,
        cache_store_url: "sqlite::memory:".to_string(),
        data_store_type: StoreBackend::Sqlite,
        data_store_url: "sqlite::memory:".to_string(),
        table_prefix: "it_".to_string(),
    };
    let auth = ModernAuth::from_config(config)
        .await
        .expect("sqlite service failed to start");
    auth.clients()
        .save_client(test_client())
        .await
        .expect("client seeding failed");
    auth
}

/// Both backends, for tests that must behave identically on each.
pub async fn all_backends() -> Vec<(&'static str, ModernAuth)> {
    vec![("memory", memory_auth().await), ("sqlite", sqlite_auth().await)]
}

pub fn authorize_request(redirect_uri: Option<&str>, state: &str) -> AuthorizeRequest {
    AuthorizeRequest {
        client_id: client::ID.to_string(),
        redirect_uri: redirect_uri.map(str::to_string),
        scope: "openid profile".to_string(),
        state: state.to_string(),
        ..Default::default()
    }
}

pub fn code_form(code: &str, redirect_uri: &str, verifier: Option<&str>) -> String {
    let mut form = url_encode(&[
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", client::ID),
        ("redirect_uri", redirect_uri),
    ]);
    if let Some(verifier) = verifier {
        form.push('&');
        form.push_str(&url_encode(&[("code_verifier", verifier)]));
    }
    form
}

pub fn refresh_form(refresh_token: &str) -> String {
    url_encode(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", client::ID),
    ])
}

fn url_encode(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish()
}
