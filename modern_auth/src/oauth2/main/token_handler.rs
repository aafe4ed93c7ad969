use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::oauth2::errors::OAuth2Error;
use crate::oauth2::types::Grant;
use crate::storage::{KeyValueStore, get_json, store_json, take_json};
use crate::utils::{base64_encode, gen_random_string, shake256};

pub(crate) const ACCESS_TOKEN_SIZE: usize = 48;
pub(crate) const REFRESH_TOKEN_SIZE: usize = 64;

/// Mints opaque tokens for grants and resolves them back.
#[async_trait]
pub trait TokenHandler: Send + Sync {
    /// Store `grant` under a fresh token and return the token. It is never retrievable again.
    async fn generate_token(&self, grant: &Grant) -> Result<String, OAuth2Error>;

    /// Resolve a token without consuming it.
    async fn validate(&self, token: &str) -> Result<Grant, OAuth2Error>;

    /// Resolve a token and invalidate it in the same step.
    async fn consume(&self, token: &str) -> Result<Grant, OAuth2Error>;
}

/// How long a stored token stays resolvable.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TokenLifetime {
    /// Until the grant expires
    Grant,
    Fixed(Duration),
}

/// Random bearer tokens whose SHAKE256 digest is the store key.
pub struct RandomTokenHandler {
    store: Arc<dyn KeyValueStore>,
    prefix: &'static str,
    size: usize,
    lifetime: TokenLifetime,
}

impl RandomTokenHandler {
    pub(crate) fn new(
        store: Arc<dyn KeyValueStore>,
        prefix: &'static str,
        size: usize,
        lifetime: TokenLifetime,
    ) -> Self {
        Self {
            store,
            prefix,
            size,
            lifetime,
        }
    }

    /// Store key for a raw token; only this digest is ever persisted.
    pub(crate) fn token_key(token: &str) -> String {
        base64_encode(shake256(token.as_bytes()))
    }

    fn expires_at(&self, grant: &Grant) -> DateTime<Utc> {
        match self.lifetime {
            TokenLifetime::Grant => grant.expires_at,
            TokenLifetime::Fixed(ttl) => Utc::now() + ttl,
        }
    }
}

#[async_trait]
impl TokenHandler for RandomTokenHandler {
    async fn generate_token(&self, grant: &Grant) -> Result<String, OAuth2Error> {
        let token = gen_random_string(self.size)?;
        let key = Self::token_key(&token);
        store_json(
            self.store.as_ref(),
            self.prefix,
            &key,
            grant,
            self.expires_at(grant),
        )
        .await?;

        tracing::debug!("Generated {} for grant {}", self.prefix, grant.id);
        Ok(token)
    }

    async fn validate(&self, token: &str) -> Result<Grant, OAuth2Error> {
        let key = Self::token_key(token);
        let grant: Grant = get_json(self.store.as_ref(), self.prefix, &key)
            .await?
            .ok_or(OAuth2Error::TokenNotFound)?;

        tracing::debug!("Validated {} for grant {}", self.prefix, grant.id);
        Ok(grant)
    }

    async fn consume(&self, token: &str) -> Result<Grant, OAuth2Error> {
        let key = Self::token_key(token);
        let grant: Grant = take_json(self.store.as_ref(), self.prefix, &key)
            .await?
            .ok_or(OAuth2Error::TokenNotFound)?;

        tracing::debug!("Consumed {} for grant {}", self.prefix, grant.id);
        Ok(grant)
    }
}
