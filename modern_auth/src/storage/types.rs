use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Namespaces used by the services sharing one key-value store.
pub(crate) mod prefix {
    pub(crate) const CEREMONY: &str = "ceremony";
    pub(crate) const AUTHORIZATION: &str = "authorization";
    pub(crate) const AUTH_VERIFIER: &str = "auth_verifier";
    pub(crate) const CODE: &str = "code";
    pub(crate) const ACCESS_TOKEN: &str = "access_token";
    pub(crate) const REFRESH_TOKEN: &str = "refresh_token";
}

/// Data stored in the key-value store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheData {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheData {
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Seconds left before expiry, never below one.
    pub(crate) fn ttl_secs(&self) -> u64 {
        (self.expires_at - Utc::now()).num_seconds().max(1) as u64
    }
}
