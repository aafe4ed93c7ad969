use crate::config::{env_or, env_parse};

/// Lifetimes and issuer identity of the authorization server.
///
/// All durations are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuth2Config {
    pub issuer: String,
    pub authorization_timeout: i64,
    pub code_timeout: i64,
    pub access_token_ttl: i64,
    pub refresh_token_ttl: i64,
}

impl OAuth2Config {
    pub fn new(issuer: &str) -> Self {
        Self {
            issuer: issuer.trim_end_matches('/').to_string(),
            authorization_timeout: 600,
            code_timeout: 60,
            access_token_ttl: 3600,
            refresh_token_ttl: 30 * 24 * 3600,
        }
    }

    pub(crate) fn from_env(origin: &str) -> Self {
        let issuer = env_or("OAUTH2_ISSUER").unwrap_or_else(|| origin.to_string());
        let defaults = Self::new(&issuer);
        Self {
            authorization_timeout: env_parse(
                "OAUTH2_AUTHORIZATION_TIMEOUT",
                defaults.authorization_timeout,
            ),
            code_timeout: env_parse("OAUTH2_CODE_TIMEOUT", defaults.code_timeout),
            access_token_ttl: env_parse("OAUTH2_ACCESS_TOKEN_TTL", defaults.access_token_ttl),
            refresh_token_ttl: env_parse("OAUTH2_REFRESH_TOKEN_TTL", defaults.refresh_token_ttl),
            ..defaults
        }
    }
}
