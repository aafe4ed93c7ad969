use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ConfigError, env_or, env_parse};

/// COSE algorithm identifiers offered to authenticators.
pub(crate) const ES256: i64 = -7;
pub(crate) const ES384: i64 = -35;
pub(crate) const ES512: i64 = -36;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationPreference {
    None,
    Direct,
    Indirect,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    Required,
    Preferred,
    Discouraged,
}

/// Relying-party settings used to issue and verify ceremonies.
#[derive(Debug, Clone, PartialEq)]
pub struct PasskeyConfig {
    pub origin: String,
    pub rp_id: String,
    pub rp_name: String,
    /// Client-side ceremony timeout, in seconds
    pub timeout: u32,
    /// Lifetime of a stored ceremony, in seconds
    pub challenge_timeout: i64,
    pub attestation: AttestationPreference,
    pub user_verification: UserVerification,
    pub allowed_algorithms: Vec<i64>,
}

impl PasskeyConfig {
    /// Defaults derived from `origin`: the RP ID is its host, the RP name the origin itself.
    pub fn new(origin: &str) -> Result<Self, ConfigError> {
        let origin = origin.trim_end_matches('/').to_string();
        let rp_id = rp_id_from_origin(&origin)?;
        Ok(Self {
            rp_name: origin.clone(),
            origin,
            rp_id,
            timeout: 60,
            challenge_timeout: 60,
            attestation: AttestationPreference::Direct,
            user_verification: UserVerification::Preferred,
            allowed_algorithms: vec![ES256, ES384, ES512],
        })
    }

    pub(crate) fn from_env(origin: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new(origin)?;

        if let Some(rp_id) = env_or("PASSKEY_RP_ID") {
            config.rp_id = rp_id;
        }
        if let Some(rp_name) = env_or("PASSKEY_RP_NAME") {
            config.rp_name = rp_name;
        }
        config.timeout = env_parse("PASSKEY_TIMEOUT", config.timeout);
        config.challenge_timeout = env_parse("PASSKEY_CHALLENGE_TIMEOUT", config.challenge_timeout);

        if let Some(v) = env_or("PASSKEY_ATTESTATION") {
            config.attestation = match v.to_lowercase().as_str() {
                "none" => AttestationPreference::None,
                "direct" => AttestationPreference::Direct,
                "indirect" => AttestationPreference::Indirect,
                "enterprise" => AttestationPreference::Enterprise,
                invalid => {
                    tracing::warn!("Invalid attestation: {}. Using default 'direct'", invalid);
                    AttestationPreference::Direct
                }
            };
        }

        if let Some(v) = env_or("PASSKEY_USER_VERIFICATION") {
            config.user_verification = match v.to_lowercase().as_str() {
                "required" => UserVerification::Required,
                "preferred" => UserVerification::Preferred,
                "discouraged" => UserVerification::Discouraged,
                invalid => {
                    tracing::warn!(
                        "Invalid user verification: {}. Using default 'preferred'",
                        invalid
                    );
                    UserVerification::Preferred
                }
            };
        }

        Ok(config)
    }
}

fn rp_id_from_origin(origin: &str) -> Result<String, ConfigError> {
    let url = Url::parse(origin)
        .map_err(|e| ConfigError::Invalid(format!("ORIGIN is not a valid URL: {e}")))?;
    url.host_str()
        .map(|h| h.to_string())
        .ok_or_else(|| ConfigError::Invalid("Could not extract RP ID from ORIGIN".to_string()))
}
