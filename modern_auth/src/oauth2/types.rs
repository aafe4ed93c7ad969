use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::form_urlencoded;

use super::errors::{TokenError, TokenErrorType};

/// A registered OAuth2 client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub scopes: Vec<String>,
    pub redirect_uris: Vec<String>,
}

impl Client {
    /// Keep only the requested scopes this client may use, in request order.
    pub fn restrict_scopes(&self, requested: &str) -> String {
        requested
            .split_whitespace()
            .filter(|scope| self.scopes.iter().any(|allowed| allowed == scope))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn validate_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }

    pub fn default_redirect_uri(&self) -> Option<&str> {
        self.redirect_uris.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    S256,
    #[serde(rename = "plain")]
    Plain,
}

impl CodeChallengeMethod {
    /// An absent method means S256.
    pub(crate) fn parse(method: Option<&str>) -> Option<Self> {
        match method.unwrap_or_default() {
            "" | "S256" => Some(Self::S256),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

/// Parameters of an authorization endpoint call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthorizeRequest {
    pub client_id: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code_challenge: Option<String>,
    #[serde(default)]
    pub code_challenge_method: Option<String>,
}

impl AuthorizeRequest {
    /// Read the request from a query string such as `client_id=a&scope=openid`.
    pub fn from_query(query: &str) -> Self {
        let params: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        let get = |k: &str| params.get(k).filter(|v| !v.is_empty()).cloned();

        Self {
            client_id: get("client_id").unwrap_or_default(),
            redirect_uri: get("redirect_uri"),
            scope: get("scope").unwrap_or_default(),
            state: get("state").unwrap_or_default(),
            code_challenge: get("code_challenge"),
            code_challenge_method: get("code_challenge_method"),
        }
    }
}

/// A pending authorization, stored under its authorization id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub id: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
    pub code_challenge: Option<String>,
    pub code_method: Option<CodeChallengeMethod>,
    pub created_at: DateTime<Utc>,
}

/// What an authorization code redeems to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct IssuedCode {
    pub(crate) request: AuthorizationRequest,
    pub(crate) subject_id: String,
}

/// Server-side record of the continuation verifier for one authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct AuthenticationVerifier {
    /// base64url of SHAKE256(SHAKE256(v))
    pub(crate) hash: String,
    pub(crate) subject_id: String,
}

/// An authorized session backing a pair of tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub client_id: String,
    pub subject_id: String,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub allow_refresh: bool,
}

/// Token endpoint request, one variant per supported grant type.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenRequest {
    AuthorizationCode {
        client_id: String,
        code: String,
        redirect_uri: String,
        code_verifier: Option<String>,
    },
    RefreshToken {
        client_id: String,
        refresh_token: String,
    },
}

impl TokenRequest {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            Self::AuthorizationCode { client_id, .. } | Self::RefreshToken { client_id, .. } => {
                client_id
            }
        }
    }

    /// Parse an `application/x-www-form-urlencoded` token request body.
    pub fn from_form(body: &str) -> Result<Self, TokenError> {
        let params: HashMap<String, String> = form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();
        let optional = |k: &str| params.get(k).filter(|v| !v.is_empty()).cloned();
        let required = |k: &str| {
            optional(k).ok_or_else(|| {
                TokenError::new(
                    TokenErrorType::InvalidRequest,
                    format!("missing parameter: {k}"),
                )
            })
        };

        let grant_type = required("grant_type")?;
        match grant_type.as_str() {
            "authorization_code" => Ok(Self::AuthorizationCode {
                client_id: required("client_id")?,
                code: required("code")?,
                redirect_uri: optional("redirect_uri").unwrap_or_default(),
                code_verifier: optional("code_verifier"),
            }),
            "refresh_token" => Ok(Self::RefreshToken {
                client_id: required("client_id")?,
                refresh_token: required("refresh_token")?,
            }),
            _ => Err(TokenError::new(
                TokenErrorType::UnsupportedGrantType,
                "grant type not supported",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub refresh_token: Option<String>,
}
