use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::errors::RepositoryError;

/// Lifecycle state shared by users and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Revoked,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            _ => Err(RepositoryError::InvalidData(format!("unknown status: {s}"))),
        }
    }
}

/// A subject known only by the digest of the identifier it registered with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// SHAKE256 of the caller supplied identifier
    pub user_handle: Vec<u8>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(user_handle: Vec<u8>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_handle,
            status: Status::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// A registered public-key credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub credential_id: Vec<u8>,
    pub public_key_cose: Vec<u8>,
    pub owner_user_id: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(credential_id: Vec<u8>, public_key_cose: Vec<u8>, owner_user_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            credential_id,
            public_key_cose,
            owner_user_id: owner_user_id.to_string(),
            status: Status::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}
