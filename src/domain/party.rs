//! Authorized parties and their roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time;

/// Roles a registered party can hold. The three mirror parties reuse the
/// same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Lab,
    Auditor,
    Government,
}

impl PartyRole {
    /// All roles, in mirror-party order.
    pub fn all() -> [PartyRole; 3] {
        [PartyRole::Lab, PartyRole::Auditor, PartyRole::Government]
    }
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PartyRole::Lab => "lab",
            PartyRole::Auditor => "auditor",
            PartyRole::Government => "government",
        };
        write!(f, "{name}")
    }
}

/// A registered party as held in the auth store.
///
/// Only the SHA-256 of the API key is kept; the raw key is returned exactly
/// once at issuance or rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub party_id: String,
    pub name: String,
    pub role: PartyRole,
    /// Lowercase hex SHA-256 of the raw API key.
    pub key_hash: String,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Party {
    /// Public projection without the key hash.
    pub fn to_public(&self) -> PartyInfo {
        PartyInfo {
            party_id: self.party_id.clone(),
            name: self.name.clone(),
            role: self.role,
            created_at: self.created_at,
            revoked: self.revoked,
        }
    }
}

/// Party view exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyInfo {
    pub party_id: String,
    pub name: String,
    pub role: PartyRole,
    #[serde(with = "time::ts_seconds")]
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}
