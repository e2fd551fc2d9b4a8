use crate::storage::{Record, Table};
use crate::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Back-office staff.
    Admin,
    /// Self-registered site user.
    Customer,
}

/// A sign-in identity.
///
/// Keyed by the normalized (trimmed, lowercased) email, which makes the
/// uniqueness check part of the insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub email: String,
    pub role: Role,
    pub password_salt: [u8; 16],
    pub password_hash: [u8; 32],
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Record for Account {
    const TABLE: Table = Table::Accounts;

    fn key(&self) -> String {
        self.email.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Access,
    Refresh,
}

/// One issued bearer token. Only the token digest is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Hex blake3 digest of the token.
    pub digest: String,
    /// Digest of the other half of the access/refresh pair.
    pub pair_digest: String,
    pub account_id: u64,
    pub kind: SessionKind,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Session {
    /// Usable at `now`. Ended sessions have no row at all.
    #[must_use]
    pub fn is_live(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

impl Record for Session {
    const TABLE: Table = Table::Sessions;

    fn key(&self) -> String {
        self.digest.clone()
    }
}
