//! Core type definitions shared across the ledger core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User identifier (buyers, sellers and admins share one id space)
pub type UserId = i64;

/// Order identifier (BIGSERIAL in PostgreSQL)
pub type OrderId = i64;

/// Product identifier
pub type ProductId = i64;

/// Ledger transaction row identifier
pub type TxId = i64;

/// Well-known row id of the admin clearing account singleton
pub const ADMIN_ACCOUNT_ID: i64 = 1;

/// Account addressed by a ledger mutation.
///
/// Every balance in the system is either a per-user wallet or the single
/// admin clearing account. All mutations are keyed by this type so the
/// ledger primitive can treat both uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum AccountId {
    Wallet(UserId),
    Admin,
}

impl AccountId {
    /// Numeric account kind for SMALLINT storage
    #[inline]
    pub fn kind_id(&self) -> i16 {
        match self {
            AccountId::Wallet(_) => 1,
            AccountId::Admin => 2,
        }
    }

    /// Wallet owner, if this is a wallet account
    #[inline]
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            AccountId::Wallet(uid) => Some(*uid),
            AccountId::Admin => None,
        }
    }

    /// Reconstruct from storage columns
    pub fn from_parts(kind: i16, user_id: Option<UserId>) -> Option<Self> {
        match (kind, user_id) {
            (1, Some(uid)) => Some(AccountId::Wallet(uid)),
            (2, _) => Some(AccountId::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::Wallet(uid) => write!(f, "wallet:{}", uid),
            AccountId::Admin => write!(f, "admin"),
        }
    }
}

/// Caller role supplied by the authentication collaborator.
///
/// The core trusts this context and does not re-derive it (auth/session
/// management is an external concern).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Caller identity + role for every state-machine entry point
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: UserId,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
