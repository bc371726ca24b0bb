//! Authenticated identities
//!
//! Customers authenticate with bearer tokens and admins with server-side
//! sessions. Both resolve to the same `Identity` so handlers never need to
//! know which mechanism was used.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

/// Caller identity attached to a request by the auth middlewares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub role: Role,
    pub subject: Uuid,
}

impl Identity {
    pub fn customer(subject: Uuid) -> Self {
        Self {
            role: Role::Customer,
            subject,
        }
    }

    pub fn admin(subject: Uuid) -> Self {
        Self {
            role: Role::Admin,
            subject,
        }
    }
}

/// Back-office operator
#[derive(Debug, Clone, PartialEq)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AdminUser> for AdminProfile {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            created_at: admin.created_at,
        }
    }
}

/// Server-side admin session. Only the SHA-256 of the session token is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession {
    pub token_hash: String,
    pub admin_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
