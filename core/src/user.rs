//! Staff accounts, roles and the request-scoped principal.

use crate::error::{PharmacyError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Staff role. A fixed set; nothing else is ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access, including inventory management, analytics and accounts
    Admin,
    /// Sales plus read-only access elsewhere
    Sales,
}

impl Role {
    /// Database / wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Sales => "SALES",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PharmacyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "SALES" => Ok(Self::Sales),
            other => Err(PharmacyError::invalid(format!("Invalid role: {other}"))),
        }
    }
}

/// A staff account as exposed to callers. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Unique sign-in email
    pub email: String,
    /// Role
    pub role: Role,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A staff account as stored, including the one-way password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Public part
    pub user: User,
    /// PHC-format password hash
    pub password_hash: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("user", &self.user)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Request body for creating an account.
///
/// `role` is a string here so that an unknown value is reported as
/// `InvalidInput` rather than a generic body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Sign-in email
    pub email: String,
    /// Plaintext password; hashed before it reaches the store
    pub password: String,
    /// `ADMIN` or `SALES`; defaults to `SALES`
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for changing an account's role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoleUpdate {
    /// Account to change
    pub user_id: UserId,
    /// `ADMIN` or `SALES`
    pub role: String,
}

/// The authenticated caller of a request.
///
/// Built per request from the session and passed explicitly into every
/// service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Account behind the session
    pub user_id: UserId,
    /// Role at the time the session was resolved
    pub role: Role,
}

impl Principal {
    /// Returns `true` for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require the administrator role.
    ///
    /// # Errors
    ///
    /// Returns [`PharmacyError::Forbidden`] naming the attempted action.
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(PharmacyError::Forbidden(format!(
                "{action} requires the ADMIN role"
            )))
        }
    }
}
