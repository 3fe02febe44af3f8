//! Credential checks, sessions and account administration.

use crate::config::AuthConfig;
use crate::password::{
    hash_password_blocking, verify_against_dummy_blocking, verify_password_blocking,
};
use crate::token::{digest_matches, generate_token, token_digest};
use crate::utils::{is_valid_email, normalize_email};
use chrono::{DateTime, Utc};
use pharmacy_core::environment::Clock;
use pharmacy_core::repository::{Session, SessionRepository, UserRepository};
use pharmacy_core::user::{NewUser, Principal, Role, RoleUpdate, User, UserId, UserRecord};
use pharmacy_core::{PharmacyError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    /// Opaque bearer token; shown once, never stored
    pub token: String,
    /// When the session stops being accepted
    pub expires_at: DateTime<Utc>,
    /// The signed-in account
    pub user: User,
}

/// A session resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    /// Request-scoped caller identity
    pub principal: Principal,
    /// Current account row
    pub user: User,
    /// Session expiry
    pub expires_at: DateTime<Utc>,
}

/// User/session service.
#[derive(Clone)]
pub struct AuthService<R> {
    store: R,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl<R: UserRepository + SessionRepository> AuthService<R> {
    /// Create a service over the given store.
    pub fn new(store: R, clock: Arc<dyn Clock>, config: AuthConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Check an email/password pair and open a session.
    ///
    /// # Errors
    ///
    /// [`PharmacyError::InvalidCredentials`] for an unknown email and for a
    /// wrong password alike.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn> {
        let email = normalize_email(email);

        let Some(record) = self.store.find_user_by_email(&email).await? else {
            verify_against_dummy_blocking(password.to_string()).await?;
            metrics::counter!("pharmacy_logins_total", "outcome" => "failure").increment(1);
            tracing::info!("Sign-in rejected");
            return Err(PharmacyError::InvalidCredentials);
        };

        let matches =
            verify_password_blocking(password.to_string(), record.password_hash.clone()).await?;
        if !matches {
            metrics::counter!("pharmacy_logins_total", "outcome" => "failure").increment(1);
            tracing::info!("Sign-in rejected");
            return Err(PharmacyError::InvalidCredentials);
        }

        let token = generate_token();
        let now = self.clock.now();
        let session = Session {
            token_hash: token_digest(&token),
            user_id: record.user.id,
            created_at: now,
            expires_at: now + self.config.session_ttl,
        };
        self.store.create_session(&session).await?;

        metrics::counter!("pharmacy_logins_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = %record.user.id, role = %record.user.role, "Signed in");

        Ok(SignedIn {
            token,
            expires_at: session.expires_at,
            user: record.user,
        })
    }

    /// End the session behind `token`. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        self.store.delete_session(&token_digest(token)).await
    }

    /// Turn a bearer token into the caller's principal.
    ///
    /// The role is read from the account row, so role changes apply to
    /// existing sessions immediately. Expired sessions are deleted here.
    ///
    /// # Errors
    ///
    /// [`PharmacyError::Unauthorized`] for unknown or expired tokens, or a
    /// session whose account no longer exists.
    pub async fn resolve_session(&self, token: &str) -> Result<ResolvedSession> {
        let digest = token_digest(token);
        let session = self
            .store
            .find_session(&digest)
            .await?
            .filter(|session| digest_matches(token, &session.token_hash))
            .ok_or(PharmacyError::Unauthorized)?;

        if session.expires_at <= self.clock.now() {
            tracing::debug!(user_id = %session.user_id, "Session expired");
            self.store.delete_session(&digest).await?;
            return Err(PharmacyError::Unauthorized);
        }

        let Some(user) = self.store.get_user(session.user_id).await? else {
            self.store.delete_session(&digest).await?;
            return Err(PharmacyError::Unauthorized);
        };

        Ok(ResolvedSession {
            principal: Principal {
                user_id: user.id,
                role: user.role,
            },
            user,
            expires_at: session.expires_at,
        })
    }

    /// Create an account. Administrators only.
    ///
    /// # Errors
    ///
    /// - Caller is not an administrator → [`PharmacyError::Forbidden`]
    /// - See [`AuthService::register`]
    pub async fn create_user(&self, principal: &Principal, new_user: NewUser) -> Result<User> {
        principal.require_admin("Managing users")?;
        self.register(new_user).await
    }

    /// Create an account without a caller, for bootstrapping the first
    /// administrator from the command line.
    ///
    /// # Errors
    ///
    /// - Blank name, malformed email, short password or unknown role →
    ///   [`PharmacyError::InvalidInput`]
    /// - Email already used → [`PharmacyError::Conflict`]
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let name = new_user.name.trim().to_string();
        if name.is_empty() {
            return Err(PharmacyError::invalid("Name is required"));
        }

        let email = normalize_email(&new_user.email);
        if email.is_empty() {
            return Err(PharmacyError::invalid("Email is required"));
        }
        if !is_valid_email(&email) {
            return Err(PharmacyError::invalid(format!("Invalid email: {email}")));
        }

        if new_user.password.chars().count() < self.config.min_password_length {
            return Err(PharmacyError::invalid(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        let role = match new_user.role.as_deref().map(str::trim) {
            None | Some("") => Role::Sales,
            Some(raw) => raw.parse()?,
        };

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(PharmacyError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password_blocking(new_user.password).await?;
        let record = UserRecord {
            user: User {
                id: UserId::new(),
                name,
                email,
                role,
                created_at: self.clock.now(),
            },
            password_hash,
        };
        let user = self.store.insert_user(&record).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// All accounts, newest first. Administrators only.
    ///
    /// # Errors
    ///
    /// Caller is not an administrator → [`PharmacyError::Forbidden`].
    pub async fn list_users(&self, principal: &Principal) -> Result<Vec<User>> {
        principal.require_admin("Managing users")?;
        self.store.list_users().await
    }

    /// Change an account's role. Administrators only.
    ///
    /// # Errors
    ///
    /// - Caller is not an administrator → [`PharmacyError::Forbidden`]
    /// - Role outside the fixed set → [`PharmacyError::InvalidInput`]
    /// - Unknown account → [`PharmacyError::NotFound`]
    pub async fn set_role(&self, principal: &Principal, update: RoleUpdate) -> Result<User> {
        principal.require_admin("Managing users")?;

        let role: Role = update.role.trim().parse()?;
        let user = self.store.update_role(update.user_id, role).await?;

        tracing::info!(user_id = %user.id, role = %user.role, changed_by = %principal.user_id, "Role changed");
        Ok(user)
    }
}
