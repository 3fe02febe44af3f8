//! One-way password hashing.
//!
//! Passwords are stored as argon2id PHC strings (salted, memory-hard). The
//! plaintext never leaves this module.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pharmacy_core::{PharmacyError, Result};
use std::sync::OnceLock;

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns [`PharmacyError::Internal`] if the hasher rejects its input.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PharmacyError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored PHC string.
///
/// An unparseable stored hash never matches.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash checked when an email matches no account, so an unknown email costs
/// the same argon2 work as a wrong password.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("no account has this password").ok())
        .as_deref()
}

/// Spend one full verification on the dummy hash; the outcome is discarded.
pub fn verify_against_dummy(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

/// [`hash_password`] on the blocking pool.
///
/// # Errors
///
/// Hashing failures, or the blocking task being cancelled.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PharmacyError::Internal(format!("password hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking pool.
///
/// # Errors
///
/// Only if the blocking task is cancelled.
pub async fn verify_password_blocking(password: String, stored_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| PharmacyError::Internal(format!("password verification task failed: {e}")))
}

/// [`verify_against_dummy`] on the blocking pool.
///
/// # Errors
///
/// Only if the blocking task is cancelled.
pub async fn verify_against_dummy_blocking(password: String) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        verify_against_dummy(&password);
    })
    .await
    .map_err(|e| PharmacyError::Internal(format!("password verification task failed: {e}")))
}
