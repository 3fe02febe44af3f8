//! Opaque bearer tokens.
//!
//! A token is 256 random bits, base64url encoded (43 characters). Only its
//! SHA-256 digest is persisted, so a leaked sessions table cannot be
//! replayed.

use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure random token.
#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let mut random_bytes = [0u8; 32];
    rng.fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Hex SHA-256 digest of a token, as stored in the sessions table.
#[must_use]
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare a presented token against a stored digest in constant time.
#[must_use]
pub fn digest_matches(token: &str, stored_digest: &str) -> bool {
    constant_time_eq::constant_time_eq(token_digest(token).as_bytes(), stored_digest.as_bytes())
}
