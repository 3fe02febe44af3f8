//! Authentication configuration.

use chrono::Duration;

/// Minimum password length accepted when creating an account.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Session and credential settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How long a session stays valid after sign-in.
    ///
    /// Default: 24 hours
    pub session_ttl: Duration,

    /// Shortest acceptable password, in characters.
    ///
    /// Default: [`MIN_PASSWORD_LENGTH`]
    pub min_password_length: usize,
}

impl AuthConfig {
    /// Create configuration with the given session lifetime.
    #[must_use]
    pub const fn new(session_ttl: Duration) -> Self {
        Self {
            session_ttl,
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }

    /// Set session lifetime.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}
