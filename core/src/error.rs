//! Error taxonomy shared by every layer of the pharmacy service.

use thiserror::Error;

/// Result type alias for pharmacy operations.
pub type Result<T> = std::result::Result<T, PharmacyError>;

/// Every failure a pharmacy operation can report.
///
/// None of these are retried automatically. The HTTP layer maps each
/// variant to a status code; `Internal` details are logged, never returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PharmacyError {
    // ═══════════════════════════════════════════════════════════
    // Caller Errors
    // ═══════════════════════════════════════════════════════════

    /// Malformed or out-of-range input.
    #[error("{0}")]
    InvalidInput(String),

    /// A referenced record does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Kind of record ("Drug", "User", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A unique key is already taken.
    #[error("{0}")]
    Conflict(String),

    /// A sale asked for more units than are on hand.
    #[error("Insufficient stock for {drug_name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        /// Name of the drug at the time of the check
        drug_name: String,
        /// Units on hand
        available: i64,
        /// Units requested (cumulative across lines for the same drug)
        requested: i64,
    },

    // ═══════════════════════════════════════════════════════════
    // Access Errors
    // ═══════════════════════════════════════════════════════════

    /// Email/password pair did not match. Deliberately says nothing about which part failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No valid session accompanied the request.
    #[error("Authentication required")]
    Unauthorized,

    /// The session's role may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Unexpected store or connection failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PharmacyError {
    /// Shorthand for [`PharmacyError::InvalidInput`].
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Shorthand for [`PharmacyError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns `true` if the caller can fix the request and try again.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pharmacy_core::PharmacyError;
    /// assert!(PharmacyError::invalid("empty sale").is_user_error());
    /// assert!(!PharmacyError::Internal("pool closed".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::NotFound { .. }
                | Self::Conflict(_)
                | Self::InsufficientStock { .. }
        )
    }

    /// Short reason label, used for metric labels and log fields.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Internal(_) => "internal",
        }
    }
}
