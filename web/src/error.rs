//! Error types for web handlers.
//!
//! [`AppError`] bridges [`PharmacyError`] and HTTP responses. Every failure
//! leaves the service as `{"code": "...", "message": "..."}` with the
//! matching status; internal causes are logged and replaced by a generic
//! message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pharmacy_core::PharmacyError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState<S>>) -> Result<Json<Drug>, AppError> {
///     let drug = state.inventory.get(&principal, id).await?;
///     Ok(Json(drug))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// HTTP status this error responds with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<PharmacyError> for AppError {
    fn from(err: PharmacyError) -> Self {
        match err {
            PharmacyError::InvalidInput(message) => Self::bad_request(message),
            PharmacyError::NotFound { .. } => Self::not_found(err.to_string()),
            PharmacyError::Conflict(message) => Self::conflict(message),
            PharmacyError::InsufficientStock { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                err.to_string(),
                "INSUFFICIENT_STOCK".to_string(),
            ),
            PharmacyError::InvalidCredentials | PharmacyError::Unauthorized => {
                Self::unauthorized(err.to_string())
            }
            PharmacyError::Forbidden(message) => Self::forbidden(message),
            PharmacyError::Internal(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::Error::new(err))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_domain_errors_map_to_statuses() {
        let cases = [
            (PharmacyError::invalid("Sale must contain at least one item"), 400, "BAD_REQUEST"),
            (PharmacyError::not_found("Drug", "42"), 404, "NOT_FOUND"),
            (PharmacyError::Conflict("User already exists".into()), 409, "CONFLICT"),
            (
                PharmacyError::InsufficientStock {
                    drug_name: "Ibuprofen".into(),
                    available: 1,
                    requested: 2,
                },
                400,
                "INSUFFICIENT_STOCK",
            ),
            (PharmacyError::InvalidCredentials, 401, "UNAUTHORIZED"),
            (PharmacyError::Unauthorized, 401, "UNAUTHORIZED"),
            (PharmacyError::Forbidden("nope".into()), 403, "FORBIDDEN"),
            (PharmacyError::Internal("boom".into()), 500, "INTERNAL_SERVER_ERROR"),
        ];

        for (domain, status, code) in cases {
            let err = AppError::from(domain);
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_internal_errors_hide_their_cause() {
        let err = AppError::from(PharmacyError::Internal("password authentication failed for user postgres".into()));
        assert_eq!(err.message, "An internal error occurred");
        assert!(err.source.is_some());
    }

    #[test]
    fn test_insufficient_stock_message_names_the_drug() {
        let err = AppError::from(PharmacyError::InsufficientStock {
            drug_name: "Amoxicillin".into(),
            available: 0,
            requested: 1,
        });
        assert_eq!(
            err.message,
            "Insufficient stock for Amoxicillin. Available: 0, Requested: 1"
        );
    }
}
