//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health. Both are public.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use pharmacy_core::repository::PharmacyStore;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Liveness check. Does not touch the store.
///
/// ```text
/// GET /health
/// {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,
    /// Store connectivity
    pub database: bool,
}

/// Readiness check. Pings the store; 503 when it cannot be reached.
///
/// # Errors
///
/// `503 SERVICE_UNAVAILABLE` when the store ping fails.
pub async fn readiness_check<S: PharmacyStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<ReadinessResponse>, AppError> {
    if let Err(err) = state.store().ping().await {
        tracing::warn!(error = %err, "Readiness check failed");
        return Err(AppError::unavailable("Database is unreachable"));
    }

    Ok(Json(ReadinessResponse {
        ready: true,
        database: true,
    }))
}
