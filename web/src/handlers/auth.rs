//! Sign-in, sign-out and session endpoints.

use crate::error::AppError;
use crate::extractors::{BearerToken, CurrentUser, ValidJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use pharmacy_auth::SignedIn;
use pharmacy_core::repository::PharmacyStore;
use pharmacy_core::user::User;
use serde::{Deserialize, Serialize};

/// Credentials posted to `/api/auth/sign-in`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    /// Account email (case-insensitive)
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// The caller's current session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Account behind the session, with its current role
    pub user: User,
    /// When the session stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// `POST /api/auth/sign-in`
///
/// # Errors
///
/// 401 `Invalid credentials` for any email/password mismatch.
pub async fn sign_in<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    ValidJson(request): ValidJson<SignInRequest>,
) -> Result<Json<SignedIn>, AppError> {
    let signed_in = state.auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(signed_in))
}

/// `POST /api/auth/sign-out`: end the presented session.
///
/// # Errors
///
/// Store failures.
pub async fn sign_out<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    state.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/session`
#[allow(clippy::unused_async)]
pub async fn current_session(CurrentUser(session): CurrentUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: session.user,
        expires_at: session.expires_at,
    })
}
