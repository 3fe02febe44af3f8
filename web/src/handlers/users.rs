//! Account administration endpoints. Admin only.

use crate::error::AppError;
use crate::extractors::{CurrentUser, ValidJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use pharmacy_core::repository::PharmacyStore;
use pharmacy_core::user::{NewUser, RoleUpdate, User};

/// `GET /api/users`: every account, newest first, without password hashes.
///
/// # Errors
///
/// 403 for non-admins.
pub async fn list_users<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state.auth.list_users(&session.principal).await?;
    Ok(Json(users))
}

/// `POST /api/users`: create an account; `role` defaults to `SALES`.
///
/// # Errors
///
/// 400 for missing or invalid fields, 409 for a taken email.
pub async fn create_user<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    ValidJson(request): ValidJson<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.auth.create_user(&session.principal, request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /api/users`: change an account's role.
///
/// # Errors
///
/// 400 for an unknown role, 404 for an unknown account.
pub async fn update_user_role<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    ValidJson(request): ValidJson<RoleUpdate>,
) -> Result<Json<User>, AppError> {
    let user = state.auth.set_role(&session.principal, request).await?;
    Ok(Json(user))
}
