//! Sale endpoints.

use crate::error::AppError;
use crate::extractors::{CurrentUser, ValidJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use pharmacy_core::repository::PharmacyStore;
use pharmacy_core::sale::{CreateSale, Sale};

/// `GET /api/sales`: every sale with its items, newest first.
///
/// # Errors
///
/// Store failures.
pub async fn list_sales<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<Sale>>, AppError> {
    let sales = state.sales.list(&session.principal).await?;
    Ok(Json(sales))
}

/// `POST /api/sales`: record a sale and take the units out of stock.
///
/// # Errors
///
/// 400 for an empty or malformed item list and for insufficient stock,
/// 404 for an unknown drug. Nothing is written on failure.
pub async fn create_sale<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    ValidJson(request): ValidJson<CreateSale>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    let sale = state.sales.create(&session.principal, request).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
