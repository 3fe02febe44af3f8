//! Drug catalogue endpoints.
//!
//! - `GET /api/drugs` - list, newest first
//! - `GET /api/drugs/:id` - one drug
//! - `POST /api/drugs` - create (admin)
//! - `PUT /api/drugs/:id` - partial update (admin)
//! - `DELETE /api/drugs/:id` - delete, cascading to sale items (admin)

use crate::error::AppError;
use crate::extractors::{CurrentUser, ValidJson, ValidPath};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use pharmacy_core::drug::{Drug, DrugId, DrugPatch, NewDrug};
use pharmacy_core::repository::PharmacyStore;
use serde::Serialize;

/// Response after deleting a drug.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDrugResponse {
    /// Always `true`; failures are error responses
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    /// Sale items removed along with the drug
    pub deleted_sale_items: u64,
}

/// List every drug.
///
/// # Errors
///
/// Store failures.
pub async fn list_drugs<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<Drug>>, AppError> {
    let drugs = state.inventory.list(&session.principal).await?;
    Ok(Json(drugs))
}

/// Fetch one drug.
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn get_drug<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    ValidPath(id): ValidPath<DrugId>,
) -> Result<Json<Drug>, AppError> {
    let drug = state.inventory.get(&session.principal, id).await?;
    Ok(Json(drug))
}

/// Add a drug to the catalogue.
///
/// # Errors
///
/// 400 for invalid fields, 403 for non-admins.
pub async fn create_drug<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    ValidJson(request): ValidJson<NewDrug>,
) -> Result<(StatusCode, Json<Drug>), AppError> {
    let drug = state.inventory.create(&session.principal, request).await?;
    Ok((StatusCode::CREATED, Json(drug)))
}

/// Apply a partial update. Absent fields are kept; `null` clears the
/// optional ones.
///
/// # Errors
///
/// 400 for invalid fields, 404 for an unknown id, 403 for non-admins.
pub async fn update_drug<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    ValidPath(id): ValidPath<DrugId>,
    ValidJson(patch): ValidJson<DrugPatch>,
) -> Result<Json<Drug>, AppError> {
    let drug = state.inventory.update(&session.principal, id, patch).await?;
    Ok(Json(drug))
}

/// Delete a drug and every sale item that references it.
///
/// # Errors
///
/// 404 for an unknown id, 403 for non-admins.
pub async fn delete_drug<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    ValidPath(id): ValidPath<DrugId>,
) -> Result<Json<DeleteDrugResponse>, AppError> {
    let deletion = state.inventory.delete(&session.principal, id).await?;
    Ok(Json(DeleteDrugResponse {
        success: true,
        message: format!(
            "Drug deleted along with {} related sale item(s)",
            deletion.deleted_sale_items
        ),
        deleted_sale_items: deletion.deleted_sale_items,
    }))
}
