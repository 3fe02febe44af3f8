//! Reporting endpoints.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use pharmacy_core::analytics::{AnalyticsQuery, AnalyticsReport, QuickStats};
use pharmacy_core::repository::PharmacyStore;

/// `GET /api/analytics?period=&startDate=&endDate=` (admin).
///
/// # Errors
///
/// 400 when `startDate` is after `endDate`, 403 for non-admins.
pub async fn analytics_report<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let report = state.analytics.report(&session.principal, &query).await?;
    Ok(Json(report))
}

/// `GET /api/quick-stats`: today's figures for the dashboard header.
///
/// # Errors
///
/// Store failures.
pub async fn quick_stats<S: PharmacyStore>(
    State(state): State<AppState<S>>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<QuickStats>, AppError> {
    let stats = state.analytics.quick_stats(&session.principal).await?;
    Ok(Json(stats))
}
