//! Prometheus metrics for the pharmacy server.
//!
//! # Exported Metrics
//!
//! - `pharmacy_sales_created_total` - sales committed
//! - `pharmacy_sales_rejected_total{reason}` - sales refused, by error kind
//! - `pharmacy_units_sold_total` - units taken out of stock by sales
//! - `pharmacy_logins_total{outcome}` - sign-in attempts (`success`, `failure`)
//!
//! The counters are recorded by the services; this module only installs
//! the exporter and serves `GET /metrics` on its own listener.

use axum::{routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and describe every counter.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if a recorder is already installed.
pub fn install() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    Ok(handle)
}

/// Router serving the rendered metrics at `/metrics`.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

fn register_metrics() {
    describe_counter!(
        "pharmacy_sales_created_total",
        "Total number of sales committed"
    );
    describe_counter!(
        "pharmacy_sales_rejected_total",
        "Total number of sales refused, by reason"
    );
    describe_counter!(
        "pharmacy_units_sold_total",
        "Total number of units taken out of stock by sales"
    );
    describe_counter!(
        "pharmacy_logins_total",
        "Total number of sign-in attempts, by outcome"
    );

    tracing::info!("Metrics registered");
}
