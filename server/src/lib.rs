//! Pharmacy point-of-sale server.
//!
//! Wires the `PostgreSQL` store, the services and the HTTP router together,
//! and runs them until Ctrl+C or SIGTERM.
//!
//! # Startup
//!
//! 1. Load [`Config`] from the environment (after `.env`)
//! 2. Install the Prometheus exporter
//! 3. Connect the pool, apply migrations, drop expired sessions
//! 4. Serve the API and the metrics listener
//! 5. On a signal, stop accepting and give in-flight requests
//!    `SHUTDOWN_TIMEOUT` to finish

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;

pub use config::Config;

use pharmacy_core::environment::SystemClock;
use pharmacy_core::PharmacyError;
use pharmacy_postgres::PgStore;
use pharmacy_web::{build_router, AppState};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,pharmacy=debug,sqlx=warn";

/// Startup and serving failures.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Store connection, migration or bootstrap failure
    #[error(transparent)]
    Store(#[from] PharmacyError),
    /// Listener bind or accept failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Exporter installation failure
    #[error(transparent)]
    Metrics(#[from] metrics::MetricsError),
    /// A server task ended abnormally
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Install the global tracing subscriber (`RUST_LOG` or [`DEFAULT_LOG_FILTER`]).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect to the store and bring its schema up to date.
///
/// # Errors
///
/// Connection or migration failures.
pub async fn open_store(config: &Config) -> Result<PgStore, ServerError> {
    info!(database = %config.database.redacted_url(), "Connecting to PostgreSQL");
    let store = PgStore::connect(&config.database.url, &config.database.pool_settings()).await?;

    info!("Running database migrations");
    store.migrate().await?;
    info!("Migrations complete");
    Ok(store)
}

/// Run the HTTP and metrics servers until a shutdown signal arrives.
///
/// # Errors
///
/// Returns error if startup fails or a listener dies.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let metrics_handle = metrics::install()?;

    let store = open_store(&config).await?;
    store.purge_expired_sessions(chrono::Utc::now()).await?;

    let state = AppState::new(
        store.clone(),
        Arc::new(SystemClock),
        config.auth.auth_config(),
    );
    let app = build_router(state);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = tokio::net::TcpListener::bind(config.server.http_addr()).await?;
    info!(address = %config.server.http_addr(), "HTTP server listening");
    let mut server = tokio::spawn({
        let shutdown = wait_for(shutdown_rx.clone());
        async move { axum::serve(listener, app).with_graceful_shutdown(shutdown).await }
    });

    let metrics_listener = tokio::net::TcpListener::bind(config.server.metrics_addr()).await?;
    info!(address = %config.server.metrics_addr(), "Prometheus metrics available at /metrics");
    let metrics_server = tokio::spawn({
        let shutdown = wait_for(shutdown_rx);
        let router = metrics::metrics_router(metrics_handle);
        async move {
            axum::serve(metrics_listener, router)
                .with_graceful_shutdown(shutdown)
                .await
        }
    });

    tokio::select! {
        result = &mut server => {
            // the listener stopped on its own; nothing left to drain
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    info!("Shutting down gracefully");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(config.server.shutdown_timeout(), server).await {
        Ok(result) => result??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout,
            "In-flight requests did not finish in time"
        ),
    }
    if let Err(e) = metrics_server.await? {
        warn!(error = %e, "Metrics server stopped with an error");
    }

    store.close().await;
    info!("Graceful shutdown complete");
    Ok(())
}

fn wait_for(mut rx: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
