//! `PostgreSQL` store for the pharmacy point-of-sale.
//!
//! [`PgStore`] implements every repository trait from `pharmacy-core` on
//! one connection pool:
//!
//! - Drug CRUD, with cascade removal of sale items on delete
//! - Transactional sale creation (row locks plus a conditional decrement)
//! - Staff accounts with a unique email
//! - Opaque sessions keyed by token digest
//!
//! # Example
//!
//! ```no_run
//! use pharmacy_postgres::{PgStore, PoolSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PgStore::connect("postgres://localhost/pharmacy", &PoolSettings::default()).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod drugs;
mod error;
mod sales;
mod sessions;
mod users;

use error::db_error;
use pharmacy_core::repository::PharmacyStore;
use pharmacy_core::{PharmacyError, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Connection pool tuning.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long to wait for a connection before failing
    pub connect_timeout: Duration,
    /// How long an unused connection may stay open
    pub idle_timeout: Duration,
    /// Server-side limit per statement
    pub statement_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

/// `PostgreSQL` store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PharmacyError::Internal`] if the URL is malformed or the
    /// database is unreachable within the connect timeout.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| PharmacyError::Internal(format!("Invalid database URL: {e}")))?
            .options([(
                "statement_timeout",
                format!("{}ms", settings.statement_timeout.as_millis()),
            )]);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .idle_timeout(Some(settings.idle_timeout))
            .connect_with(options)
            .await
            .map_err(db_error("connect"))?;

        tracing::info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "Database pool ready"
        );
        Ok(Self::from_pool(pool))
    }

    /// Apply pending migrations from `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns [`PharmacyError::Internal`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PharmacyError::Internal(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl PharmacyStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("ping"))?;
        Ok(())
    }
}
