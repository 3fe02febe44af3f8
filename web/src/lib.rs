//! Axum HTTP boundary for the pharmacy point-of-sale.
//!
//! The crate is a thin shell around the services in `pharmacy-core` and
//! `pharmacy-auth`:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP shell (Axum)               │  ← JSON, bearer tokens
//! │  - correlation id + access gate         │  ← 401 / 303 / 403
//! │  - ValidJson body validation            │  ← 400 before services
//! ├─────────────────────────────────────────┤
//! │         Services                        │
//! │  - Inventory, Sales, Analytics, Auth    │  ← explicit Principal
//! │  - generic over PharmacyStore           │  ← Postgres or in-memory
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **Correlate**: tag the request with an `X-Correlation-ID`
//! 2. **Gate**: resolve the bearer session and check the route table
//! 3. **Extract**: principal and validated body
//! 4. **Call** one service operation
//! 5. **Map** the result (or [`PharmacyError`](pharmacy_core::PharmacyError)) to a response
//!
//! # Example
//!
//! ```ignore
//! let state = AppState::new(store, Arc::new(SystemClock), AuthConfig::default());
//! let app = pharmacy_web::build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId, CurrentUser, ValidJson, ValidPath};
pub use middleware::{access_gate, correlation_id_layer, CORRELATION_ID_HEADER};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
