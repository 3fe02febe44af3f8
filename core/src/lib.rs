//! # Pharmacy Core
//!
//! Domain records, rules and services for the pharmacy point-of-sale.
//!
//! ## Layout
//!
//! - **Records**: [`drug`], [`sale`], [`user`] map one-to-one to store rows
//! - **Rules**: [`money`] (exact currency arithmetic), [`sale::plan_sale`]
//!   (stock validation and pricing), [`analytics`] (windowed aggregation)
//! - **Ports**: [`repository`] traits implemented by the PostgreSQL store
//!   and by the in-memory store used in tests
//! - **Services**: [`service`] composes ports with role checks against an
//!   explicit request-scoped [`user::Principal`]
//! - **Environment**: [`environment::Clock`] injects time
//!
//! Nothing in this crate performs I/O directly.

pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;

pub mod analytics;
pub mod drug;
pub mod environment;
pub mod error;
pub mod money;
pub mod repository;
pub mod sale;
pub mod service;
pub mod user;

pub use error::{PharmacyError, Result};
