//! HTTP request handlers, one module per resource.
//!
//! Handlers only translate between HTTP and the services: they take the
//! principal from [`CurrentUser`](crate::extractors::CurrentUser), call
//! one service operation and shape the response.

pub mod analytics;
pub mod auth;
pub mod drugs;
pub mod health;
pub mod sales;
pub mod users;

pub use health::{health_check, readiness_check};
