//! Application services.
//!
//! Each service wraps a store and a [`Clock`](crate::environment::Clock) and
//! takes the caller's [`Principal`](crate::user::Principal) explicitly on
//! every operation. Role checks happen here, so they hold no matter which
//! transport invoked the operation.

mod analytics;
mod inventory;
mod sales;

pub use analytics::AnalyticsService;
pub use inventory::InventoryService;
pub use sales::SalesService;
