//! Application state for Axum handlers.

use pharmacy_auth::{AuthConfig, AuthService};
use pharmacy_core::environment::Clock;
use pharmacy_core::repository::PharmacyStore;
use pharmacy_core::service::{AnalyticsService, InventoryService, SalesService};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Every service is built over the same store handle, so it is cloned
/// cheaply for each request.
#[derive(Clone)]
pub struct AppState<S> {
    /// Drug catalogue
    pub inventory: InventoryService<S>,
    /// Sale recording and history
    pub sales: SalesService<S>,
    /// Analytics report and quick stats
    pub analytics: AnalyticsService<S>,
    /// Sign-in, sessions and accounts
    pub auth: AuthService<S>,
    store: S,
}

impl<S: PharmacyStore> AppState<S> {
    /// Build every service over `store`.
    pub fn new(store: S, clock: Arc<dyn Clock>, auth_config: AuthConfig) -> Self {
        Self {
            inventory: InventoryService::new(store.clone(), Arc::clone(&clock)),
            sales: SalesService::new(store.clone(), Arc::clone(&clock)),
            analytics: AnalyticsService::new(store.clone(), Arc::clone(&clock)),
            auth: AuthService::new(store.clone(), clock, auth_config),
            store,
        }
    }

    /// The underlying store, for readiness checks.
    pub const fn store(&self) -> &S {
        &self.store
    }
}
