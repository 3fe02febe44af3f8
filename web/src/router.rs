//! Router configuration.

use crate::handlers::{analytics, auth, drugs, health, sales, users};
use crate::middleware::{access_gate, correlation_id_layer};
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use pharmacy_core::repository::PharmacyStore;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// `/health` and `/ready` sit at the root; everything else is under
/// `/api`. Every route passes through the access gate, which consults the
/// static route table in `pharmacy_auth::access`.
pub fn build_router<S: PharmacyStore>(state: AppState<S>) -> Router {
    let api_routes = Router::new()
        // Inventory
        .route(
            "/drugs",
            get(drugs::list_drugs::<S>).post(drugs::create_drug::<S>),
        )
        .route(
            "/drugs/:id",
            get(drugs::get_drug::<S>)
                .put(drugs::update_drug::<S>)
                .delete(drugs::delete_drug::<S>),
        )
        // Sales
        .route(
            "/sales",
            get(sales::list_sales::<S>).post(sales::create_sale::<S>),
        )
        // Reporting
        .route("/analytics", get(analytics::analytics_report::<S>))
        .route("/quick-stats", get(analytics::quick_stats::<S>))
        // Accounts
        .route(
            "/users",
            get(users::list_users::<S>)
                .post(users::create_user::<S>)
                .put(users::update_user_role::<S>),
        )
        // Sessions
        .route("/auth/sign-in", post(auth::sign_in::<S>))
        .route("/auth/sign-out", post(auth::sign_out::<S>))
        .route("/auth/session", get(auth::current_session));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check::<S>))
        .nest("/api", api_routes)
        .layer(from_fn_with_state(state.clone(), access_gate::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
