//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                - Health check
//! GET  /health/ready                          - Readiness check (database)
//!
//! # Catalog
//! GET  /api/plans                             - Plan tiers, limits and features
//!
//! # Storefront
//! GET  /api/stores/nearby?lat&lng&radius_km[&locality]
//!                                             - Active stores near a point
//!
//! # Owner dashboard
//! POST /api/owners/{owner_id}/subscription    - Open a subscription
//! GET  /api/owners/{owner_id}/quota           - Remaining quota
//! POST /api/owners/{owner_id}/entitlements    - Evaluate an action
//! POST /api/owners/{owner_id}/sales           - Record a sale
//! ```

pub mod owners;
pub mod plans;
pub mod stores;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(plans::list))
        .route("/stores/nearby", get(stores::nearby))
        .route("/owners/{owner_id}/subscription", post(owners::subscribe))
        .route("/owners/{owner_id}/quota", get(owners::quota))
        .route("/owners/{owner_id}/entitlements", post(owners::entitlements))
        .route("/owners/{owner_id}/sales", post(owners::record_sale))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
