//! Yupay Storefront library.
//!
//! JSON API for the public storefront (nearby stores, plan catalog) and the
//! owner dashboard (quota, entitlements, sale accounting). Exposed as a library
//! so the router can be tested and the CLI can reuse configuration, catalog
//! loading and migrations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary, outermost of all. The `/api`
/// rate limiter keys on the client IP, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` when no proxy sets
/// `x-forwarded-for`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .nest(
            "/api",
            routes::api_routes().layer(middleware::api_rate_limiter()),
        )
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
