//! HTTP API server with observability for the storefront backend.
//!
//! Provides REST endpoints for catalog, cart, checkout, orders,
//! reviews, device registration, and gesture capture, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::StorefrontStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/products/ai-generated",
            get(routes::products::list_ai_generated::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::remove::<S>),
        )
        .route("/products/{id}/approve", post(routes::products::approve::<S>))
        .route(
            "/products/{id}/reviews",
            get(routes::products::list_reviews::<S>).post(routes::products::create_review::<S>),
        )
        .route("/cart", get(routes::cart::view::<S>))
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{id}",
            put(routes::cart::update_item::<S>).delete(routes::cart::remove_item::<S>),
        )
        .route("/cart/checkout", post(routes::cart::checkout::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", post(routes::orders::set_status::<S>))
        .route(
            "/devices",
            get(routes::devices::list::<S>).post(routes::devices::register::<S>),
        )
        .route("/devices/{id}", delete(routes::devices::deactivate::<S>))
        .route(
            "/devices/{id}/test",
            post(routes::devices::test_notification::<S>),
        )
        .route(
            "/gestures",
            get(routes::gestures::list::<S>).post(routes::gestures::capture::<S>),
        )
        .route("/gestures/stats", get(routes::gestures::stats::<S>))
        .with_state(state);

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api/v1", api)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
