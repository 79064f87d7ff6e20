//! GHRSST API Service Library
//!
//! HTTP surface over the `grid-query` engine: the point/box query endpoint,
//! bounds lookup, OpenAPI docs, health, readiness and Prometheus metrics.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Queries
        .route("/api/ghrsst", get(handlers::query::query_handler))
        .route("/api/ghrsst/bounds", get(handlers::bounds::bounds_handler))
        // API documentation
        .route(handlers::api::OPENAPI_PATH, get(handlers::api::api_handler))
        .route("/api/swagger/ghrsst", get(handlers::api::api_html_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
