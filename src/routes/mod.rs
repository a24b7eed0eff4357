//! HTTP routes for the tier router
//!
//! Thin integration boundary over [`SmartRouter`](crate::tiers::SmartRouter):
//! callers route requests, report call outcomes and read statistics.

pub mod debug;
pub mod health;
pub mod metrics;
pub mod routing;
pub mod stats;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/v1/route", post(routing::route_request))
        .route("/v1/outcome", post(routing::report_outcome))
        .route("/v1/stats", get(stats::routing_stats))
        .route("/v1/models/health", get(stats::model_health))
        .route("/v1/tiers", get(stats::list_tiers));

    // Public routes (health checks, metrics)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    let mut app = Router::new().merge(public_routes).merge(api_routes);

    // Session introspection only when debug is enabled
    if state.config.debug_enabled {
        app = app.route("/debug/sessions/:session_id", get(debug::get_session));
    }

    app
        // Global middleware (applied to all routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
