//! Prometheus metrics endpoint
//!
//! Exposes routing metrics in Prometheus format for monitoring. The counters
//! themselves are recorded by the router and the statistics module.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

/// Describe all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "tier_router_requests_total",
        "Total number of requests routed, by tier and model"
    );
    metrics::describe_counter!(
        "tier_router_fallbacks_total",
        "Requests served by a fallback model because earlier candidates were unhealthy"
    );
    metrics::describe_counter!(
        "tier_router_degraded_total",
        "Requests routed to the last fallback with every candidate unhealthy"
    );
    metrics::describe_counter!(
        "tier_router_session_hits_total",
        "Requests whose tier came from session affinity"
    );
    metrics::describe_counter!(
        "tier_router_outcomes_total",
        "Call outcomes reported by callers, by model and result"
    );
    metrics::describe_histogram!(
        "tier_router_route_duration_seconds",
        "Time spent deciding a route"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}
