//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Full health check with per-tier availability
//! - `/health/ready` - Readiness probe
//! - `/health/live` - Liveness probe
//!
//! The router always answers, so the service itself is never reported
//! unhealthy; a tier whose every model is unhealthy makes it degraded.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{tiers::SmartRouter, AppState};

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Availability of a single tier
#[derive(Debug, Serialize)]
pub struct TierCheck {
    pub tier: u8,
    pub name: &'static str,
    pub status: HealthStatus,
    pub healthy_models: usize,
    pub total_models: usize,
}

/// Application statistics
#[derive(Debug, Serialize)]
pub struct HealthStats {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub pinned_sessions: usize,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub tiers: Vec<TierCheck>,
    /// Tripped models with their consecutive error counts
    pub unhealthy_models: Vec<UnhealthyModel>,
    pub stats: HealthStats,
}

/// A model currently excluded from selection
#[derive(Debug, Serialize)]
pub struct UnhealthyModel {
    pub model: String,
    pub consecutive_errors: u32,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Check how many models of each tier are currently eligible
fn check_tiers(router: &SmartRouter) -> Vec<TierCheck> {
    router
        .registry()
        .tiers()
        .map(|config| {
            let total_models = config.candidates().count();
            let healthy_models = config
                .candidates()
                .filter(|model| router.health().is_healthy(model))
                .count();
            let status = if healthy_models == 0 {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            };
            TierCheck {
                tier: config.tier.as_u8(),
                name: config.tier.name(),
                status,
                healthy_models,
                total_models,
            }
        })
        .collect()
}

/// Full health check endpoint
///
/// Returns comprehensive health information including:
/// - Overall status
/// - Version info
/// - Uptime
/// - Per-tier model availability
/// - Routing stats
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let tiers = check_tiers(&state.router);

    let overall_status = if tiers.iter().any(|t| t.status != HealthStatus::Healthy) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let uptime = state.start_time.elapsed().as_secs();

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        timestamp: chrono::Utc::now().to_rfc3339(),
        tiers,
        unhealthy_models: state
            .router
            .health()
            .unhealthy_models()
            .into_iter()
            .map(|(model, consecutive_errors)| UnhealthyModel {
                model,
                consecutive_errors,
            })
            .collect(),
        stats: HealthStats {
            uptime_seconds: uptime,
            total_requests: state.router.stats().total_requests,
            pinned_sessions: state.router.sessions().len(),
        },
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe endpoint
///
/// The router is fully built before the server binds, so a running server
/// is ready.
pub async fn readiness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

/// Liveness probe endpoint
///
/// Returns 200 OK if the application is alive.
/// Used by Kubernetes liveness probes.
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
