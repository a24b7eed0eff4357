//! Read-only router introspection
//!
//! - `GET /v1/stats` - routing statistics
//! - `GET /v1/models/health` - per-model health records
//! - `GET /v1/tiers` - configured tier table

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    stats::RoutingStatsSnapshot,
    tiers::{ModelHealth, Tier, TierConfig},
    AppState,
};

/// Health of every model reported on so far
#[derive(Debug, Serialize)]
pub struct ModelHealthResponse {
    pub failure_threshold: u32,
    pub models: BTreeMap<String, ModelHealth>,
}

/// Configured tiers
#[derive(Debug, Serialize)]
pub struct TiersResponse {
    pub default_tier: Tier,
    pub session_pinning: bool,
    pub tiers: Vec<TierConfig>,
}

/// Routing statistics endpoint
pub async fn routing_stats(State(state): State<Arc<AppState>>) -> Json<RoutingStatsSnapshot> {
    Json(state.router.stats())
}

/// Model health endpoint
pub async fn model_health(State(state): State<Arc<AppState>>) -> Json<ModelHealthResponse> {
    let health = state.router.health();
    Json(ModelHealthResponse {
        failure_threshold: health.failure_threshold(),
        models: health.snapshot(),
    })
}

/// Tier table endpoint
pub async fn list_tiers(State(state): State<Arc<AppState>>) -> Json<TiersResponse> {
    let router = &state.router;
    Json(TiersResponse {
        default_tier: router.default_tier(),
        session_pinning: router.session_pinning_enabled(),
        tiers: router.registry().tiers().cloned().collect(),
    })
}
