//! Routing endpoints
//!
//! - `POST /v1/route` - pick a model for a request
//! - `POST /v1/outcome` - report the result of a call to a model

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{AppError, AppResult},
    tiers::{RouteRequest, RouteResult},
    AppState,
};

/// Outcome report for a call made to a routed model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeReport {
    /// Model the call was made to
    pub model: String,
    /// Whether the call succeeded
    pub success: bool,
    /// Observed call latency
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

/// Route a request to a model
pub async fn route_request(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> AppResult<Json<RouteResult>> {
    request.validate().map_err(AppError::BadRequest)?;

    let result = state.router.route(&request).map_err(|e| {
        warn!(error = %e, "Routing failed on configuration");
        AppError::from(e)
    })?;

    Ok(Json(result))
}

/// Record the outcome of a call to a model
pub async fn report_outcome(
    State(state): State<Arc<AppState>>,
    Json(report): Json<OutcomeReport>,
) -> AppResult<StatusCode> {
    if report.model.trim().is_empty() {
        return Err(AppError::BadRequest("model must not be empty".to_string()));
    }

    let recorded = state
        .router
        .report_outcome(&report.model, report.success, report.latency_ms);
    if !recorded {
        return Err(AppError::NotFound(format!(
            "model '{}' is not in the tier table",
            report.model
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
