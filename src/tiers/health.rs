//! Model health tracking with the 3-strike rule
//!
//! Each model is either healthy or unhealthy. Consecutive failures are counted
//! and the model trips to unhealthy when the count reaches the threshold
//! (three by default). A single success resets the counter and restores the
//! model immediately. There is no time-based recovery: callers are expected
//! to probe unhealthy models out-of-band and report the result.
//!
//! State is kept in a `DashMap` so updates for one model never serialize
//! behind updates for another.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Default number of consecutive failures before a model is marked unhealthy
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Configuration for health tracking
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Consecutive failures that trip a model to unhealthy (default: 3)
    pub failure_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// Health record for a single model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelHealth {
    /// Whether the model is eligible for selection
    pub healthy: bool,
    /// Failures since the last success
    pub consecutive_errors: u32,
    /// Time of the most recent failure
    pub last_error_at: Option<DateTime<Utc>>,
    /// Latency reported with the most recent success
    pub last_latency_ms: Option<u64>,
}

impl Default for ModelHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_errors: 0,
            last_error_at: None,
            last_latency_ms: None,
        }
    }
}

/// Tracks health of backend models
///
/// Records are created lazily on the first report for a model and never
/// removed; cardinality is bounded by the number of configured models.
pub struct HealthTracker {
    states: DashMap<String, ModelHealth>,
    config: HealthConfig,
}

impl HealthTracker {
    /// Create a new health tracker with default configuration
    pub fn new() -> Self {
        Self::with_config(HealthConfig::default())
    }

    /// Create a new health tracker with custom configuration
    pub fn with_config(config: HealthConfig) -> Self {
        Self {
            states: DashMap::new(),
            config: HealthConfig {
                failure_threshold: config.failure_threshold.max(1),
            },
        }
    }

    /// Failure threshold in effect
    pub fn failure_threshold(&self) -> u32 {
        self.config.failure_threshold
    }

    /// Check whether a model may be selected
    ///
    /// Models never reported on are healthy.
    pub fn is_healthy(&self, model: &str) -> bool {
        self.states
            .get(model)
            .map(|state| state.healthy)
            .unwrap_or(true)
    }

    /// Record a successful call, resetting the failure count
    pub fn report_success(&self, model: &str, latency_ms: Option<u64>) {
        let mut state = self.states.entry(model.to_string()).or_default();

        if !state.healthy {
            info!(
                model = %model,
                previous_errors = state.consecutive_errors,
                "Model recovered, marking healthy"
            );
        } else if state.consecutive_errors > 0 {
            debug!(
                model = %model,
                previous_errors = state.consecutive_errors,
                "Failure streak cleared"
            );
        }

        state.healthy = true;
        state.consecutive_errors = 0;
        if latency_ms.is_some() {
            state.last_latency_ms = latency_ms;
        }
    }

    /// Record a failed call
    ///
    /// Returns `true` when this failure tripped the model to unhealthy.
    pub fn report_failure(&self, model: &str) -> bool {
        let mut state = self.states.entry(model.to_string()).or_default();

        state.consecutive_errors = state.consecutive_errors.saturating_add(1);
        state.last_error_at = Some(Utc::now());

        let tripped = state.healthy && state.consecutive_errors >= self.config.failure_threshold;
        if tripped {
            state.healthy = false;
            warn!(
                model = %model,
                consecutive_errors = state.consecutive_errors,
                "Model marked unhealthy after consecutive failures"
            );
        } else {
            debug!(
                model = %model,
                consecutive_errors = state.consecutive_errors,
                healthy = state.healthy,
                "Model failure recorded"
            );
        }

        tripped
    }

    /// Current record for a model, if it has been reported on
    pub fn get(&self, model: &str) -> Option<ModelHealth> {
        self.states.get(model).map(|state| state.clone())
    }

    /// Copy of every record, keyed by model
    pub fn snapshot(&self) -> BTreeMap<String, ModelHealth> {
        self.states
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Unhealthy models with their consecutive error counts
    pub fn unhealthy_models(&self) -> Vec<(String, u32)> {
        let mut models: Vec<(String, u32)> = self
            .states
            .iter()
            .filter(|entry| !entry.healthy)
            .map(|entry| (entry.key().clone(), entry.consecutive_errors))
            .collect();
        models.sort();
        models
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}
