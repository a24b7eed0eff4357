//! Tier router - model tier routing engine
//!
//! Picks which backend model tier should serve a request, tracks the health
//! of the models it dispatches to, and keeps multi-turn sessions on a
//! consistent tier. The engine lives in [`tiers::SmartRouter`]; the HTTP
//! service in [`routes`] is a thin integration boundary around it.

pub mod classifier;
pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod stats;
pub mod tiers;
pub mod tokens;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::info;

pub use crate::classifier::{IntentClassifier, TierRule};
pub use crate::config::{Config, RouterConfig};
pub use crate::error::{RouterError, RouterResult};
pub use crate::stats::RoutingStatsSnapshot;
pub use crate::tiers::{RouteRequest, RouteResult, SmartRouter, Tier, TierConfig};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub router: Arc<SmartRouter>,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    ///
    /// Builds the router from the routing configuration named by `config`
    /// (or the built-in default).
    pub fn new(config: Config) -> Result<Self> {
        let router_config = config.load_router_config()?;
        let router = SmartRouter::new(router_config).context("Invalid router configuration")?;
        Ok(Self::with_router(config, Arc::new(router)))
    }

    /// Create an application state around an existing router
    pub fn with_router(config: Config, router: Arc<SmartRouter>) -> Self {
        Self {
            config,
            router,
            start_time: Instant::now(),
        }
    }

    /// Spawn periodic eviction of idle session pins
    ///
    /// Returns `None` when `SESSION_TTL_SECONDS` is 0.
    pub fn spawn_session_eviction(&self) -> Option<JoinHandle<()>> {
        if self.config.session_ttl_seconds == 0 {
            return None;
        }

        let ttl = Duration::from_secs(self.config.session_ttl_seconds);
        let period = (ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(300));
        let router = self.router.clone();

        info!(
            ttl_secs = ttl.as_secs(),
            period_secs = period.as_secs(),
            "Session eviction enabled"
        );

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                router.sessions().evict_idle(ttl);
            }
        }))
    }
}
