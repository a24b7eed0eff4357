//! Routing statistics
//!
//! Process-lifetime counters describing router behavior. Mutated only by the
//! router, read by callers through [`RoutingStats::snapshot`]. Each counter is
//! an independent atomic, so a snapshot taken during heavy routing may be a
//! few requests behind on some counters but never shows a torn value.
//!
//! Every update is mirrored to the `metrics` facade for Prometheus export.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::tiers::Tier;

/// What the router decided for one request, as far as statistics care
#[derive(Debug, Clone, Copy)]
pub(crate) struct RouteRecord<'a> {
    pub tier: Tier,
    pub model: &'a str,
    pub from_cache: bool,
    pub fallback: bool,
    pub degraded: bool,
    pub escalated: bool,
}

#[derive(Debug, Default)]
struct LatencyAverage {
    samples: u64,
    mean_us: f64,
}

impl LatencyAverage {
    fn fold(&mut self, sample_us: f64) {
        self.samples += 1;
        self.mean_us += (sample_us - self.mean_us) / self.samples as f64;
    }
}

/// Aggregate routing counters
#[derive(Debug, Default)]
pub struct RoutingStats {
    total_requests: AtomicU64,
    by_tier: [AtomicU64; 4],
    by_model: DashMap<String, AtomicU64>,
    session_hits: AtomicU64,
    fallbacks: AtomicU64,
    degraded: AtomicU64,
    escalations: AtomicU64,
    latency: Mutex<LatencyAverage>,
}

/// Point-in-time copy of the routing counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingStatsSnapshot {
    pub total_requests: u64,
    /// Requests per tier, keyed by tier number
    pub by_tier: BTreeMap<u8, u64>,
    pub by_model: BTreeMap<String, u64>,
    /// Running mean of the router's own decision time
    pub average_latency_ms: f64,
    pub session_cache_hits: u64,
    pub fallbacks: u64,
    pub degraded: u64,
    pub escalations: u64,
}

impl RoutingStats {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one routed request into the counters
    pub(crate) fn record(&self, route: RouteRecord<'_>, latency: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.by_tier[route.tier.index()].fetch_add(1, Ordering::Relaxed);

        match self.by_model.get(route.model) {
            Some(counter) => {
                counter.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.by_model
                    .entry(route.model.to_string())
                    .or_default()
                    .fetch_add(1, Ordering::Relaxed);
            }
        }

        if route.from_cache {
            self.session_hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("tier_router_session_hits_total").increment(1);
        }
        if route.fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("tier_router_fallbacks_total", "tier" => route.tier.to_string())
                .increment(1);
        }
        if route.degraded {
            self.degraded.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("tier_router_degraded_total", "tier" => route.tier.to_string())
                .increment(1);
        }
        if route.escalated {
            self.escalations.fetch_add(1, Ordering::Relaxed);
        }

        self.latency.lock().fold(latency.as_secs_f64() * 1_000_000.0);

        metrics::counter!(
            "tier_router_requests_total",
            "tier" => route.tier.to_string(),
            "model" => route.model.to_string()
        )
        .increment(1);
        metrics::histogram!("tier_router_route_duration_seconds").record(latency.as_secs_f64());
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> RoutingStatsSnapshot {
        let by_tier = Tier::ALL
            .iter()
            .map(|tier| (tier.as_u8(), self.by_tier[tier.index()].load(Ordering::Relaxed)))
            .collect();

        let by_model = self
            .by_model
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();

        RoutingStatsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            by_tier,
            by_model,
            average_latency_ms: self.latency.lock().mean_us / 1_000.0,
            session_cache_hits: self.session_hits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
        }
    }
}
