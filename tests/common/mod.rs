//! Common test utilities for the tier router
//!
//! Shared fixtures: a small routing table with known models and a test
//! server builder around the real HTTP router.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;

use tier_router::{
    routes::create_router, AppState, Config, RouterConfig, SmartRouter, Tier, TierConfig,
    TierRule,
};

/// Model names used by the fixture routing table
pub mod models {
    pub const LOCAL: &str = "local-small";
    pub const ECONOMY: &str = "econ-a";
    pub const ECONOMY_FALLBACK: &str = "econ-b";
    pub const BALANCED: &str = "bal-a";
    pub const BALANCED_FALLBACK: &str = "bal-b";
    pub const PREMIUM: &str = "prem-a";
    pub const PREMIUM_FALLBACK: &str = "prem-b";
}

fn tier(tier: Tier, primary: &str, fallback: &[&str], window: u32, cost: f64) -> TierConfig {
    TierConfig {
        tier,
        primary: primary.to_string(),
        fallback: fallback.iter().map(|m| m.to_string()).collect(),
        max_context_tokens: window,
        cost_per_1k_input: cost,
        cost_per_1k_output: cost * 4.0,
    }
}

/// Four-tier table with one rule per tier and Economy as the default
pub fn router_config() -> RouterConfig {
    RouterConfig {
        tiers: vec![
            tier(Tier::Free, models::LOCAL, &[], 4_096, 0.0),
            tier(
                Tier::Economy,
                models::ECONOMY,
                &[models::ECONOMY_FALLBACK],
                16_000,
                0.0005,
            ),
            tier(
                Tier::Balanced,
                models::BALANCED,
                &[models::BALANCED_FALLBACK],
                128_000,
                0.003,
            ),
            tier(
                Tier::Premium,
                models::PREMIUM,
                &[models::PREMIUM_FALLBACK],
                200_000,
                0.015,
            ),
        ],
        rules: vec![
            TierRule::patterns(Tier::Free, &[r"(?i)^\s*(hi|hello|thanks)\b[\s!.]*$"]),
            TierRule::keywords(Tier::Premium, &["architecture", "security audit"]),
            TierRule::keywords(Tier::Balanced, &["refactor", "debug"]),
            TierRule::keywords(Tier::Economy, &["summarize", "translate"]),
        ],
        default_tier: Tier::Economy,
        session_pinning: true,
        failure_threshold: 3,
    }
}

/// Router over the fixture table
pub fn router() -> SmartRouter {
    SmartRouter::new(router_config()).expect("fixture config is valid")
}

/// Process configuration that never touches the environment
pub fn test_config(debug_enabled: bool) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        router_config_path: None,
        session_pinning: None,
        session_ttl_seconds: 0,
        debug_enabled,
    }
}

/// Test server over the real HTTP router, returning the shared engine too
pub fn test_server(debug_enabled: bool) -> (TestServer, Arc<SmartRouter>) {
    let router = Arc::new(router());
    let state = Arc::new(AppState::with_router(
        test_config(debug_enabled),
        router.clone(),
    ));
    let server =
        TestServer::new(create_router(state)).expect("Failed to create test server");
    (server, router)
}

/// Report enough failures to trip a model
pub fn trip(router: &SmartRouter, model: &str) {
    for _ in 0..3 {
        router.report_failure(model);
    }
}
