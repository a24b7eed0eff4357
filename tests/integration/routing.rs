//! Routing engine tests through the public API
//!
//! Covers classification, health-filtered fallback, session affinity and
//! statistics as a caller embedding the library sees them.

use std::thread;

use pretty_assertions::assert_eq;
use tier_router::{RouteRequest, RouterConfig, RouterError, SmartRouter, Tier};

use crate::common::{self, models};

#[test]
fn test_greeting_routes_to_free_tier() {
    let router = common::router();

    let result = router.route(&RouteRequest::new("hello!")).unwrap();

    assert_eq!(result.tier, Tier::Free);
    assert_eq!(result.model, models::LOCAL);
    assert_eq!(result.estimated_cost_per_1k, 0.0);
    assert!(!result.from_cache);
    assert!(result.reason.contains("pattern match"));
}

#[test]
fn test_premium_keyword_wins_over_economy_keyword() {
    let router = common::router();

    let result = router
        .route(&RouteRequest::new(
            "Summarize the security audit findings for the board",
        ))
        .unwrap();

    assert_eq!(result.tier, Tier::Premium);
    assert_eq!(result.model, models::PREMIUM);
    assert_eq!(result.reason, "tier 3: keyword match 'security audit'");
}

#[test]
fn test_unmatched_message_uses_default_tier() {
    let router = common::router();

    let result = router
        .route(&RouteRequest::new("what should I cook tonight"))
        .unwrap();

    assert_eq!(result.tier, Tier::Economy);
    assert_eq!(result.model, models::ECONOMY);
    assert_eq!(result.reason, "default tier: no rule matched");
}

#[test]
fn test_fallback_chain_and_recovery() {
    let router = common::router();
    let request = RouteRequest::new("please refactor this module");

    common::trip(&router, models::BALANCED);
    let result = router.route(&request).unwrap();
    assert_eq!(result.model, models::BALANCED_FALLBACK);
    assert!(result.reason.contains("fallback to 'bal-b'"));

    // One success restores the primary
    router.report_success(models::BALANCED, 120);
    let result = router.route(&request).unwrap();
    assert_eq!(result.model, models::BALANCED);
}

#[test]
fn test_two_failures_do_not_trip() {
    let router = common::router();
    router.report_failure(models::PREMIUM);
    router.report_failure(models::PREMIUM);

    let result = router
        .route(&RouteRequest::new("design the architecture"))
        .unwrap();

    assert_eq!(result.model, models::PREMIUM);
    assert!(router.health().is_healthy(models::PREMIUM));
}

#[test]
fn test_exhausted_tier_still_routes() {
    let router = common::router();
    common::trip(&router, models::ECONOMY);
    common::trip(&router, models::ECONOMY_FALLBACK);

    let result = router.route(&RouteRequest::new("translate this")).unwrap();

    assert_eq!(result.tier, Tier::Economy);
    assert_eq!(result.model, models::ECONOMY_FALLBACK);
    assert!(result.reason.contains("all candidates unhealthy"));
    assert_eq!(router.stats().degraded, 1);
}

#[test]
fn test_session_keeps_tier_across_turns() {
    let router = common::router();

    let first = router
        .route(
            &RouteRequest::new("debug this crash")
                .with_session("conv-1")
                .with_agent("planner"),
        )
        .unwrap();
    assert_eq!(first.tier, Tier::Balanced);
    assert!(!first.from_cache);

    // A follow-up that alone would classify as Free stays on the pinned tier
    let second = router
        .route(&RouteRequest::new("thanks").with_session("conv-1"))
        .unwrap();
    assert_eq!(second.tier, Tier::Balanced);
    assert_eq!(second.model, first.model);
    assert!(second.from_cache);
    assert_eq!(second.reason, "session-pinned: tier 2");

    // Another session is independent
    let other = router
        .route(&RouteRequest::new("thanks").with_session("conv-2"))
        .unwrap();
    assert_eq!(other.tier, Tier::Free);
}

#[test]
fn test_forced_tier_does_not_touch_session() {
    let router = common::router();
    router
        .route(&RouteRequest::new("summarize").with_session("conv-1"))
        .unwrap();

    let forced = router
        .route(
            &RouteRequest::new("summarize")
                .with_session("conv-1")
                .with_force_tier(Tier::Premium),
        )
        .unwrap();
    assert_eq!(forced.tier, Tier::Premium);
    assert!(!forced.from_cache);

    let pinned = router.sessions().get("conv-1").unwrap();
    assert_eq!(pinned.tier, Tier::Economy);
}

#[test]
fn test_large_context_escalates() {
    let router = common::router();

    let result = router
        .route(&RouteRequest::new("summarize this transcript").with_context_tokens(50_000))
        .unwrap();

    assert_eq!(result.tier, Tier::Balanced);
    assert!(result.reason.contains("escalated to tier 2"));
    assert_eq!(router.stats().escalations, 1);
}

#[test]
fn test_unconfigured_tier_is_an_error() {
    let mut config = common::router_config();
    config.tiers.retain(|t| t.tier != Tier::Premium);
    let router = SmartRouter::new(config).unwrap();

    let err = router
        .route(&RouteRequest::new("anything").with_force_tier(Tier::Premium))
        .unwrap_err();

    assert_eq!(
        err,
        RouterError::Configuration("tier 3 is not configured".to_string())
    );
}

#[test]
fn test_default_router_config_routes() {
    let router = SmartRouter::new(RouterConfig::default()).unwrap();

    let result = router
        .route(&RouteRequest::new("Review the architecture of our distributed system"))
        .unwrap();

    assert_eq!(result.tier, Tier::Premium);
    assert_eq!(result.model, "claude-3-opus");
}

#[test]
fn test_stats_track_every_route() {
    let router = common::router();
    router.route(&RouteRequest::new("hello")).unwrap();
    router.route(&RouteRequest::new("refactor")).unwrap();
    router
        .route(&RouteRequest::new("refactor").with_session("s"))
        .unwrap();
    router
        .route(&RouteRequest::new("refactor").with_session("s"))
        .unwrap();

    let stats = router.stats();
    assert_eq!(stats.total_requests, 4);
    assert_eq!(stats.by_tier.get(&0), Some(&1));
    assert_eq!(stats.by_tier.get(&2), Some(&3));
    assert_eq!(stats.by_model.get(models::BALANCED), Some(&3));
    assert_eq!(stats.session_cache_hits, 1);
    assert!(stats.average_latency_ms >= 0.0);
}

#[test]
fn test_concurrent_routing_and_reporting() {
    let router = common::router();

    thread::scope(|scope| {
        for worker in 0..8 {
            let router = &router;
            scope.spawn(move || {
                for i in 0..50 {
                    let session = format!("session-{}", worker);
                    let result = router
                        .route(&RouteRequest::new("refactor the parser").with_session(session))
                        .unwrap();
                    assert_eq!(result.tier, Tier::Balanced);
                    if i % 10 == 0 {
                        router.report_success(&result.model, 50);
                    }
                }
            });
        }
    });

    let stats = router.stats();
    assert_eq!(stats.total_requests, 400);
    assert_eq!(stats.session_cache_hits, 392);
    assert_eq!(router.sessions().len(), 8);
}

#[test]
fn test_concurrent_routes_on_one_session_agree() {
    let router = common::router();

    let picked: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let router = &router;
                scope.spawn(move || {
                    router
                        .route(&RouteRequest::new("debug it").with_session("shared"))
                        .unwrap()
                        .model
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(picked.iter().all(|m| m == models::BALANCED));
    assert_eq!(router.stats().session_cache_hits, 7);
}
