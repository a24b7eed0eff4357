//! HTTP endpoint tests
//!
//! Drive the full axum router with a fixture routing table:
//! - POST /v1/route, POST /v1/outcome
//! - GET /v1/stats, /v1/models/health, /v1/tiers
//! - GET /health, /health/ready, /health/live, /metrics
//! - GET /debug/sessions/:session_id (debug only)

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{self, models};

#[tokio::test]
async fn test_route_endpoint_classifies() {
    let (server, _) = common::test_server(false);

    let response = server
        .post("/v1/route")
        .json(&json!({ "message": "please refactor the storage layer" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["model"], models::BALANCED);
    assert_eq!(body["tier"], 2);
    assert_eq!(body["from_cache"], false);
    assert_eq!(body["reason"], "tier 2: keyword match 'refactor'");
    assert!(body["estimated_cost_per_1k"].as_f64().is_some());
}

#[tokio::test]
async fn test_route_endpoint_forced_tier() {
    let (server, _) = common::test_server(false);

    let response = server
        .post("/v1/route")
        .json(&json!({ "message": "", "force_tier": 3 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["tier"], 3);
    assert_eq!(body["reason"], "forced: tier 3");
}

#[tokio::test]
async fn test_route_endpoint_rejects_empty_message() {
    let (server, router) = common::test_server(false);

    let response = server.post("/v1/route").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(router.stats().total_requests, 0);
}

#[tokio::test]
async fn test_route_endpoint_rejects_unknown_tier() {
    let (server, _) = common::test_server(false);

    let response = server
        .post("/v1/route")
        .json(&json!({ "message": "hi", "force_tier": 7 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_outcome_reports_drive_fallback() {
    let (server, _) = common::test_server(false);

    for _ in 0..3 {
        server
            .post("/v1/outcome")
            .json(&json!({ "model": models::PREMIUM, "success": false }))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    let response = server
        .post("/v1/route")
        .json(&json!({ "message": "architecture review" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["model"], models::PREMIUM_FALLBACK);

    let health: Value = server.get("/v1/models/health").await.json();
    assert_eq!(health["failure_threshold"], 3);
    assert_eq!(health["models"][models::PREMIUM]["healthy"], false);
    assert_eq!(health["models"][models::PREMIUM]["consecutive_errors"], 3);

    server
        .post("/v1/outcome")
        .json(&json!({ "model": models::PREMIUM, "success": true, "latency_ms": 800 }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let health: Value = server.get("/v1/models/health").await.json();
    assert_eq!(health["models"][models::PREMIUM]["healthy"], true);
    assert_eq!(health["models"][models::PREMIUM]["last_latency_ms"], 800);
}

#[tokio::test]
async fn test_outcome_rejects_empty_model() {
    let (server, _) = common::test_server(false);

    let response = server
        .post("/v1/outcome")
        .json(&json!({ "model": " ", "success": true }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_outcome_rejects_unknown_model() {
    let (server, router) = common::test_server(false);

    let response = server
        .post("/v1/outcome")
        .json(&json!({ "model": "not-configured", "success": false }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(router.health().snapshot().is_empty());
}

#[tokio::test]
async fn test_session_pinning_over_http() {
    let (server, _) = common::test_server(false);

    let first: Value = server
        .post("/v1/route")
        .json(&json!({ "message": "debug the scheduler", "session_id": "conv-9" }))
        .await
        .json();
    let second: Value = server
        .post("/v1/route")
        .json(&json!({ "message": "hello", "session_id": "conv-9" }))
        .await
        .json();

    assert_eq!(first["tier"], 2);
    assert_eq!(second["tier"], 2);
    assert_eq!(second["from_cache"], true);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (server, _) = common::test_server(false);

    server
        .post("/v1/route")
        .json(&json!({ "message": "hello" }))
        .await
        .assert_status_ok();
    server
        .post("/v1/route")
        .json(&json!({ "message": "summarize the notes" }))
        .await
        .assert_status_ok();

    let response = server.get("/v1/stats").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_requests"], 2);
    assert_eq!(body["by_tier"]["0"], 1);
    assert_eq!(body["by_tier"]["1"], 1);
    assert_eq!(body["by_model"][models::LOCAL], 1);
    assert!(body.get("average_latency_ms").is_some());
    assert_eq!(body["session_cache_hits"], 0);
}

#[tokio::test]
async fn test_tiers_endpoint() {
    let (server, _) = common::test_server(false);

    let response = server.get("/v1/tiers").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["default_tier"], 1);
    assert_eq!(body["session_pinning"], true);
    let tiers = body["tiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 4);
    assert_eq!(tiers[0]["tier"], 0);
    assert_eq!(tiers[3]["primary"], models::PREMIUM);
}

#[tokio::test]
async fn test_health_endpoints() {
    let (server, router) = common::test_server(false);

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body.get("version").is_some());
    assert!(body.get("timestamp").is_some());
    assert_eq!(body["tiers"].as_array().unwrap().len(), 4);

    common::trip(&router, models::LOCAL);
    let body: Value = server.get("/health").await.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["tiers"][0]["status"], "degraded");
    assert_eq!(body["tiers"][0]["healthy_models"], 0);
    assert_eq!(body["tiers"][0]["name"], "free");
    assert_eq!(body["unhealthy_models"][0]["model"], models::LOCAL);
    assert_eq!(body["unhealthy_models"][0]["consecutive_errors"], 3);

    for path in ["/health/ready", "/health/live"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
    }
}

#[tokio::test]
async fn test_metrics_endpoint() {
    tier_router::routes::metrics::init_metrics();
    let (server, _) = common::test_server(false);

    server
        .post("/v1/route")
        .json(&json!({ "message": "hello" }))
        .await
        .assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response.text().contains("tier_router_requests_total"));
}

#[tokio::test]
async fn test_debug_session_endpoint_requires_debug() {
    let (server, _) = common::test_server(false);
    server
        .get("/debug/sessions/conv-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let (server, _) = common::test_server(true);
    server
        .get("/debug/sessions/conv-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/v1/route")
        .json(&json!({ "message": "translate this", "session_id": "conv-1" }))
        .await
        .assert_status_ok();

    let response = server.get("/debug/sessions/conv-1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["tier"], 1);
    assert_eq!(body["model"], models::ECONOMY);
}
