//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use safetrack::api::{create_app, AppState};
use safetrack::llm::DisabledGenerator;
use safetrack::{Orchestrator, SafetyConfig};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_state(social_threshold_secs: f64) -> AppState {
    let mut config = SafetyConfig::default();
    config.escalation.social_threshold_secs = social_threshold_secs;
    let orchestrator = Orchestrator::new(&config, Arc::new(DisabledGenerator::new("test")));
    AppState::new(Arc::new(orchestrator), Arc::new(config), "disabled")
}

async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
    let app = create_app(create_test_state(30.0));
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let app = create_app(create_test_state(300.0));
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn hot_car_telemetry(seconds_unacknowledged: f64) -> Value {
    json!({
        "buckle_state": "BUCKLED",
        "motion_state": "STILL",
        "outside_temp_f": 92,
        "t_still": 200,
        "t_unacknowledged": seconds_unacknowledged,
        "gps": { "lat": 29.7604, "lon": -95.3698 }
    })
}

// ============================================================================
// /orchestrate
// ============================================================================

#[tokio::test]
async fn orchestrate_alert_returns_three_tier_plan() {
    let (status, body) = post_json(
        "/orchestrate",
        json!({ "telemetry": hot_car_telemetry(35.0), "acked": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);
    assert_eq!(body["plan"]["state"], "ALERT");

    let steps = body["plan"]["steps"].as_array().unwrap();
    let tiers: Vec<u64> = steps.iter().map(|s| s["tier"].as_u64().unwrap()).collect();
    assert_eq!(tiers, vec![1, 2, 3]);
    assert_eq!(steps[0]["channel"], "push");
    assert_eq!(steps[1]["channel"], "sms");
    assert_eq!(steps[2]["channel"], "social");
    assert!(steps[0]["content"]["title"].is_string());
    assert!(steps[2]["content"]["post"]
        .as_str()
        .unwrap()
        .contains("29.7604"));

    assert_eq!(body["trace"].as_array().unwrap().len(), 6);
    assert_eq!(body["full_pipeline"].as_array().unwrap().len(), 6);
    assert_eq!(body["trace"][0]["stage"], "Client");
    assert_eq!(body["trace"][5]["stage"], "ComplianceFilter");
}

#[tokio::test]
async fn orchestrate_below_public_gate_omits_social_tier() {
    let (status, body) = post_json(
        "/orchestrate",
        json!({ "telemetry": hot_car_telemetry(10.0) }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let tiers: Vec<u64> = body["plan"]["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["tier"].as_u64().unwrap())
        .collect();
    assert_eq!(tiers, vec![1, 2]);
}

#[tokio::test]
async fn orchestrate_safe_short_circuits() {
    let (status, body) = post_json(
        "/orchestrate",
        json!({ "telemetry": { "buckle_state": "UNBUCKLED", "outside_temp_f": 100 } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"]["state"], "SAFE");
    assert_eq!(body["plan"]["steps"].as_array().unwrap().len(), 0);
    let stages: Vec<&str> = body["trace"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, vec!["Client", "Normalizer", "RiskEvaluator"]);
}

#[tokio::test]
async fn orchestrate_acked_is_watch() {
    let (status, body) = post_json(
        "/orchestrate",
        json!({ "telemetry": hot_car_telemetry(35.0), "acked": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"]["state"], "WATCH");
    assert!(body["plan"]["steps"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn orchestrate_malformed_body_is_400() {
    let app = create_app(create_test_state(30.0));
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orchestrate")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// /agents/:name
// ============================================================================

#[tokio::test]
async fn unknown_agent_is_404() {
    let (status, body) = post_json("/agents/SensingAgent", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown agent: SensingAgent");
}

#[tokio::test]
async fn direct_normalizer_call_returns_features() {
    let envelope = json!({
        "kind": "Message",
        "from": "Client",
        "to": "Normalizer",
        "intent": "NORMALIZE_TELEMETRY",
        "payload": { "type": "telemetry", "telemetry": hot_car_telemetry(0.0), "acked": false },
        "trace": [{ "stage": "Client", "intent": "START", "timestamp": "2026-01-01T00:00:00Z" }]
    });
    let (status, body) = post_json("/agents/Normalizer", envelope).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "Message");
    assert_eq!(body["from"], "Normalizer");
    assert_eq!(body["to"], "RiskEvaluator");
    assert_eq!(body["payload"]["type"], "features");
    assert_eq!(body["payload"]["features"]["present"], true);
    assert_eq!(body["payload"]["features"]["outsideTempF"], 92.0);
    assert_eq!(body["trace"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn direct_call_with_error_envelope_answers_invalid_message() {
    let envelope = json!({
        "kind": "Error",
        "stage": "Normalizer",
        "code": "PROCESS_FAILED",
        "detail": "upstream",
        "timestamp": "2026-01-01T00:00:00Z"
    });
    let (status, body) = post_json("/agents/RiskEvaluator", envelope).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "Error");
    assert_eq!(body["stage"], "RiskEvaluator");
    assert_eq!(body["code"], "INVALID_MESSAGE");
}

#[tokio::test]
async fn direct_call_with_wrong_payload_answers_invalid_message() {
    let envelope = json!({
        "kind": "Message",
        "from": "Client",
        "to": "EscalationPlanner",
        "intent": "DELIVER_OR_ESCALATE",
        "payload": { "type": "telemetry", "telemetry": {} },
        "trace": [{ "stage": "Client", "intent": "START", "timestamp": "2026-01-01T00:00:00Z" }]
    });
    let (status, body) = post_json("/agents/EscalationPlanner", envelope).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "Error");
    assert_eq!(body["code"], "INVALID_MESSAGE");
}

// ============================================================================
// Status endpoints
// ============================================================================

#[tokio::test]
async fn health_lists_stages_in_chain_order() {
    let (status, body) = get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["generator"], "disabled");
    assert_eq!(
        body["stages"],
        json!([
            "Normalizer",
            "RiskEvaluator",
            "NotificationCrafter",
            "EscalationPlanner",
            "ComplianceFilter"
        ])
    );
}

#[tokio::test]
async fn config_exposes_thresholds_without_secrets() {
    let (status, body) = get_json("/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk"]["temperature_threshold_f"], 85.0);
    assert_eq!(body["escalation"]["social_threshold_secs"], 300.0);
    assert_eq!(body["generator"]["api_key_env"], "AI_STUDIO_API_KEY");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = create_app(create_test_state(300.0));
    let resp = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
