use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use medfi::config::{AppConfig, CorsPolicy, RateLimit};
use medfi::{create_app, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::{app_with, get, seeded_store, send, setup};

#[tokio::test]
async fn test_health_check() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (status, body) = send(app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["store"], "memory");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_unknown_route_returns_envelope_404() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (status, body) = send(app, get("/api/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn test_list_campaigns_only_approved_newest_first() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (status, body) = send(app, get("/api/campaigns")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["fresh", "c1", "closed", "legacy"]);
}

#[tokio::test]
async fn test_list_campaigns_status_filter_and_pagination() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (_, body) = send(app.clone(), get("/api/campaigns?status=completed")).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], "closed");

    let (_, body) = send(app.clone(), get("/api/campaigns?limit=2&offset=1")).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["c1", "closed"]);

    // An empty page is still a success
    let (status, body) = send(app, get("/api/campaigns?offset=40")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], Value::Array(vec![]));
}

#[tokio::test]
async fn test_list_campaigns_rejects_malformed_limit() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (status, body) = send(app, get("/api/campaigns?limit=many")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_campaigns_store_failure_is_server_error() {
    setup();
    let store = Arc::new(seeded_store());
    store.fail_reads(true);
    let app = app_with(store);

    let (status, body) = send(app, get("/api/campaigns")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "connection refused: store is not accepting reads");
}

#[tokio::test]
async fn test_get_campaign() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (status, body) = send(app.clone(), get("/api/campaigns/c1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "c1");
    assert_eq!(body["data"]["raised_amount"], 100.0);
    assert_eq!(body["data"]["donor_count"], 3);

    let (status, body) = send(app, get("/api/campaigns/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Campaign not found");
}

#[tokio::test]
async fn test_list_packages_defaults_to_active_sorted_by_price() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (status, body) = send(app, get("/api/packages")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Vaccination pack", "Dental basic", "Family checkup"]);
}

#[tokio::test]
async fn test_list_packages_category_and_active_string_comparison() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (_, body) = send(app.clone(), get("/api/packages?category=preventive")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(app.clone(), get("/api/packages?active=false")).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "Retired plan");

    // Only the literal "true" selects active packages
    let (_, body) = send(app, get("/api/packages?active=1")).await;
    assert_eq!(body["data"][0]["name"], "Retired plan");
}

#[tokio::test]
async fn test_explorer_status_reports_presence_only() {
    setup();
    let mut config = AppConfig::default();
    config.explorer.algod_configured = true;
    let app = create_app(AppState::new(Arc::new(seeded_store()), config));

    let (status, body) = send(app, get("/api/explorer/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["network"], "testnet");
    assert_eq!(body["data"]["algod_configured"], true);
    assert_eq!(body["data"]["indexer_configured"], false);
    assert!(body["data"]["explorer_url"].as_str().unwrap().starts_with("https://"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let (status, body) = send(app, get("/api-doc/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/campaigns/{id}/fund").is_some());
}

fn with_origin(origin: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/health")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_allow_list_is_enforced() {
    setup();
    let app = app_with(Arc::new(seeded_store()));

    let response = app
        .clone()
        .oneshot(with_origin("http://localhost:5173"))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );

    let response = app.oneshot(with_origin("https://evil.example")).await.unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_any_origin_is_opt_in() {
    setup();
    let config = AppConfig {
        cors: CorsPolicy::AnyOrigin,
        ..AppConfig::default()
    };
    let app = create_app(AppState::new(Arc::new(seeded_store()), config));

    let response = app.oneshot(with_origin("https://evil.example")).await.unwrap();
    assert_eq!(response.headers().get("access-control-allow-origin").unwrap(), "*");
}

fn from_client(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limited_requests_use_error_envelope() {
    setup();
    let config = AppConfig {
        rate_limit: Some(RateLimit {
            per_minute: 1,
            burst: 1,
        }),
        ..AppConfig::default()
    };
    let app = create_app(AppState::new(Arc::new(seeded_store()), config));

    let (status, _) = send(app.clone(), from_client("/api/health", "203.0.113.7")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app.clone(), from_client("/api/health", "203.0.113.7")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Too many requests"));
    assert!(body.get("data").is_none());

    // Limits are per client address.
    let (status, _) = send(app, from_client("/api/health", "198.51.100.2")).await;
    assert_eq!(status, StatusCode::OK);
}
