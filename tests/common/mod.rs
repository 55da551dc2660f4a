#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt; // For Response body handling
use medfi::config::AppConfig;
use medfi::entities::{campaign, health_package};
use medfi::store::MemoryStore;
use medfi::{create_app, AppState};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::{Arc, Once};
use tower::ServiceExt; // For oneshot
use uuid::Uuid;

// For initializing tracing once
static INIT: Once = Once::new();

// Setup function for tests
pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

pub fn campaign(id: &str, raised: Option<i64>, donors: Option<i32>, day: u32) -> campaign::Model {
    campaign::Model {
        id: id.to_string(),
        title: format!("Campaign {id}"),
        description: Some("Community clinic equipment".to_string()),
        approved: true,
        status: "active".to_string(),
        goal_amount: Some(Decimal::new(10_000, 0)),
        raised_amount: raised.map(|r| Decimal::new(r, 0)),
        current_amount: raised.map(|r| Decimal::new(r, 0)),
        donor_count: donors,
        created_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
    }
}

pub fn package(name: &str, category: &str, price: i64, active: bool) -> health_package::Model {
    health_package::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        category: category.to_string(),
        price: Decimal::new(price, 0),
        active,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// Campaigns used across the suite:
/// - `c1`: 100 raised by 3 donors
/// - `fresh`: zero totals
/// - `legacy`: NULL totals
/// - `closed`: approved, status "completed"
/// - `hidden`: not approved
pub fn seeded_store() -> MemoryStore {
    let mut closed = campaign("closed", Some(5_000), Some(40), 2);
    closed.status = "completed".to_string();
    let mut hidden = campaign("hidden", Some(0), Some(0), 20);
    hidden.approved = false;

    MemoryStore::new()
        .with_campaigns(vec![
            campaign("c1", Some(100), Some(3), 10),
            campaign("fresh", Some(0), Some(0), 15),
            campaign("legacy", None, None, 1),
            closed,
            hidden,
        ])
        .with_packages(vec![
            package("Family checkup", "preventive", 120, true),
            package("Dental basic", "dental", 60, true),
            package("Vaccination pack", "preventive", 45, true),
            package("Retired plan", "preventive", 10, false),
        ])
}

pub fn app_with(store: Arc<MemoryStore>) -> Router {
    create_app(AppState::new(store, AppConfig::default()))
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
