use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::{self, ApiResponse};
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    /// Always "ok" when the process answers
    status: &'static str,
    service: &'static str,
    /// Store backend in use ("postgres" or "memory")
    store: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExplorerStatus {
    /// Algorand network name
    network: String,
    /// Whether an algod endpoint is configured
    algod_configured: bool,
    /// Whether an indexer endpoint is configured
    indexer_configured: bool,
    /// Block explorer base URL for transaction links
    explorer_url: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = ApiResponse<HealthStatus>)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    response::ok(HealthStatus {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        store: state.store.backend_tag(),
        timestamp: Utc::now(),
    })
}

/// Blockchain integration configuration
#[utoipa::path(
    get,
    path = "/api/explorer/status",
    responses(
        (status = 200, description = "Which Algorand endpoints are configured", body = ApiResponse<ExplorerStatus>)
    )
)]
pub async fn explorer_status(State(state): State<AppState>) -> Response {
    let explorer = &state.config.explorer;
    response::ok(ExplorerStatus {
        network: explorer.network.clone(),
        algod_configured: explorer.algod_configured,
        indexer_configured: explorer.indexer_configured,
        explorer_url: explorer.explorer_url.clone(),
    })
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::failure("Endpoint not found")),
    )
        .into_response()
}
