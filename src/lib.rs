use axum::{
    http::{HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorError, GovernorLayer,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod funding;
pub mod jobs;
pub mod response;
pub mod routes;
pub mod store;

use config::{AppConfig, CorsPolicy, RateLimit};
use error::AppError;
use store::FundingStore;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FundingStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn FundingStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MedFi API",
        version = "0.1.0",
        description = "Campaign funding, health packages and blockchain integration status"
    ),
    paths(
        routes::health_check,
        routes::list_campaigns,
        routes::get_campaign,
        routes::fund,
        routes::list_donations,
        routes::list_packages,
        routes::explorer_status
    ),
    components(schemas(
        entities::campaign::Model,
        entities::donation::Model,
        entities::health_package::Model,
        funding::FundRequest,
        routes::HealthStatus,
        routes::ExplorerStatus
    ))
)]
pub struct ApiDoc;

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let origin = match policy {
        CorsPolicy::AnyOrigin => AllowOrigin::from(Any),
        CorsPolicy::AllowList(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(origin = %o, "ignoring malformed CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Renders governor rejections in the same envelope as every other error,
/// keeping its rate limit headers.
fn rate_limit_rejection(error: GovernorError) -> Response {
    let (app_error, headers) = match error {
        GovernorError::TooManyRequests { wait_time, headers } => (
            AppError::TooManyRequests(format!("Too many requests, retry in {}s", wait_time)),
            headers,
        ),
        GovernorError::UnableToExtractKey => (
            AppError::Internal("unable to determine client address".to_string()),
            None,
        ),
        GovernorError::Other { msg, headers, .. } => (
            AppError::Internal(msg.unwrap_or_else(|| "request rejected".to_string())),
            headers,
        ),
    };

    let mut response = app_error.into_response();
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
}

fn rate_limited(api_routes: Router<AppState>, limit: RateLimit) -> Router<AppState> {
    // Spread `per_minute` requests evenly over the minute, on top of the burst.
    let period = Duration::from_millis((60_000 / u64::from(limit.per_minute.max(1))).max(1));
    let governor_conf = GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .period(period)
        .burst_size(limit.burst)
        .error_handler(rate_limit_rejection)
        .finish();

    match governor_conf {
        Some(config) => api_routes.layer(GovernorLayer {
            config: Arc::new(config),
        }),
        None => {
            tracing::warn!(?limit, "invalid rate limit settings; rate limiting disabled");
            api_routes
        }
    }
}

/// Create the application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let api_doc = ApiDoc::openapi();

    let mut api_routes = Router::new()
        .route("/api/health", get(routes::health_check))
        .route("/api/campaigns", get(routes::list_campaigns))
        .route("/api/campaigns/{id}", get(routes::get_campaign))
        .route("/api/campaigns/{id}/fund", post(routes::fund))
        .route("/api/campaigns/{id}/donations", get(routes::list_donations))
        .route("/api/packages", get(routes::list_packages))
        .route("/api/explorer/status", get(routes::explorer_status));

    if let Some(limit) = state.config.rate_limit {
        api_routes = rate_limited(api_routes, limit);
    }

    let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", api_doc);
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .merge(api_routes)
        .merge(docs_router)
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
