use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::entities::{campaign, donation};
use crate::error::AppError;
use crate::funding::{fund_campaign, FundRequest};
use crate::response::{self, ApiResponse};
use crate::store::{CampaignFilter, Page};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CampaignListQuery {
    /// Optional: only campaigns with this status
    status: Option<String>,
    /// Page size (default: 50, max: 200)
    limit: Option<u64>,
    /// Rows to skip (default: 0)
    offset: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size (default: 50, max: 200)
    limit: Option<u64>,
    /// Rows to skip (default: 0)
    offset: Option<u64>,
}

/// List approved campaigns, newest first
#[utoipa::path(
    get,
    path = "/api/campaigns",
    params(CampaignListQuery),
    responses(
        (status = 200, description = "One page of approved campaigns", body = ApiResponse<Vec<campaign::Model>>),
        (status = 400, description = "Malformed query parameters"),
        (status = 500, description = "Store failure")
    )
)]
#[tracing::instrument(skip(state, query))]
pub async fn list_campaigns(
    State(state): State<AppState>,
    query: Result<Query<CampaignListQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let filter = CampaignFilter {
        status: query.status.filter(|s| !s.is_empty()),
        page: Page::new(query.limit, query.offset),
    };

    let campaigns = state.store.list_campaigns(&filter).await?;
    tracing::debug!(count = campaigns.len(), "campaigns listed");
    Ok(response::ok(campaigns))
}

/// Fetch a single campaign
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    params(("id" = String, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "The campaign", body = ApiResponse<campaign::Model>),
        (status = 404, description = "Campaign not found")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    match state.store.find_campaign(&id).await? {
        Some(campaign) => Ok(response::ok(campaign)),
        None => Err(AppError::NotFound("Campaign not found".to_string())),
    }
}

/// Fund a campaign
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/fund",
    params(("id" = String, Path, description = "Campaign id")),
    request_body = FundRequest,
    responses(
        (status = 201, description = "Donation recorded and campaign totals updated", body = ApiResponse<donation::Model>),
        (status = 400, description = "Missing or non-positive amount"),
        (status = 404, description = "Campaign not found"),
        (status = 500, description = "Donation could not be persisted")
    ),
    description = "Records one donation and adds it to the campaign's raised amount and donor count in a single transaction. Requests are not deduplicated: submitting the same body twice records two donations."
)]
#[tracing::instrument(skip(state, payload))]
pub async fn fund(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FundRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let donation = fund_campaign(state.store.as_ref(), &id, request).await?;
    Ok(response::created(donation))
}

/// List donations recorded against a campaign, newest first
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}/donations",
    params(("id" = String, Path, description = "Campaign id"), PageQuery),
    responses(
        (status = 200, description = "One page of donations", body = ApiResponse<Vec<donation::Model>>),
        (status = 404, description = "Campaign not found")
    )
)]
#[tracing::instrument(skip(state, query))]
pub async fn list_donations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    if state.store.find_campaign(&id).await?.is_none() {
        return Err(AppError::NotFound("Campaign not found".to_string()));
    }

    let donations = state
        .store
        .list_donations(&id, Page::new(query.limit, query.offset))
        .await?;
    Ok(response::ok(donations))
}
