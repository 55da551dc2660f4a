use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::entities::health_package;
use crate::error::AppError;
use crate::response::{self, ApiResponse};
use crate::store::PackageFilter;
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PackageQuery {
    /// Optional: only packages in this category
    category: Option<String>,
    /// "true" lists active packages, anything else inactive ones (default: "true")
    #[serde(default = "default_active")]
    active: String,
}

fn default_active() -> String {
    "true".to_string()
}

/// List health packages, cheapest first
#[utoipa::path(
    get,
    path = "/api/packages",
    params(PackageQuery),
    responses(
        (status = 200, description = "Matching health packages", body = ApiResponse<Vec<health_package::Model>>),
        (status = 500, description = "Store failure")
    )
)]
#[tracing::instrument(skip(state, query))]
pub async fn list_packages(
    State(state): State<AppState>,
    query: Result<Query<PackageQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let filter = PackageFilter {
        // Compared as a string on purpose: `?active=1` selects inactive packages.
        active: query.active == "true",
        category: query.category.filter(|c| !c.is_empty()),
    };

    let packages = state.store.list_packages(&filter).await?;
    Ok(response::ok(packages))
}
