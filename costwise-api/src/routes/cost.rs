//! Per-city cost index lookups through the cache.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use costwise_core::CityCostRecord;
use costwise_storage::{CostIndexCache, StaleFallback};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiPath, ApiQuery},
    state::AppState,
    telemetry::metrics,
    types::CostQuery,
};

/// Response header naming where the record came from: `hit`, `refresh` or `stale`.
pub const CACHE_STATUS_HEADER: &str = "x-costwise-cache";

/// GET /api/cost/:city - Fresh cost indices for a city
///
/// Serves the cached record while it is inside the freshness window,
/// otherwise refreshes it from the pricing source.
#[utoipa::path(
    get,
    path = "/api/cost/{city}",
    tag = "Cost",
    params(
        ("city" = String, Path, description = "City name"),
        CostQuery,
    ),
    responses(
        (status = 200, description = "Cost indices for the city", body = CityCostRecord,
            headers(("x-costwise-cache" = String, description = "hit, refresh or stale"))),
        (status = 404, description = "Pricing source has no such city", body = ApiError),
        (status = 503, description = "Pricing source unavailable", body = ApiError),
        (status = 504, description = "Pricing source timed out", body = ApiError),
    ),
)]
pub async fn get_city_cost(
    State(cache): State<Arc<CostIndexCache>>,
    ApiPath(city): ApiPath<String>,
    ApiQuery(query): ApiQuery<CostQuery>,
) -> ApiResult<impl IntoResponse> {
    let fallback = if query.allow_stale {
        StaleFallback::Allow
    } else {
        StaleFallback::Reject
    };

    match cache.get_indices_with(&city, fallback).await {
        Ok(read) => {
            let source = read.source().as_str();
            metrics::record_cache_lookup(source);
            Ok(([(CACHE_STATUS_HEADER, source)], Json(read.into_value())))
        }
        Err(err) => {
            metrics::record_cache_lookup("error");
            Err(err.into())
        }
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/cost/:city", get(get_city_cost))
}
