//! City listing, prefix search and manual cost index upserts.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use costwise_core::CityCostRecord;
use costwise_storage::{distinct_countries, CostIndexCache};

use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiJson, ApiQuery, Authenticated},
    state::AppState,
    types::{CitiesResponse, CitySearchQuery, CitySearchResult, CityUpsertRequest},
};

/// GET /api/cities - List cached cities and their countries
#[utoipa::path(
    get,
    path = "/api/cities",
    tag = "Cities",
    responses(
        (status = 200, description = "Cached cities ordered by name", body = CitiesResponse),
        (status = 500, description = "Storage failure", body = ApiError),
    ),
)]
pub async fn list_cities(
    State(cache): State<Arc<CostIndexCache>>,
) -> ApiResult<Json<CitiesResponse>> {
    let cities = cache.list_indices().await?;
    let countries = distinct_countries(&cities);
    Ok(Json(CitiesResponse { cities, countries }))
}

/// GET /api/cities/search - Prefix search over cached cities
///
/// Answers from the cache only; never calls the pricing source.
#[utoipa::path(
    get,
    path = "/api/cities/search",
    tag = "Cities",
    params(CitySearchQuery),
    responses(
        (status = 200, description = "Matching cities ordered by name", body = Vec<CitySearchResult>),
        (status = 400, description = "Missing query", body = ApiError),
    ),
)]
pub async fn search_cities(
    State(cache): State<Arc<CostIndexCache>>,
    ApiQuery(query): ApiQuery<CitySearchQuery>,
) -> ApiResult<Json<Vec<CitySearchResult>>> {
    let (prefix, limit) = query.validate()?;
    let hits = cache.search(&prefix, limit).await?;
    Ok(Json(hits.iter().map(CitySearchResult::from).collect()))
}

/// PUT /api/cities - Insert or overwrite a city record
///
/// Bypasses the freshness check. Used for seeding.
#[utoipa::path(
    put,
    path = "/api/cities",
    tag = "Cities",
    request_body = CityUpsertRequest,
    responses(
        (status = 200, description = "Stored record", body = CityCostRecord),
        (status = 400, description = "Invalid record", body = ApiError),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upsert_city(
    Authenticated(identity): Authenticated,
    State(cache): State<Arc<CostIndexCache>>,
    ApiJson(request): ApiJson<CityUpsertRequest>,
) -> ApiResult<Json<CityCostRecord>> {
    let record = request.into_record(cache.now())?;
    let record = cache.upsert_manual(record).await?;
    tracing::info!(owner = %identity.owner, city = %record.city, "City upserted via API");
    Ok(Json(record))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/cities", get(list_cities).put(upsert_city))
        .route("/cities/search", get(search_cities))
}
