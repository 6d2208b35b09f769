//! Affordability calculation.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use costwise_core::{calculate_for_city, Breakdown};
use costwise_storage::CostIndexCache;

use crate::{
    error::{ApiError, ApiResult},
    extractors::ApiJson,
    state::AppState,
    types::CalculateRequest,
};

/// POST /api/calculate - Affordability breakdown for a salary in a city
///
/// Uses only indices already in the cache; the pricing source is never
/// called from here.
#[utoipa::path(
    post,
    path = "/api/calculate",
    tag = "Calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Affordability breakdown", body = Breakdown),
        (status = 400, description = "Invalid salary or missing city", body = ApiError),
        (status = 404, description = "City not in the cache", body = ApiError),
    ),
)]
pub async fn calculate_affordability(
    State(cache): State<Arc<CostIndexCache>>,
    ApiJson(request): ApiJson<CalculateRequest>,
) -> ApiResult<Json<Breakdown>> {
    let (city, salary) = request.validate()?;
    let record = cache.peek(&city).await?;
    let breakdown = calculate_for_city(&city, salary, record.as_ref())?;
    Ok(Json(breakdown))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/calculate", post(calculate_affordability))
}
