//! Calculation history of the authenticated caller.
//!
//! Every handler takes [`Authenticated`] as its first extractor, so a missing
//! or bad credential is rejected before the body is parsed or the ledger is
//! touched. The identity is then passed explicitly into each ledger call.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use costwise_core::{CalculationRecord, CostwiseResult};
use costwise_storage::CalculationLedger;

use crate::{
    error::{ApiError, ApiResult},
    extractors::{ApiJson, Authenticated},
    state::AppState,
    telemetry::metrics,
    types::{
        DeleteCalculationRequest, DeleteCalculationResponse, SaveCalculationRequest,
        UpdateCalculationRequest,
    },
    validation::require,
};

fn observed<T>(operation: &str, result: CostwiseResult<T>) -> CostwiseResult<T> {
    metrics::record_ledger_operation(operation, result.is_ok());
    result
}

/// POST /api/save-calculation - Save a calculation to the caller's history
#[utoipa::path(
    post,
    path = "/api/save-calculation",
    tag = "Calculations",
    request_body = SaveCalculationRequest,
    responses(
        (status = 201, description = "Calculation saved", body = CalculationRecord),
        (status = 400, description = "Missing or malformed field", body = ApiError),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
        (status = 409, description = "A calculation with this timestamp already exists", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_calculation(
    Authenticated(identity): Authenticated,
    State(ledger): State<CalculationLedger>,
    ApiJson(request): ApiJson<SaveCalculationRequest>,
) -> ApiResult<impl IntoResponse> {
    let calculation = request.into_new_calculation()?;
    let record = observed("save", ledger.save(&identity, calculation).await)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/user-calculations - The caller's calculations, newest first
#[utoipa::path(
    get,
    path = "/api/user-calculations",
    tag = "Calculations",
    responses(
        (status = 200, description = "Calculations ordered by timestamp descending", body = [CalculationRecord]),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_calculations(
    Authenticated(identity): Authenticated,
    State(ledger): State<CalculationLedger>,
) -> ApiResult<Json<Vec<CalculationRecord>>> {
    let records = observed("list", ledger.list(&identity).await)?;
    Ok(Json(records))
}

/// PUT /api/update-calculation - Replace the salary of one calculation
///
/// Only `salary` changes; the derived figures keep their saved values.
#[utoipa::path(
    put,
    path = "/api/update-calculation",
    tag = "Calculations",
    request_body = UpdateCalculationRequest,
    responses(
        (status = 200, description = "Updated calculation", body = CalculationRecord),
        (status = 400, description = "Missing timestamp or non-positive salary", body = ApiError),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
        (status = 404, description = "No calculation at this timestamp", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_calculation(
    Authenticated(identity): Authenticated,
    State(ledger): State<CalculationLedger>,
    ApiJson(request): ApiJson<UpdateCalculationRequest>,
) -> ApiResult<Json<CalculationRecord>> {
    let (timestamp, salary) = request.validate()?;
    let record = observed(
        "update",
        ledger.update_salary(&identity, timestamp, salary).await,
    )?;
    Ok(Json(record))
}

/// DELETE /api/delete-calculation - Delete one calculation
#[utoipa::path(
    delete,
    path = "/api/delete-calculation",
    tag = "Calculations",
    request_body = DeleteCalculationRequest,
    responses(
        (status = 200, description = "Calculation deleted", body = DeleteCalculationResponse),
        (status = 400, description = "Missing timestamp", body = ApiError),
        (status = 401, description = "Missing or invalid credential", body = ApiError),
        (status = 404, description = "No calculation at this timestamp", body = ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_calculation(
    Authenticated(identity): Authenticated,
    State(ledger): State<CalculationLedger>,
    ApiJson(request): ApiJson<DeleteCalculationRequest>,
) -> ApiResult<Json<DeleteCalculationResponse>> {
    let timestamp = require(request.timestamp, "timestamp")?;
    observed("delete", ledger.delete(&identity, timestamp).await)?;
    Ok(Json(DeleteCalculationResponse {
        message: "Calculation deleted".to_string(),
        timestamp,
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/save-calculation", post(save_calculation))
        .route("/user-calculations", get(list_calculations))
        .route("/update-calculation", put(update_calculation))
        .route("/delete-calculation", delete(delete_calculation))
}
