//! Development Authentication Endpoints
//!
//! `POST /auth/dev/token` mints a token for any subject so the ledger routes
//! can be exercised locally. It answers 403 when `COSTWISE_ENVIRONMENT` is
//! production.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use crate::{
    auth::IdentityVerifier,
    config::Environment,
    error::{ApiError, ApiResult},
    extractors::ApiJson,
    state::AppState,
    types::{DevTokenRequest, DevTokenResponse},
};

const DEFAULT_DEV_SUBJECT: &str = "dev-user";

/// POST /auth/dev/token - Generate a development token
#[utoipa::path(
    post,
    path = "/auth/dev/token",
    tag = "Auth",
    request_body = DevTokenRequest,
    responses(
        (status = 200, description = "Signed bearer token", body = DevTokenResponse),
        (status = 403, description = "Disabled in production", body = ApiError),
    ),
)]
pub async fn generate_dev_token(
    State(environment): State<Environment>,
    State(verifier): State<Arc<IdentityVerifier>>,
    ApiJson(request): ApiJson<DevTokenRequest>,
) -> ApiResult<Json<DevTokenResponse>> {
    if environment.is_production() {
        return Err(ApiError::forbidden(
            "Dev authentication is disabled in production",
        ));
    }

    let subject = request
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DEV_SUBJECT.to_string());
    let token = verifier.issue(&subject, request.email.as_deref())?;

    tracing::info!(user_id = %subject, "Generated dev token");

    Ok(Json(DevTokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: verifier.config().jwt_expiration_secs,
        user_id: subject,
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/token", post(generate_dev_token))
}
