//! Account Routes
//!
//! `POST /api/register` creates an account; `POST /api/login` trades an
//! email and password for a bearer token whose subject is the account's
//! user id. Both are public.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::{
    accounts::AccountService,
    auth::IdentityVerifier,
    error::{ApiError, ApiResult},
    extractors::ApiJson,
    state::AppState,
    types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
};

/// POST /api/register - Create an account
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "Accounts",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing or invalid field", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError),
    ),
)]
pub async fn register(
    State(accounts): State<AccountService>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let registration = request.validate()?;
    let account = accounts.register(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: account.user_id.to_string(),
        }),
    ))
}

/// POST /api/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed bearer token", body = LoginResponse),
        (status = 400, description = "Missing field", body = ApiError),
        (status = 401, description = "Unknown email or wrong password", body = ApiError),
    ),
)]
pub async fn login(
    State(accounts): State<AccountService>,
    State(verifier): State<Arc<IdentityVerifier>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (email, password) = request.validate()?;
    let account = accounts.authenticate(&email, &password).await?;
    let token = verifier.issue(account.user_id.as_str(), Some(account.email.as_str()))?;

    tracing::info!(user_id = %account.user_id, "Issued login token");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: verifier.config().jwt_expiration_secs,
        user_id: account.user_id.to_string(),
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
