//! REST API Routes Module
//!
//! Route handlers grouped by resource:
//! - `/api/register`, `/api/login` - accounts (public)
//! - `/api/cities`, `/api/cities/search`, `/api/cost/:city` - cost index cache
//! - `/api/calculate` - affordability calculator
//! - `/api/save-calculation` and friends - calculation ledger (authenticated)
//! - `/health/*` - liveness and readiness (public)
//! - `/metrics`, `/openapi.json` - observability and docs (public)
//! - `/auth/dev/token` - development tokens (403 in production)

pub mod accounts;
pub mod calculate;
pub mod calculations;
pub mod cities;
pub mod cost;
pub mod dev_auth;
pub mod health;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method, Uri},
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// OPENAPI / FALLBACK
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::route_not_found(uri.path())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set COSTWISE_CORS_ORIGINS.",
        ));
    }
    if config.pricing.api_key.trim().is_empty() {
        tracing::warn!(
            "No RapidAPI key configured - cache misses will fail with UPSTREAM_UNAVAILABLE.\n\
             Set COSTWISE_RAPIDAPI_KEY to enable refreshes."
        );
    }
    Ok(())
}

// ============================================================================
// ROUTER
// ============================================================================

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(accounts::create_router())
        .merge(cities::create_router())
        .merge(cost::create_router())
        .merge(calculate::create_router())
        .merge(calculations::create_router())
}

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS - handles preflight requests
/// 2. TraceLayer - per-request spans from tower-http
/// 3. Observability - route-labelled metrics and request logs
///
/// Authentication is not a layer: ledger and upsert handlers take the
/// [`Authenticated`](crate::extractors::Authenticated) extractor.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> ApiResult<Router> {
    if config.is_production() {
        validate_api_config_for_production(config)?;
    }

    let router = Router::new()
        .nest("/api", api_routes())
        .nest("/health", health::create_router())
        .nest("/auth/dev", dev_auth::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .fallback(route_not_found)
        .with_state(state);

    let cors = build_cors_layer(config);

    Ok(router
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// Otherwise only the configured origins are allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static(cost::CACHE_STATUS_HEADER)])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any).expose_headers(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_production_requires_cors_origins() {
        let config = ApiConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        let err = validate_api_config_for_production(&config).unwrap_err();
        assert!(err.message.contains("COSTWISE_CORS_ORIGINS"));

        let config = ApiConfig {
            environment: Environment::Production,
            cors_origins: vec!["https://costwise.app".to_string()],
            ..Default::default()
        };
        assert!(validate_api_config_for_production(&config).is_ok());
    }
}
