//! Costwise API Server Entry Point
//!
//! Reads configuration from the environment, opens the configured store and
//! starts the Axum HTTP server.

use axum::Router;
use costwise_api::telemetry::{init_tracing, TelemetryConfig};
use costwise_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let api_config = ApiConfig::from_env()?;

    let environment = if api_config.is_production() {
        "production"
    } else {
        "development"
    };
    init_tracing(&TelemetryConfig::new(environment, api_config.log_format))?;

    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production(api_config.is_production())?;

    let state = AppState::from_config(&api_config, auth_config).await?;
    let app: Router = create_api_router(state, &api_config)?;

    let addr = api_config.bind_addr;
    tracing::info!(%addr, storage = ?api_config.storage, "Starting Costwise API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
