//! Costwise API - REST Layer
//!
//! Axum service exposing accounts, the cost index cache, the affordability
//! calculator and the per-user calculation ledger. Bearer tokens are verified by the
//! [`IdentityVerifier`]; the resulting identity is handed to ledger calls
//! explicitly by each handler.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod macros;
pub mod openapi;
pub mod pricing;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use accounts::AccountService;
pub use auth::{AuthConfig, Claims, IdentityVerifier, JwtSecret};
pub use config::{ApiConfig, Environment, LogFormat, PricingConfig, StorageBackend};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use extractors::{ApiJson, ApiPath, ApiQuery, Authenticated};
pub use openapi::ApiDoc;
pub use pricing::NumbeoClient;
pub use routes::create_api_router;
pub use state::{AppState, StateOptions};
pub use types::*;
