//! HTTP error envelope.
//!
//! Every failure leaves the server as `{ code, message, details? }` with the
//! status implied by its [`ErrorCode`]. Domain errors and axum extractor
//! rejections convert into [`ApiError`] here, so handlers only ever `?`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use costwise_core::{AuthError, CostwiseError, EntityType, StorageError, UpstreamError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Stable, machine-readable error codes.
///
/// Each code maps to a specific HTTP status code so clients can tell
/// "fix your input" from "not authorized" from "try again later".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// No bearer credential was presented
    MissingCredential,

    /// Credential is malformed, expired, or has a bad signature
    InvalidCredential,

    /// Operation is not permitted in this deployment
    Forbidden,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// No cost indices for the requested city
    CityNotFound,

    /// Caller has no calculation at the given timestamp
    CalculationNotFound,

    /// No route matches the request
    RouteNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Caller already has a calculation at this timestamp
    DuplicateTimestamp,

    /// An account is already registered for this email
    EmailTaken,

    // ========================================================================
    // Upstream and Server Errors (500, 503, 504)
    // ========================================================================
    /// External pricing source is unreachable or errored
    UpstreamUnavailable,

    /// External pricing source did not answer in time
    UpstreamTimeout,

    /// Storage backend failed
    StorageError,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::MissingCredential | ErrorCode::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }

            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::InvalidInput | ErrorCode::MissingField => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::CityNotFound | ErrorCode::CalculationNotFound | ErrorCode::RouteNotFound => {
                StatusCode::NOT_FOUND
            }

            ErrorCode::DuplicateTimestamp | ErrorCode::EmailTaken => StatusCode::CONFLICT,

            ErrorCode::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::StorageError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::MissingCredential => "Authentication required",
            ErrorCode::InvalidCredential => "Invalid authentication token",
            ErrorCode::Forbidden => "Access forbidden",

            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",

            ErrorCode::CityNotFound => "City data not found",
            ErrorCode::CalculationNotFound => "Calculation not found",
            ErrorCode::RouteNotFound => "Route not found",

            ErrorCode::DuplicateTimestamp => "A calculation with this timestamp already exists",
            ErrorCode::EmailTaken => "Email already registered",

            ErrorCode::UpstreamUnavailable => "Pricing source unavailable, try again later",
            ErrorCode::UpstreamTimeout => "Pricing source timed out, try again later",
            ErrorCode::StorageError => "Storage operation failed",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// The JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct ApiError {
    pub code: ErrorCode,

    /// For humans; clients should branch on `code`
    pub message: String,

    /// Optional additional details (offending field, reason)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Error carrying the code's stock message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn missing_credential() -> Self {
        Self::from_code(ErrorCode::MissingCredential)
    }

    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCredential, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn city_not_found(city: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CityNotFound,
            format!("City data not found for '{}'", city),
        )
    }

    pub fn calculation_not_found(key: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::CalculationNotFound,
            format!("Calculation {} not found", key),
        )
    }

    pub fn route_not_found(path: impl fmt::Display) -> Self {
        Self::new(ErrorCode::RouteNotFound, format!("No route for {}", path))
    }

    pub fn duplicate_timestamp(key: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::DuplicateTimestamp,
            format!("Calculation {} already exists", key),
        )
    }

    pub fn email_taken(email: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EmailTaken,
            format!("Email {} is already registered", email),
        )
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, message)
    }

    pub fn upstream_timeout(timeout_ms: u64) -> Self {
        Self::new(
            ErrorCode::UpstreamTimeout,
            format!("Pricing source did not answer within {}ms", timeout_ms),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<CostwiseError> for ApiError {
    fn from(err: CostwiseError) -> Self {
        match err {
            CostwiseError::Auth(AuthError::MissingCredential) => ApiError::missing_credential(),
            CostwiseError::Auth(AuthError::InvalidCredential { reason }) => {
                ApiError::invalid_credential(format!("Invalid authentication token: {}", reason))
            }

            CostwiseError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                ApiError::missing_field(&field)
            }
            CostwiseError::Validation(ValidationError::InvalidValue { field, reason }) => {
                ApiError::invalid_input(format!("Invalid value for {}: {}", field, reason))
                    .with_details(serde_json::json!({ "field": field, "reason": reason }))
            }

            CostwiseError::Storage(StorageError::NotFound { entity_type, key }) => {
                match entity_type {
                    EntityType::CityCost => ApiError::city_not_found(key),
                    EntityType::Calculation => ApiError::calculation_not_found(key),
                    EntityType::User => ApiError::invalid_credential("Invalid email or password"),
                }
            }
            CostwiseError::Storage(StorageError::DuplicateKey {
                entity_type: EntityType::User,
                key,
            }) => ApiError::email_taken(key),
            CostwiseError::Storage(StorageError::DuplicateKey { key, .. }) => {
                ApiError::duplicate_timestamp(key)
            }
            CostwiseError::Storage(other) => {
                tracing::error!(error = %other, "Storage error");
                ApiError::from_code(ErrorCode::StorageError)
            }

            CostwiseError::Upstream(UpstreamError::CityNotFound { city }) => {
                ApiError::city_not_found(city)
            }
            CostwiseError::Upstream(UpstreamError::Timeout { timeout_ms }) => {
                ApiError::upstream_timeout(timeout_ms)
            }
            CostwiseError::Upstream(other) => {
                ApiError::upstream_unavailable(other.to_string())
            }

            CostwiseError::UnknownCity { city } => ApiError::city_not_found(city),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_input(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_input(format!("Invalid query string: {}", rejection.body_text()))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
