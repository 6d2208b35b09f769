//! Error types for Costwise operations

use crate::EntityType;
use thiserror::Error;

/// Credential verification errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No credential presented")]
    MissingCredential,

    #[error("Invalid credential: {reason}")]
    InvalidCredential { reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with key {key}")]
    NotFound { entity_type: EntityType, key: String },

    #[error("Duplicate key for {entity_type:?}: {key}")]
    DuplicateKey { entity_type: EntityType, key: String },

    #[error("Serialization failed for {entity_type:?}: {reason}")]
    Serialization { entity_type: EntityType, reason: String },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// External pricing source errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Pricing source has no data for city '{city}'")]
    CityNotFound { city: String },

    #[error("Pricing source unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Pricing source timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Pricing source responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response from pricing source: {reason}")]
    InvalidResponse { reason: String },
}

/// Stable failure categories surfaced to callers.
///
/// Each kind maps to one distinct status at the HTTP boundary so clients can
/// tell input problems from authorization problems from transient upstream
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingCredential,
    InvalidCredential,
    InvalidInput,
    NotFound,
    DuplicateTimestamp,
    /// An account already exists for the email.
    DuplicateAccount,
    UpstreamUnavailable,
    Internal,
}

/// Master error type for all Costwise errors.
#[derive(Debug, Clone, Error)]
pub enum CostwiseError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("No cost indices available for city '{city}'")]
    UnknownCity { city: String },
}

impl CostwiseError {
    pub fn unknown_city(city: impl Into<String>) -> Self {
        Self::UnknownCity { city: city.into() }
    }

    /// Project this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CostwiseError::Auth(AuthError::MissingCredential) => ErrorKind::MissingCredential,
            CostwiseError::Auth(AuthError::InvalidCredential { .. }) => {
                ErrorKind::InvalidCredential
            }
            CostwiseError::Validation(_) => ErrorKind::InvalidInput,
            CostwiseError::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            CostwiseError::Storage(StorageError::DuplicateKey {
                entity_type: EntityType::User,
                ..
            }) => ErrorKind::DuplicateAccount,
            CostwiseError::Storage(StorageError::DuplicateKey { .. }) => {
                ErrorKind::DuplicateTimestamp
            }
            CostwiseError::Storage(_) => ErrorKind::Internal,
            CostwiseError::Upstream(UpstreamError::CityNotFound { .. }) => ErrorKind::NotFound,
            CostwiseError::Upstream(_) => ErrorKind::UpstreamUnavailable,
            CostwiseError::UnknownCity { .. } => ErrorKind::NotFound,
        }
    }
}

/// Result type alias for Costwise operations.
pub type CostwiseResult<T> = Result<T, CostwiseError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Calculation,
            key: "2024-05-01T10:00:00Z".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_auth_errors_map_to_distinct_kinds() {
        let missing: CostwiseError = AuthError::MissingCredential.into();
        let invalid: CostwiseError = AuthError::InvalidCredential {
            reason: "bad signature".to_string(),
        }
        .into();
        assert_eq!(missing.kind(), ErrorKind::MissingCredential);
        assert_eq!(invalid.kind(), ErrorKind::InvalidCredential);
    }

    #[test]
    fn test_duplicate_key_is_duplicate_timestamp() {
        let err: CostwiseError = StorageError::DuplicateKey {
            entity_type: EntityType::Calculation,
            key: "k".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::DuplicateTimestamp);

        let err: CostwiseError = StorageError::DuplicateKey {
            entity_type: EntityType::User,
            key: "ana@example.com".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::DuplicateAccount);
    }

    #[test]
    fn test_upstream_city_not_found_is_not_found() {
        let err: CostwiseError = UpstreamError::CityNotFound {
            city: "Atlantis".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_upstream_failures_are_unavailable() {
        let cases = vec![
            UpstreamError::Unreachable {
                reason: "connection refused".to_string(),
            },
            UpstreamError::Timeout { timeout_ms: 10_000 },
            UpstreamError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            },
            UpstreamError::InvalidResponse {
                reason: "missing country".to_string(),
            },
        ];
        for case in cases {
            let err: CostwiseError = case.into();
            assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        }
    }

    #[test]
    fn test_validation_is_invalid_input() {
        let err: CostwiseError = ValidationError::missing("city").into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("city"));
    }

    #[test]
    fn test_backend_failure_is_internal() {
        let err: CostwiseError = StorageError::Backend {
            reason: "disk full".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
