//! Validation Traits
//!
//! Presence and range checks applied to request bodies before any domain
//! logic runs.

use crate::error::{ApiError, ApiResult};

/// Trait for validating non-empty values.
///
/// # Example
/// ```ignore
/// use costwise_api::validation::ValidateNonEmpty;
///
/// fn lookup(city: &str) -> ApiResult<()> {
///     city.validate_non_empty("city")?;
///     Ok(())
/// }
/// ```
pub trait ValidateNonEmpty {
    /// Returns `ApiError::missing_field` if the value is absent, empty or
    /// whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for &str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        (*self).validate_non_empty(field_name)
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

impl<T: ValidateNonEmpty> ValidateNonEmpty for Option<T> {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        match self {
            Some(value) => value.validate_non_empty(field_name),
            None => Err(ApiError::missing_field(field_name)),
        }
    }
}

/// Unwrap a required field or fail with `MISSING_FIELD`.
pub fn require<T>(value: Option<T>, field_name: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::missing_field(field_name))
}

/// Numeric checks for request amounts.
pub trait ValidateAmount {
    /// Finite and `>= 0`.
    fn validate_non_negative(&self, field_name: &str) -> ApiResult<()>;

    /// Finite and `> 0`.
    fn validate_positive(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateAmount for f64 {
    fn validate_non_negative(&self, field_name: &str) -> ApiResult<()> {
        if !self.is_finite() || *self < 0.0 {
            return Err(ApiError::invalid_input(format!(
                "{} must be a finite, non-negative number",
                field_name
            ))
            .with_details(serde_json::json!({ "field": field_name })));
        }
        Ok(())
    }

    fn validate_positive(&self, field_name: &str) -> ApiResult<()> {
        if !self.is_finite() || *self <= 0.0 {
            return Err(ApiError::invalid_input(format!(
                "{} must be greater than zero",
                field_name
            ))
            .with_details(serde_json::json!({ "field": field_name })));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_non_empty() {
        assert!("Lisbon".validate_non_empty("city").is_ok());
        assert!(String::from("  ").validate_non_empty("city").is_err());
        assert!(Some("x".to_string()).validate_non_empty("city").is_ok());

        let none: Option<String> = None;
        let err = none.validate_non_empty("city").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
    }

    #[test]
    fn test_require() {
        assert_eq!(require(Some(3), "n").ok(), Some(3));
        let err = require::<f64>(None, "salary").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("salary"));
    }

    #[test]
    fn test_amounts() {
        assert!(0.0f64.validate_non_negative("salary").is_ok());
        assert!((-1.0f64).validate_non_negative("salary").is_err());
        assert!(f64::NAN.validate_non_negative("salary").is_err());

        assert!(1.0f64.validate_positive("salary").is_ok());
        let err = 0.0f64.validate_positive("salary").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(f64::INFINITY.validate_positive("salary").is_err());
    }
}
