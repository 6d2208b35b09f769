//! Affordability verdicts and persisted calculation records.

use crate::{CostwiseResult, OwnerId, Timestamp, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Affordability verdict. Closed set of two labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Affordability {
    #[serde(rename = "affordable")]
    Affordable,
    #[serde(rename = "not affordable")]
    NotAffordable,
}

impl Affordability {
    pub const AFFORDABLE: &'static str = "affordable";
    pub const NOT_AFFORDABLE: &'static str = "not affordable";

    /// Strictly positive disposable income is affordable; zero is not.
    pub fn from_disposable_income(disposable_income: f64) -> Self {
        if disposable_income > 0.0 {
            Affordability::Affordable
        } else {
            Affordability::NotAffordable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Affordability::Affordable => Self::AFFORDABLE,
            Affordability::NotAffordable => Self::NOT_AFFORDABLE,
        }
    }
}

impl fmt::Display for Affordability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Affordability {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            Self::AFFORDABLE => Ok(Affordability::Affordable),
            Self::NOT_AFFORDABLE => Ok(Affordability::NotAffordable),
            other => Err(ValidationError::invalid(
                "affordability",
                format!(
                    "'{}' is not one of '{}', '{}'",
                    other,
                    Self::AFFORDABLE,
                    Self::NOT_AFFORDABLE
                ),
            )),
        }
    }
}

// Labels from older clients arrive capitalized ("Not Affordable").
impl<'de> Deserialize<'de> for Affordability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Derived affordability figures for one salary in one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub city: String,
    pub country: String,
    pub monthly_salary: f64,
    pub estimated_monthly_rent: f64,
    pub estimated_monthly_living_cost: f64,
    pub disposable_income: f64,
    pub affordability: Affordability,
}

/// A calculation submitted for saving, before it is bound to an owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewCalculation {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub salary: f64,
    pub monthly_salary: f64,
    pub estimated_monthly_rent: f64,
    pub estimated_monthly_living_cost: f64,
    pub disposable_income: f64,
    pub affordability: Affordability,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl NewCalculation {
    /// Build the record that would be saved for a breakdown.
    pub fn from_breakdown(breakdown: &Breakdown, salary: f64, timestamp: Timestamp) -> Self {
        Self {
            city: breakdown.city.clone(),
            country: Some(breakdown.country.clone()),
            salary,
            monthly_salary: breakdown.monthly_salary,
            estimated_monthly_rent: breakdown.estimated_monthly_rent,
            estimated_monthly_living_cost: breakdown.estimated_monthly_living_cost,
            disposable_income: breakdown.disposable_income,
            affordability: breakdown.affordability,
            timestamp,
        }
    }

    pub fn validate(&self) -> CostwiseResult<()> {
        if self.city.trim().is_empty() {
            return Err(ValidationError::missing("city").into());
        }
        validate_salary("salary", self.salary, false)?;
        let derived = [
            ("monthlySalary", self.monthly_salary),
            ("estimatedMonthlyRent", self.estimated_monthly_rent),
            ("estimatedMonthlyLivingCost", self.estimated_monthly_living_cost),
            ("disposableIncome", self.disposable_income),
        ];
        for (field, value) in derived {
            if !value.is_finite() {
                return Err(ValidationError::invalid(field, "must be a finite number").into());
            }
        }
        Ok(())
    }

    pub fn into_record(self, owner: OwnerId) -> CalculationRecord {
        CalculationRecord {
            owner,
            city: self.city,
            country: self.country,
            salary: self.salary,
            monthly_salary: self.monthly_salary,
            estimated_monthly_rent: self.estimated_monthly_rent,
            estimated_monthly_living_cost: self.estimated_monthly_living_cost,
            disposable_income: self.disposable_income,
            affordability: self.affordability,
            timestamp: self.timestamp,
        }
    }
}

/// A saved calculation, owned by exactly one identity.
///
/// `(owner, timestamp)` is the natural key. Only `salary` is ever mutated
/// after creation; the derived fields keep the values they were saved with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    pub owner: OwnerId,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub salary: f64,
    pub monthly_salary: f64,
    pub estimated_monthly_rent: f64,
    pub estimated_monthly_living_cost: f64,
    pub disposable_income: f64,
    pub affordability: Affordability,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

/// Check that a salary is a finite number, and non-negative or strictly
/// positive depending on `strictly_positive`.
pub fn validate_salary(field: &str, salary: f64, strictly_positive: bool) -> Result<(), ValidationError> {
    if !salary.is_finite() {
        return Err(ValidationError::invalid(field, "must be a finite number"));
    }
    if strictly_positive && salary <= 0.0 {
        return Err(ValidationError::invalid(field, "must be greater than zero"));
    }
    if salary < 0.0 {
        return Err(ValidationError::invalid(field, "must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> NewCalculation {
        NewCalculation {
            city: "Berlin".to_string(),
            country: Some("Germany".to_string()),
            salary: 60_000.0,
            monthly_salary: 5_000.0,
            estimated_monthly_rent: 1_200.0,
            estimated_monthly_living_cost: 2_100.0,
            disposable_income: 1_700.0,
            affordability: Affordability::Affordable,
            timestamp: Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_affordability_labels() {
        assert_eq!(
            serde_json::to_string(&Affordability::NotAffordable).unwrap(),
            "\"not affordable\""
        );
        assert_eq!(
            "Not Affordable".parse::<Affordability>().unwrap(),
            Affordability::NotAffordable
        );
        assert!("maybe".parse::<Affordability>().is_err());
    }

    #[test]
    fn test_zero_disposable_income_is_not_affordable() {
        assert_eq!(
            Affordability::from_disposable_income(0.0),
            Affordability::NotAffordable
        );
        assert_eq!(
            Affordability::from_disposable_income(0.01),
            Affordability::Affordable
        );
    }

    #[test]
    fn test_new_calculation_validates() {
        assert!(sample().validate().is_ok());

        let mut blank_city = sample();
        blank_city.city = "  ".to_string();
        assert!(blank_city.validate().is_err());

        let mut negative = sample();
        negative.salary = -1.0;
        assert!(negative.validate().is_err());

        let mut infinite = sample();
        infinite.disposable_income = f64::INFINITY;
        assert!(infinite.validate().is_err());
    }

    #[test]
    fn test_missing_derived_field_fails_to_deserialize() {
        let json = serde_json::json!({
            "city": "Berlin",
            "salary": 60000.0,
            "monthlySalary": 5000.0,
            "estimatedMonthlyRent": 1200.0,
            "disposableIncome": 1700.0,
            "affordability": "affordable",
            "timestamp": "2024-04-02T09:30:00Z"
        });
        assert!(serde_json::from_value::<NewCalculation>(json).is_err());
    }

    #[test]
    fn test_validate_salary_positivity() {
        assert!(validate_salary("salary", 0.0, false).is_ok());
        assert!(validate_salary("salary", 0.0, true).is_err());
        assert!(validate_salary("salary", f64::NAN, false).is_err());
    }
}
