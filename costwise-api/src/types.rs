//! Request and response types for the REST API.
//!
//! Request bodies keep every field optional so that an absent field is
//! reported as `MISSING_FIELD` naming that field, rather than as a generic
//! JSON rejection.

use costwise_core::{
    Affordability, CityCostRecord, CityKey, CostIndices, CostwiseError, NewCalculation,
    Registration, Timestamp,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiResult;
use crate::validation::{require, ValidateAmount, ValidateNonEmpty};

// ============================================================================
// COST INDEX TYPES
// ============================================================================

/// Response for `GET /api/cities`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CitiesResponse {
    /// Cached records ordered by city
    pub cities: Vec<CityCostRecord>,
    /// Distinct countries, sorted
    pub countries: Vec<String>,
}

/// Query parameters for `GET /api/cost/:city`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CostQuery {
    /// Serve a stale record if the pricing source is down
    #[serde(default)]
    pub allow_stale: bool,
}

/// Default and maximum result counts for `GET /api/cities/search`.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const MAX_SEARCH_LIMIT: usize = 50;

/// Query parameters for `GET /api/cities/search`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CitySearchQuery {
    /// Case-insensitive city name prefix
    pub q: Option<String>,
    /// At most this many results (default 10, capped at 50)
    pub limit: Option<usize>,
}

impl CitySearchQuery {
    /// Returns `(prefix, limit)`.
    pub fn validate(self) -> ApiResult<(String, usize)> {
        self.q.validate_non_empty("q")?;
        let limit = self
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);
        Ok((require(self.q, "q")?, limit))
    }
}

/// Coarse price band derived from the cost-of-living index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CostLevel {
    #[serde(rename = "Low cost")]
    Low,
    #[serde(rename = "Moderate cost")]
    Moderate,
    #[serde(rename = "High cost")]
    High,
    #[serde(rename = "Very high cost")]
    VeryHigh,
}

impl CostLevel {
    pub fn from_index(cost_of_living_index: f64) -> Self {
        match cost_of_living_index {
            i if i < 50.0 => CostLevel::Low,
            i if i < 70.0 => CostLevel::Moderate,
            i if i < 90.0 => CostLevel::High,
            _ => CostLevel::VeryHigh,
        }
    }
}

/// One hit of `GET /api/cities/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CitySearchResult {
    /// Canonical city name
    pub name: String,
    pub country: String,
    pub cost_level: CostLevel,
}

impl From<&CityCostRecord> for CitySearchResult {
    fn from(record: &CityCostRecord) -> Self {
        Self {
            name: record.city.clone(),
            country: record.country.clone(),
            cost_level: CostLevel::from_index(record.cost_of_living_index),
        }
    }
}

/// Body for `PUT /api/cities` and entries of the seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityUpsertRequest {
    pub city: Option<String>,
    pub country: Option<String>,
    pub cost_of_living_index: Option<f64>,
    pub rent_index: Option<f64>,
    pub groceries_index: Option<f64>,
    pub restaurant_index: Option<f64>,
    /// Defaults to the time of the upsert
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_refreshed: Option<Timestamp>,
}

impl CityUpsertRequest {
    /// Build the record to store, stamping it with `now` unless the request
    /// carries its own refresh time.
    pub fn into_record(self, now: Timestamp) -> ApiResult<CityCostRecord> {
        self.city.validate_non_empty("city")?;
        self.country.validate_non_empty("country")?;
        let key = CityKey::parse(&require(self.city, "city")?)?;
        let indices = CostIndices {
            cost_of_living_index: require(self.cost_of_living_index, "costOfLivingIndex")?,
            rent_index: require(self.rent_index, "rentIndex")?,
            groceries_index: require(self.groceries_index, "groceriesIndex")?,
            restaurant_index: require(self.restaurant_index, "restaurantIndex")?,
        };
        Ok(CityCostRecord::new(
            &key,
            require(self.country, "country")?,
            indices,
            self.last_refreshed.unwrap_or(now),
        ))
    }
}

// ============================================================================
// CALCULATION TYPES
// ============================================================================

/// Body for `POST /api/calculate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CalculateRequest {
    pub city: Option<String>,
    /// Annual salary
    pub salary: Option<f64>,
}

impl CalculateRequest {
    /// Presence and range checks; returns `(city, salary)`.
    pub fn validate(self) -> ApiResult<(String, f64)> {
        self.city.validate_non_empty("city")?;
        let salary = require(self.salary, "salary")?;
        salary.validate_non_negative("salary")?;
        Ok((require(self.city, "city")?, salary))
    }
}

/// Body for `POST /api/save-calculation`: a full record minus its owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveCalculationRequest {
    pub city: Option<String>,
    pub country: Option<String>,
    pub salary: Option<f64>,
    pub monthly_salary: Option<f64>,
    pub estimated_monthly_rent: Option<f64>,
    pub estimated_monthly_living_cost: Option<f64>,
    pub disposable_income: Option<f64>,
    /// `"affordable"` or `"not affordable"`
    pub affordability: Option<String>,
    /// Client-supplied timestamp; the record's key within the caller's history
    #[schema(value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<Timestamp>,
}

impl SaveCalculationRequest {
    /// Check presence of every required field and parse the verdict label.
    /// Numeric checks are left to the ledger.
    pub fn into_new_calculation(self) -> ApiResult<NewCalculation> {
        self.city.validate_non_empty("city")?;
        self.affordability.validate_non_empty("affordability")?;
        let affordability = require(self.affordability, "affordability")?
            .parse::<Affordability>()
            .map_err(CostwiseError::from)?;

        Ok(NewCalculation {
            city: require(self.city, "city")?,
            country: self.country.filter(|c| !c.trim().is_empty()),
            salary: require(self.salary, "salary")?,
            monthly_salary: require(self.monthly_salary, "monthlySalary")?,
            estimated_monthly_rent: require(self.estimated_monthly_rent, "estimatedMonthlyRent")?,
            estimated_monthly_living_cost: require(
                self.estimated_monthly_living_cost,
                "estimatedMonthlyLivingCost",
            )?,
            disposable_income: require(self.disposable_income, "disposableIncome")?,
            affordability,
            timestamp: require(self.timestamp, "timestamp")?,
        })
    }
}

/// Body for `PUT /api/update-calculation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCalculationRequest {
    #[schema(value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<Timestamp>,
    /// New annual salary; must be greater than zero
    pub salary: Option<f64>,
}

impl UpdateCalculationRequest {
    pub fn validate(self) -> ApiResult<(Timestamp, f64)> {
        let timestamp = require(self.timestamp, "timestamp")?;
        let salary = require(self.salary, "salary")?;
        salary.validate_positive("salary")?;
        Ok((timestamp, salary))
    }
}

/// Body for `DELETE /api/delete-calculation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeleteCalculationRequest {
    #[schema(value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<Timestamp>,
}

/// Response for `DELETE /api/delete-calculation`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteCalculationResponse {
    pub message: String,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: Timestamp,
}

// ============================================================================
// ACCOUNT TYPES
// ============================================================================

/// Body for `POST /api/register`. Not `Debug`: it carries a password.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// At least 8 characters
    pub password: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> ApiResult<Registration> {
        self.name.validate_non_empty("name")?;
        self.email.validate_non_empty("email")?;
        let password = require(self.password.filter(|p| !p.is_empty()), "password")?;
        Ok(Registration::parse(
            &require(self.name, "name")?,
            &require(self.email, "email")?,
            &password,
        )?)
    }
}

/// Response for `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: String,
}

/// Body for `POST /api/login`. Not `Debug`: it carries a password.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns `(email, password)`.
    pub fn validate(self) -> ApiResult<(String, String)> {
        self.email.validate_non_empty("email")?;
        let password = require(self.password.filter(|p| !p.is_empty()), "password")?;
        Ok((require(self.email, "email")?, password))
    }
}

/// Response for `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for the ledger routes
    pub token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    pub user_id: String,
}

// ============================================================================
// DEV AUTH TYPES
// ============================================================================

/// Body for `POST /auth/dev/token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DevTokenRequest {
    /// Subject to issue the token for (defaults to `dev-user`)
    pub subject: Option<String>,
    pub email: Option<String>,
}

/// Response for `POST /auth/dev/token`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DevTokenResponse {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    pub user_id: String,
}
