//! City cost records and the canonical city key.

use crate::{CostwiseResult, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical key for a city.
///
/// Normalization: leading and trailing whitespace is trimmed and every
/// internal run of whitespace collapses to a single space. Case and
/// diacritics are preserved, so `"Paris"` and `"paris"` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CityKey(String);

impl CityKey {
    pub fn parse(raw: &str) -> CostwiseResult<Self> {
        let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(ValidationError::missing("city").into());
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relative price indices for a city, where 100 is the reference level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CostIndices {
    pub cost_of_living_index: f64,
    pub rent_index: f64,
    pub groceries_index: f64,
    pub restaurant_index: f64,
}

impl CostIndices {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("costOfLivingIndex", self.cost_of_living_index),
            ("rentIndex", self.rent_index),
            ("groceriesIndex", self.groceries_index),
            ("restaurantIndex", self.restaurant_index),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ValidationError::invalid(field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(ValidationError::invalid(field, "must not be negative"));
            }
        }
        Ok(())
    }
}

/// Cached cost indices for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CityCostRecord {
    pub city: String,
    pub country: String,
    pub cost_of_living_index: f64,
    pub rent_index: f64,
    pub groceries_index: f64,
    pub restaurant_index: f64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub last_refreshed: Timestamp,
}

impl CityCostRecord {
    pub fn new(
        city: &CityKey,
        country: impl Into<String>,
        indices: CostIndices,
        last_refreshed: Timestamp,
    ) -> Self {
        Self {
            city: city.as_str().to_string(),
            country: country.into(),
            cost_of_living_index: indices.cost_of_living_index,
            rent_index: indices.rent_index,
            groceries_index: indices.groceries_index,
            restaurant_index: indices.restaurant_index,
            last_refreshed,
        }
    }

    pub fn indices(&self) -> CostIndices {
        CostIndices {
            cost_of_living_index: self.cost_of_living_index,
            rent_index: self.rent_index,
            groceries_index: self.groceries_index,
            restaurant_index: self.restaurant_index,
        }
    }

    /// Canonical key of this record's city.
    pub fn key(&self) -> CostwiseResult<CityKey> {
        CityKey::parse(&self.city)
    }

    /// Check the record against the cache schema and canonicalize its city.
    pub fn validate(mut self) -> CostwiseResult<Self> {
        let key = self.key()?;
        if self.country.trim().is_empty() {
            return Err(ValidationError::missing("country").into());
        }
        self.indices().validate()?;
        self.city = key.into_string();
        self.country = self.country.trim().to_string();
        Ok(self)
    }
}
