//! Affordability calculator.
//!
//! Pure functions only. Given the same salary and the same indices the
//! output is always identical.

use crate::{
    validate_salary, Affordability, Breakdown, CityCostRecord, CostwiseError, CostwiseResult,
};

/// Reference monthly rent at rent index 100.
pub const RENT_BASELINE: f64 = 2000.0;

/// Reference monthly living cost at cost-of-living index 100.
pub const LIVING_BASELINE: f64 = 3000.0;

pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Derive the monthly breakdown for an annual salary in a city.
pub fn calculate(salary: f64, record: &CityCostRecord) -> CostwiseResult<Breakdown> {
    validate_salary("salary", salary, false)?;

    let monthly_salary = salary / MONTHS_PER_YEAR;
    let estimated_monthly_rent = (record.rent_index / 100.0) * RENT_BASELINE;
    let estimated_monthly_living_cost = (record.cost_of_living_index / 100.0) * LIVING_BASELINE;
    let disposable_income = monthly_salary - estimated_monthly_rent - estimated_monthly_living_cost;

    Ok(Breakdown {
        city: record.city.clone(),
        country: record.country.clone(),
        monthly_salary,
        estimated_monthly_rent,
        estimated_monthly_living_cost,
        disposable_income,
        affordability: Affordability::from_disposable_income(disposable_income),
    })
}

/// Like [`calculate`], but fails with `UnknownCity` when the caller could
/// not resolve indices for `city`.
pub fn calculate_for_city(
    city: &str,
    salary: f64,
    record: Option<&CityCostRecord>,
) -> CostwiseResult<Breakdown> {
    validate_salary("salary", salary, false)?;
    let record = record.ok_or_else(|| CostwiseError::unknown_city(city))?;
    calculate(salary, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn indices(rent_index: f64, cost_of_living_index: f64) -> CityCostRecord {
        CityCostRecord {
            city: "Toronto".to_string(),
            country: "Canada".to_string(),
            cost_of_living_index,
            rent_index,
            groceries_index: 70.0,
            restaurant_index: 68.0,
            last_refreshed: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_reference_example() {
        let b = calculate(60_000.0, &indices(95.0, 100.0)).unwrap();
        assert_eq!(b.monthly_salary, 5000.0);
        assert_eq!(b.estimated_monthly_rent, 1900.0);
        assert_eq!(b.estimated_monthly_living_cost, 3000.0);
        assert_eq!(b.disposable_income, 100.0);
        assert_eq!(b.affordability, Affordability::Affordable);
        assert_eq!(b.city, "Toronto");
        assert_eq!(b.country, "Canada");
    }

    #[test]
    fn test_exactly_zero_disposable_is_not_affordable() {
        // 5000/month against 2000 rent + 3000 living.
        let b = calculate(60_000.0, &indices(100.0, 100.0)).unwrap();
        assert_eq!(b.disposable_income, 0.0);
        assert_eq!(b.affordability, Affordability::NotAffordable);
    }

    #[test]
    fn test_positive_disposable_is_affordable() {
        let b = calculate(120_000.0, &indices(50.0, 50.0)).unwrap();
        assert_eq!(b.disposable_income, 7500.0);
        assert_eq!(b.affordability, Affordability::Affordable);
    }

    #[test]
    fn test_zero_salary_is_valid_input() {
        let b = calculate(0.0, &indices(10.0, 10.0)).unwrap();
        assert_eq!(b.monthly_salary, 0.0);
        assert_eq!(b.affordability, Affordability::NotAffordable);
    }

    #[test]
    fn test_invalid_salary() {
        for salary in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = calculate(salary, &indices(50.0, 50.0)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_unknown_city() {
        let err = calculate_for_city("Atlantis", 50_000.0, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("Atlantis"));
    }

    #[test]
    fn test_calculate_for_city_with_record() {
        let record = indices(95.0, 100.0);
        let b = calculate_for_city("Toronto", 60_000.0, Some(&record)).unwrap();
        assert_eq!(b, calculate(60_000.0, &record).unwrap());
    }

    proptest! {
        #[test]
        fn prop_calculate_is_deterministic(
            salary in 0.0f64..10_000_000.0,
            rent in 0.0f64..300.0,
            col in 0.0f64..300.0,
        ) {
            let record = indices(rent, col);
            let first = calculate(salary, &record).unwrap();
            let second = calculate(salary, &record).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_verdict_matches_sign_of_disposable_income(
            salary in 0.0f64..10_000_000.0,
            rent in 0.0f64..300.0,
            col in 0.0f64..300.0,
        ) {
            let b = calculate(salary, &indices(rent, col)).unwrap();
            let expected = if b.disposable_income > 0.0 {
                Affordability::Affordable
            } else {
                Affordability::NotAffordable
            };
            prop_assert_eq!(b.affordability, expected);
        }

        #[test]
        fn prop_negative_salary_rejected(salary in -10_000_000.0f64..-0.0001) {
            prop_assert!(calculate(salary, &indices(50.0, 50.0)).is_err());
        }
    }
}
