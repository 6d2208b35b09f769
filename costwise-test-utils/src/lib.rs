//! Costwise Test Utilities
//!
//! Shared test infrastructure for the Costwise workspace:
//! - Stub pricing source with call counting
//! - Call-counting store wrapper
//! - Proptest generators for domain types
//! - Fixtures for common scenarios
//! - Assertions on the error taxonomy

pub use costwise_storage::InMemoryStore;

pub use costwise_core::{
    Affordability, CalculationRecord, CityCostRecord, CityKey, CostIndices, CostwiseError,
    CostwiseResult, EmailAddress, ErrorKind, Identity, NewCalculation, OwnerId, Timestamp,
    UpstreamError, UserAccount,
};

use async_trait::async_trait;
use costwise_storage::{
    CalculationStore, CityCostStore, PricingQuote, PricingSource, StoreHealth, UserStore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

// ============================================================================
// STUB PRICING SOURCE
// ============================================================================

/// In-process pricing source.
///
/// Knows a fixed set of cities, answers `CityNotFound` for anything else,
/// and can be switched into an outage where every call fails.
#[derive(Debug, Default)]
pub struct StubPricingSource {
    quotes: RwLock<HashMap<String, PricingQuote>>,
    calls: AtomicU64,
    outage: AtomicBool,
}

impl StubPricingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the quote returned for `city`.
    pub fn with_city(self, city: &str, country: &str, indices: CostIndices) -> Self {
        self.set_quote(city, country, indices);
        self
    }

    pub fn set_quote(&self, city: &str, country: &str, indices: CostIndices) {
        if let Ok(mut quotes) = self.quotes.write() {
            quotes.insert(
                city.to_string(),
                PricingQuote {
                    country: country.to_string(),
                    indices,
                },
            );
        }
    }

    /// Make every subsequent call fail as unreachable (or recover).
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PricingSource for StubPricingSource {
    async fn fetch(&self, city: &CityKey) -> CostwiseResult<PricingQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.outage.load(Ordering::SeqCst) {
            return Err(UpstreamError::Unreachable {
                reason: "stub outage".to_string(),
            }
            .into());
        }
        let quotes = self.quotes.read().map_err(|_| UpstreamError::Unreachable {
            reason: "stub lock poisoned".to_string(),
        })?;
        quotes.get(city.as_str()).cloned().ok_or_else(|| {
            UpstreamError::CityNotFound {
                city: city.as_str().to_string(),
            }
            .into()
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

// ============================================================================
// CALL-COUNTING STORE
// ============================================================================

/// Wraps an [`InMemoryStore`] and counts every store call.
///
/// Used to prove that a code path never reached storage.
#[derive(Debug, Clone, Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    calls: Arc<AtomicU64>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CityCostStore for CountingStore {
    async fn city_cost_get(&self, city: &CityKey) -> CostwiseResult<Option<CityCostRecord>> {
        self.tick();
        self.inner.city_cost_get(city).await
    }

    async fn city_cost_upsert(&self, record: &CityCostRecord) -> CostwiseResult<()> {
        self.tick();
        self.inner.city_cost_upsert(record).await
    }

    async fn city_cost_list(&self) -> CostwiseResult<Vec<CityCostRecord>> {
        self.tick();
        self.inner.city_cost_list().await
    }
}

#[async_trait]
impl CalculationStore for CountingStore {
    async fn calculation_insert(&self, record: &CalculationRecord) -> CostwiseResult<()> {
        self.tick();
        self.inner.calculation_insert(record).await
    }

    async fn calculation_list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> CostwiseResult<Vec<CalculationRecord>> {
        self.tick();
        self.inner.calculation_list_by_owner(owner).await
    }

    async fn calculation_update_salary(
        &self,
        owner: &OwnerId,
        timestamp: Timestamp,
        salary: f64,
    ) -> CostwiseResult<CalculationRecord> {
        self.tick();
        self.inner
            .calculation_update_salary(owner, timestamp, salary)
            .await
    }

    async fn calculation_delete(
        &self,
        owner: &OwnerId,
        timestamp: Timestamp,
    ) -> CostwiseResult<()> {
        self.tick();
        self.inner.calculation_delete(owner, timestamp).await
    }
}

#[async_trait]
impl UserStore for CountingStore {
    async fn user_insert(&self, account: &UserAccount) -> CostwiseResult<()> {
        self.tick();
        self.inner.user_insert(account).await
    }

    async fn user_get_by_email(&self, email: &EmailAddress) -> CostwiseResult<Option<UserAccount>> {
        self.tick();
        self.inner.user_get_by_email(email).await
    }
}

#[async_trait]
impl StoreHealth for CountingStore {
    async fn ping(&self) -> CostwiseResult<()> {
        self.inner.ping().await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Costwise domain types.

    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    /// Generate a Timestamp with millisecond precision (2020-2030).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1_577_836_800_000i64..1_893_456_000_000i64).prop_map(|millis| {
            chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a valid annual salary.
    pub fn arb_salary() -> impl Strategy<Value = f64> {
        0.0f64..5_000_000.0
    }

    /// Generate a plausible index value.
    pub fn arb_index() -> impl Strategy<Value = f64> {
        0.0f64..250.0
    }

    pub fn arb_indices() -> impl Strategy<Value = CostIndices> {
        (arb_index(), arb_index(), arb_index(), arb_index()).prop_map(
            |(cost_of_living_index, rent_index, groceries_index, restaurant_index)| CostIndices {
                cost_of_living_index,
                rent_index,
                groceries_index,
                restaurant_index,
            },
        )
    }

    /// Generate a city name that is already in canonical form.
    pub fn arb_city_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,8})?"
    }

    pub fn arb_owner_id() -> impl Strategy<Value = OwnerId> {
        "[a-z0-9]{4,16}".prop_filter_map("owner id", |s| OwnerId::new(s).ok())
    }

    pub fn arb_city_record() -> impl Strategy<Value = CityCostRecord> {
        (arb_city_name(), "[A-Z][a-z]{3,10}", arb_indices(), arb_timestamp()).prop_map(
            |(city, country, indices, last_refreshed)| CityCostRecord {
                city,
                country,
                cost_of_living_index: indices.cost_of_living_index,
                rent_index: indices.rent_index,
                groceries_index: indices.groceries_index,
                restaurant_index: indices.restaurant_index,
                last_refreshed,
            },
        )
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::{TimeZone, Utc};

    /// A fixed reference instant.
    pub fn reference_time() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn indices(rent_index: f64, cost_of_living_index: f64) -> CostIndices {
        CostIndices {
            cost_of_living_index,
            rent_index,
            groceries_index: 60.0,
            restaurant_index: 55.0,
        }
    }

    /// Toronto at rent index 95 and cost-of-living index 100.
    pub fn toronto() -> CityCostRecord {
        city_record("Toronto", "Canada", indices(95.0, 100.0), reference_time())
    }

    pub fn city_record(
        city: &str,
        country: &str,
        indices: CostIndices,
        last_refreshed: Timestamp,
    ) -> CityCostRecord {
        CityCostRecord {
            city: city.to_string(),
            country: country.to_string(),
            cost_of_living_index: indices.cost_of_living_index,
            rent_index: indices.rent_index,
            groceries_index: indices.groceries_index,
            restaurant_index: indices.restaurant_index,
            last_refreshed,
        }
    }

    /// Stub pricing source knowing a handful of cities.
    pub fn stub_source() -> StubPricingSource {
        StubPricingSource::new()
            .with_city("Toronto", "Canada", indices(95.0, 100.0))
            .with_city("Lisbon", "Portugal", indices(45.0, 55.0))
            .with_city("Zurich", "Switzerland", indices(120.0, 130.0))
    }

    pub fn identity(subject: &str) -> Option<Identity> {
        OwnerId::new(subject).ok().map(Identity::new)
    }

    /// A calculation for Toronto at `salary` saved at `timestamp`.
    pub fn toronto_calculation(salary: f64, timestamp: Timestamp) -> Option<NewCalculation> {
        costwise_core::calculate(salary, &toronto())
            .ok()
            .map(|breakdown| NewCalculation::from_breakdown(&breakdown, salary, timestamp))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on the Costwise error taxonomy.

    use super::*;

    /// Assert that a result failed with the given error kind.
    #[track_caller]
    pub fn assert_kind<T: std::fmt::Debug>(result: &CostwiseResult<T>, kind: ErrorKind) {
        match result {
            Err(err) => assert_eq!(err.kind(), kind, "unexpected error: {}", err),
            Ok(value) => panic!("Expected {:?} error, got Ok: {:?}", kind, value),
        }
    }
}
