//! Cache-aside store of per-city cost indices.
//!
//! Reads check the store first and only call the pricing source when the
//! record is missing or older than the freshness window. Refreshed records
//! are upserted by city key, so concurrent refreshes of one city converge on
//! a single record (last write wins).

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Duration;
use costwise_core::{
    CityCostRecord, CityKey, Clock, CostwiseError, CostwiseResult, ErrorKind, SystemClock,
    Timestamp, UpstreamError, ValidationError,
};
use tracing::{debug, info, warn};

use super::freshness::{CacheRead, FreshnessPolicy, StaleFallback};
use super::source::{PricingQuote, PricingSource};
use crate::store::CityCostStore;

/// Configuration for the cost index cache.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    pub freshness: FreshnessPolicy,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the freshness window.
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness = FreshnessPolicy::new(window);
        self
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub refreshes: u64,
    pub upstream_failures: u64,
    pub stale_served: u64,
}

impl CacheStats {
    /// Fraction of `get_indices` calls answered without an upstream call.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.refreshes + self.upstream_failures;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    refreshes: AtomicU64,
    upstream_failures: AtomicU64,
    stale_served: AtomicU64,
}

/// Cache-aside cost index cache.
///
/// The only component allowed to call the [`PricingSource`].
pub struct CostIndexCache {
    store: Arc<dyn CityCostStore>,
    source: Arc<dyn PricingSource>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    counters: CacheCounters,
}

impl CostIndexCache {
    pub fn new(
        store: Arc<dyn CityCostStore>,
        source: Arc<dyn PricingSource>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            source,
            clock: Arc::new(SystemClock),
            config,
            counters: CacheCounters::default(),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current time according to the cache's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            refreshes: self.counters.refreshes.load(Ordering::Relaxed),
            upstream_failures: self.counters.upstream_failures.load(Ordering::Relaxed),
            stale_served: self.counters.stale_served.load(Ordering::Relaxed),
        }
    }

    /// Get fresh indices for a city, refreshing from the pricing source when
    /// missing or stale. Upstream failures are surfaced.
    pub async fn get_indices(&self, city: &str) -> CostwiseResult<CacheRead<CityCostRecord>> {
        self.get_indices_with(city, StaleFallback::Reject).await
    }

    /// Like [`get_indices`](Self::get_indices) with an explicit stale-read
    /// policy for upstream failures.
    pub async fn get_indices_with(
        &self,
        city: &str,
        fallback: StaleFallback,
    ) -> CostwiseResult<CacheRead<CityCostRecord>> {
        let key = CityKey::parse(city)?;
        let now = self.clock.now();

        let cached = self.store.city_cost_get(&key).await?;
        if let Some(record) = cached.as_ref() {
            if self.config.freshness.is_fresh(record.last_refreshed, now) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(city = %key, last_refreshed = %record.last_refreshed, "Cost index cache hit");
                return Ok(CacheRead::from_cache(record.clone()));
            }
        }

        let record = match self.fetch_record(&key, now).await {
            Ok(record) => record,
            Err(err) => {
                self.counters.upstream_failures.fetch_add(1, Ordering::Relaxed);
                return match (fallback, cached) {
                    (StaleFallback::Allow, Some(stale))
                        if err.kind() == ErrorKind::UpstreamUnavailable =>
                    {
                        self.counters.stale_served.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            city = %key,
                            last_refreshed = %stale.last_refreshed,
                            error = %err,
                            "Pricing source failed, serving stale cost indices"
                        );
                        Ok(CacheRead::stale(stale))
                    }
                    _ => {
                        warn!(city = %key, error = %err, "Pricing source failed");
                        Err(err)
                    }
                };
            }
        };

        self.store.city_cost_upsert(&record).await?;
        self.counters.refreshes.fetch_add(1, Ordering::Relaxed);
        info!(
            city = %key,
            country = %record.country,
            source = self.source.name(),
            "Refreshed cost indices"
        );
        Ok(CacheRead::from_upstream(record))
    }

    /// Look up a city without consulting the pricing source.
    pub async fn peek(&self, city: &str) -> CostwiseResult<Option<CityCostRecord>> {
        let key = CityKey::parse(city)?;
        self.store.city_cost_get(&key).await
    }

    /// All cached records ordered by city key.
    pub async fn list_indices(&self) -> CostwiseResult<Vec<CityCostRecord>> {
        self.store.city_cost_list().await
    }

    /// Cached records whose city starts with `prefix`, ignoring case.
    ///
    /// Never calls the pricing source. At most `limit` records, ordered by
    /// city key.
    pub async fn search(&self, prefix: &str, limit: usize) -> CostwiseResult<Vec<CityCostRecord>> {
        let needle = prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Err(ValidationError::missing("q").into());
        }
        let records = self.list_indices().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.city.to_lowercase().starts_with(&needle))
            .take(limit)
            .collect())
    }

    /// Insert or overwrite a record without a freshness check.
    ///
    /// The record is validated and its city canonicalized first.
    pub async fn upsert_manual(&self, record: CityCostRecord) -> CostwiseResult<CityCostRecord> {
        let record = record.validate()?;
        self.store.city_cost_upsert(&record).await?;
        info!(city = %record.city, country = %record.country, "Manual cost index upsert");
        Ok(record)
    }

    async fn fetch_record(&self, key: &CityKey, now: Timestamp) -> CostwiseResult<CityCostRecord> {
        let PricingQuote { country, indices } = self.source.fetch(key).await?;
        CityCostRecord::new(key, country, indices, now)
            .validate()
            .map_err(|e| match e {
                CostwiseError::Validation(v) => UpstreamError::InvalidResponse {
                    reason: v.to_string(),
                }
                .into(),
                other => other,
            })
    }
}

/// Distinct countries across records, sorted.
pub fn distinct_countries(records: &[CityCostRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.country.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
