//! Cost index cache with an explicit freshness contract.
//!
//! Reads return [`CacheRead<T>`], which says whether the record came from the
//! store, from a refresh, or is a stale record served on explicit request.
//!
//! # Example
//!
//! ```ignore
//! let cache = CostIndexCache::new(store, pricing_source, CacheConfig::new());
//!
//! // Fails with UpstreamUnavailable if a refresh is needed and the source is down
//! let read = cache.get_indices("Lisbon").await?;
//!
//! // Caller explicitly accepts stale data over an error
//! let read = cache.get_indices_with("Lisbon", StaleFallback::Allow).await?;
//! if read.is_stale() {
//!     tracing::warn!("serving stale indices");
//! }
//! ```

pub mod cost_index;
pub mod freshness;
pub mod source;

pub use cost_index::{distinct_countries, CacheConfig, CacheStats, CostIndexCache};
pub use freshness::{
    CacheRead, FreshnessPolicy, ReadSource, StaleFallback, DEFAULT_FRESHNESS_WINDOW_DAYS,
};
pub use source::{PricingQuote, PricingSource};
