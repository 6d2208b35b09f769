//! Costwise Storage - Stores, Cost Index Cache and Calculation Ledger
//!
//! Defines the store abstraction for the keyed collections, an in-memory
//! and an LMDB implementation, and the two stateful services built on top
//! of them.

pub mod cache;
pub mod ledger;
pub mod ledger_key;
pub mod lmdb;
pub mod memory;
pub mod store;

pub use cache::{
    distinct_countries, CacheConfig, CacheRead, CacheStats, CostIndexCache, FreshnessPolicy,
    PricingQuote, PricingSource, ReadSource, StaleFallback, DEFAULT_FRESHNESS_WINDOW_DAYS,
};
pub use ledger::CalculationLedger;
pub use ledger_key::OwnerScopedKey;
pub use lmdb::{LmdbStore, LmdbStoreError};
pub use memory::InMemoryStore;
pub use store::{CalculationStore, CityCostStore, StoreHealth, UserStore};
