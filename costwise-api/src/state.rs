//! Shared application state for Axum routers.

use std::path::Path;
use std::sync::Arc;

use costwise_core::{Clock, CostwiseError, SystemClock};
use costwise_storage::{
    CacheConfig, CalculationLedger, CalculationStore, CityCostStore, CostIndexCache,
    InMemoryStore, LmdbStore, PricingSource, StoreHealth, UserStore,
};

use crate::accounts::AccountService;
use crate::auth::{AuthConfig, IdentityVerifier};
use crate::config::{ApiConfig, Environment, StorageBackend};
use crate::error::{ApiError, ApiResult};
use crate::pricing::NumbeoClient;
use crate::types::CityUpsertRequest;

/// Knobs for [`AppState::new`] that tests like to override.
#[derive(Clone)]
pub struct StateOptions {
    pub cache: CacheConfig,
    pub environment: Environment,
    /// Clock used by the cost index cache and for account creation times.
    pub clock: Arc<dyn Clock>,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            environment: Environment::Development,
            clock: Arc::new(SystemClock),
        }
    }
}

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside cost index cache (sole caller of the pricing source).
    pub cache: Arc<CostIndexCache>,
    /// Owner-scoped calculation history.
    pub ledger: CalculationLedger,
    /// Registration and password login.
    pub accounts: AccountService,
    pub verifier: Arc<IdentityVerifier>,
    /// Pinged by the readiness check.
    pub health: Arc<dyn StoreHealth>,
    pub environment: Environment,
    pub start_time: std::time::Instant,
}

crate::impl_from_ref!(Arc<CostIndexCache>, cache);
crate::impl_from_ref!(CalculationLedger, ledger);
crate::impl_from_ref!(AccountService, accounts);
crate::impl_from_ref!(Arc<IdentityVerifier>, verifier);
crate::impl_from_ref!(Arc<dyn StoreHealth>, health);
crate::impl_from_ref!(Environment, environment);

impl AppState {
    /// Wire the cache, ledger and accounts onto one store.
    pub fn new<S>(
        store: Arc<S>,
        source: Arc<dyn PricingSource>,
        verifier: IdentityVerifier,
        options: StateOptions,
    ) -> Self
    where
        S: CityCostStore + CalculationStore + UserStore + StoreHealth + 'static,
    {
        let city_store: Arc<dyn CityCostStore> = store.clone();
        let calculation_store: Arc<dyn CalculationStore> = store.clone();
        let user_store: Arc<dyn UserStore> = store.clone();
        let health: Arc<dyn StoreHealth> = store;

        let accounts = AccountService::new(user_store, options.clock.clone());
        let cache = CostIndexCache::new(city_store, source, options.cache).with_clock(options.clock);

        Self {
            cache: Arc::new(cache),
            ledger: CalculationLedger::new(calculation_store),
            accounts,
            verifier: Arc::new(verifier),
            health,
            environment: options.environment,
            start_time: std::time::Instant::now(),
        }
    }

    /// Build the production state from configuration: open the configured
    /// store, create the Numbeo client and apply the seed file, if any.
    pub async fn from_config(config: &ApiConfig, auth: AuthConfig) -> ApiResult<Self> {
        let source: Arc<dyn PricingSource> = Arc::new(NumbeoClient::new(config.pricing.clone())?);
        let verifier = IdentityVerifier::new(auth);
        let options = StateOptions {
            cache: CacheConfig::new().with_freshness_window(config.freshness_window),
            environment: config.environment,
            clock: Arc::new(SystemClock),
        };

        let state = match &config.storage {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory store");
                Self::new(Arc::new(InMemoryStore::new()), source, verifier, options)
            }
            StorageBackend::Lmdb { path, map_size_mb } => {
                tracing::info!(path = %path.display(), map_size_mb, "Opening LMDB store");
                let store = LmdbStore::open(path, *map_size_mb).map_err(CostwiseError::from)?;
                Self::new(Arc::new(store), source, verifier, options)
            }
        };

        if let Some(seed_file) = &config.seed_file {
            let seeded = state.seed_from_file(seed_file).await?;
            tracing::info!(path = %seed_file.display(), seeded, "Applied city seed file");
        }

        Ok(state)
    }

    /// Upsert every entry of a JSON array file. Entries without
    /// `lastRefreshed` are stamped with the cache clock. Returns how many
    /// were written.
    pub async fn seed_from_file(&self, path: &Path) -> ApiResult<usize> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            ApiError::invalid_input(format!("Cannot read seed file {}: {}", path.display(), e))
        })?;
        let entries: Vec<CityUpsertRequest> = serde_json::from_str(&raw).map_err(|e| {
            ApiError::invalid_input(format!("Invalid seed file {}: {}", path.display(), e))
        })?;

        let mut seeded = 0;
        for entry in entries {
            let record = entry.into_record(self.cache.now())?;
            self.cache.upsert_manual(record).await?;
            seeded += 1;
        }
        Ok(seeded)
    }
}
