//! In-memory store for tests and single-process development.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use ::async_trait::async_trait;
use chrono::{DateTime, Utc};
use costwise_core::{
    CalculationRecord, CityCostRecord, CityKey, CostwiseResult, EmailAddress, EntityType,
    OwnerId, StorageError, Timestamp, UserAccount,
};

use crate::store::{
    calculation_key_label, duplicate_email, sort_newest_first, CalculationStore, CityCostStore,
    StoreHealth, UserStore,
};

/// In-memory implementation of every store trait.
///
/// Cloning shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    city_costs: Arc<RwLock<BTreeMap<CityKey, CityCostRecord>>>,
    calculations: Arc<RwLock<BTreeMap<(OwnerId, Timestamp), CalculationRecord>>>,
    users: Arc<RwLock<BTreeMap<EmailAddress, UserAccount>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of calculation records across all owners.
    pub fn calculation_count(&self) -> usize {
        self.calculations.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Total number of cached city records.
    pub fn city_count(&self) -> usize {
        self.city_costs.read().map(|m| m.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CityCostStore for InMemoryStore {
    async fn city_cost_get(&self, city: &CityKey) -> CostwiseResult<Option<CityCostRecord>> {
        let map = self
            .city_costs
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(city).cloned())
    }

    async fn city_cost_upsert(&self, record: &CityCostRecord) -> CostwiseResult<()> {
        let key = record.key()?;
        let mut map = self
            .city_costs
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        map.insert(key, record.clone());
        Ok(())
    }

    async fn city_cost_list(&self) -> CostwiseResult<Vec<CityCostRecord>> {
        let map = self
            .city_costs
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.values().cloned().collect())
    }
}

#[async_trait]
impl CalculationStore for InMemoryStore {
    async fn calculation_insert(&self, record: &CalculationRecord) -> CostwiseResult<()> {
        let key = (record.owner.clone(), record.timestamp);
        let mut map = self
            .calculations
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        if map.contains_key(&key) {
            return Err(StorageError::DuplicateKey {
                entity_type: EntityType::Calculation,
                key: calculation_key_label(&record.owner, record.timestamp),
            }
            .into());
        }
        map.insert(key, record.clone());
        Ok(())
    }

    async fn calculation_list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> CostwiseResult<Vec<CalculationRecord>> {
        let map = self
            .calculations
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        let partition = (owner.clone(), DateTime::<Utc>::MIN_UTC)
            ..=(owner.clone(), DateTime::<Utc>::MAX_UTC);
        let mut records: Vec<CalculationRecord> =
            map.range(partition).map(|(_, record)| record.clone()).collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn calculation_update_salary(
        &self,
        owner: &OwnerId,
        timestamp: Timestamp,
        salary: f64,
    ) -> CostwiseResult<CalculationRecord> {
        let mut map = self
            .calculations
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let record = map
            .get_mut(&(owner.clone(), timestamp))
            .ok_or_else(|| StorageError::NotFound {
                entity_type: EntityType::Calculation,
                key: calculation_key_label(owner, timestamp),
            })?;
        record.salary = salary;
        Ok(record.clone())
    }

    async fn calculation_delete(
        &self,
        owner: &OwnerId,
        timestamp: Timestamp,
    ) -> CostwiseResult<()> {
        let mut map = self
            .calculations
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        match map.remove(&(owner.clone(), timestamp)) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound {
                entity_type: EntityType::Calculation,
                key: calculation_key_label(owner, timestamp),
            }
            .into()),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn user_insert(&self, account: &UserAccount) -> CostwiseResult<()> {
        let mut map = self.users.write().map_err(|_| StorageError::LockPoisoned)?;
        if map.contains_key(&account.email) {
            return Err(duplicate_email(&account.email));
        }
        map.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn user_get_by_email(&self, email: &EmailAddress) -> CostwiseResult<Option<UserAccount>> {
        let map = self.users.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(email).cloned())
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> CostwiseResult<()> {
        self.city_costs
            .read()
            .map(|_| ())
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
