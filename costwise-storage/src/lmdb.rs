//! LMDB-backed persistent store.
//!
//! Uses the heed crate (Rust bindings for LMDB) with three named databases:
//!
//! - `city_costs`: canonical city bytes -> JSON `CityCostRecord`
//! - `calculations`: [`OwnerScopedKey`] bytes -> JSON `CalculationRecord`
//! - `users`: normalized email bytes -> JSON `UserAccount`
//!
//! Writes run in a single LMDB write transaction each, which LMDB
//! serializes, so insert-if-absent and read-modify-write updates are atomic.

use std::path::Path;

use ::async_trait::async_trait;
use costwise_core::{
    CalculationRecord, CityCostRecord, CityKey, CostwiseError, CostwiseResult, EmailAddress,
    EntityType, OwnerId, StorageError, Timestamp, UserAccount,
};
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ledger_key::OwnerScopedKey;
use crate::store::{
    calculation_key_label, duplicate_email, sort_newest_first, CalculationStore, CityCostStore,
    StoreHealth, UserStore,
};

const CITY_COSTS_DB: &str = "city_costs";
const CALCULATIONS_DB: &str = "calculations";
const USERS_DB: &str = "users";

/// Error type for LMDB store operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open a database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbStoreError> for CostwiseError {
    fn from(e: LmdbStoreError) -> Self {
        CostwiseError::Storage(StorageError::Backend {
            reason: e.to_string(),
        })
    }
}

fn txn_error(e: heed::Error) -> LmdbStoreError {
    LmdbStoreError::Transaction(e.to_string())
}

fn encode<T: Serialize>(entity_type: EntityType, value: &T) -> CostwiseResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        StorageError::Serialization {
            entity_type,
            reason: e.to_string(),
        }
        .into()
    })
}

fn decode<T: DeserializeOwned>(entity_type: EntityType, bytes: &[u8]) -> CostwiseResult<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        StorageError::Serialization {
            entity_type,
            reason: e.to_string(),
        }
        .into()
    })
}

/// LMDB store implementing every collection.
///
/// # Example
///
/// ```ignore
/// let store = LmdbStore::open("/var/lib/costwise", 256)?;
/// store.city_cost_upsert(&record).await?;
/// ```
pub struct LmdbStore {
    env: Env,
    city_costs: Database<Bytes, Bytes>,
    calculations: Database<Bytes, Bytes>,
    users: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open (or create) a store under `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the LMDB
    /// environment or databases cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        // SAFETY: the environment directory is owned by this process; the
        // same path must not be opened twice concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(3)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_error)?;
        let city_costs: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, Some(CITY_COSTS_DB))
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;
        let calculations: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, Some(CALCULATIONS_DB))
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;
        let users: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, Some(USERS_DB))
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_error)?;

        Ok(Self {
            env,
            city_costs,
            calculations,
            users,
        })
    }

    fn not_found(owner: &OwnerId, timestamp: Timestamp) -> CostwiseError {
        StorageError::NotFound {
            entity_type: EntityType::Calculation,
            key: calculation_key_label(owner, timestamp),
        }
        .into()
    }
}

#[async_trait]
impl CityCostStore for LmdbStore {
    async fn city_cost_get(&self, city: &CityKey) -> CostwiseResult<Option<CityCostRecord>> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        match self
            .city_costs
            .get(&rtxn, city.as_str().as_bytes())
            .map_err(txn_error)?
        {
            Some(bytes) => Ok(Some(decode(EntityType::CityCost, bytes)?)),
            None => Ok(None),
        }
    }

    async fn city_cost_upsert(&self, record: &CityCostRecord) -> CostwiseResult<()> {
        let key = record.key()?;
        let value = encode(EntityType::CityCost, record)?;

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        self.city_costs
            .put(&mut wtxn, key.as_str().as_bytes(), &value)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(())
    }

    async fn city_cost_list(&self) -> CostwiseResult<Vec<CityCostRecord>> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        let mut records = Vec::new();
        // Keys are canonical city bytes, so iteration order is city order.
        for entry in self.city_costs.iter(&rtxn).map_err(txn_error)? {
            let (_, bytes) = entry.map_err(txn_error)?;
            records.push(decode(EntityType::CityCost, bytes)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl CalculationStore for LmdbStore {
    async fn calculation_insert(&self, record: &CalculationRecord) -> CostwiseResult<()> {
        let key = OwnerScopedKey::new(&record.owner, record.timestamp).encode();
        let value = encode(EntityType::Calculation, record)?;

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        if self.calculations.get(&wtxn, &key).map_err(txn_error)?.is_some() {
            return Err(StorageError::DuplicateKey {
                entity_type: EntityType::Calculation,
                key: calculation_key_label(&record.owner, record.timestamp),
            }
            .into());
        }
        self.calculations
            .put(&mut wtxn, &key, &value)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(())
    }

    async fn calculation_list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> CostwiseResult<Vec<CalculationRecord>> {
        let prefix = OwnerScopedKey::owner_prefix(owner);
        let rtxn = self.env.read_txn().map_err(txn_error)?;

        let mut records: Vec<CalculationRecord> = Vec::new();
        for entry in self
            .calculations
            .prefix_iter(&rtxn, prefix.as_slice())
            .map_err(txn_error)?
        {
            let (_, bytes) = entry.map_err(txn_error)?;
            records.push(decode(EntityType::Calculation, bytes)?);
        }
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn calculation_update_salary(
        &self,
        owner: &OwnerId,
        timestamp: Timestamp,
        salary: f64,
    ) -> CostwiseResult<CalculationRecord> {
        let key = OwnerScopedKey::new(owner, timestamp).encode();

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let mut record: CalculationRecord = match self.calculations.get(&wtxn, &key).map_err(txn_error)? {
            Some(bytes) => decode(EntityType::Calculation, bytes)?,
            None => return Err(Self::not_found(owner, timestamp)),
        };
        record.salary = salary;
        let value = encode(EntityType::Calculation, &record)?;
        self.calculations
            .put(&mut wtxn, &key, &value)
            .map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(record)
    }

    async fn calculation_delete(
        &self,
        owner: &OwnerId,
        timestamp: Timestamp,
    ) -> CostwiseResult<()> {
        let key = OwnerScopedKey::new(owner, timestamp).encode();

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        let deleted = self
            .calculations
            .delete(&mut wtxn, &key)
            .map_err(txn_error)?;
        if !deleted {
            return Err(Self::not_found(owner, timestamp));
        }
        wtxn.commit().map_err(txn_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for LmdbStore {
    async fn user_insert(&self, account: &UserAccount) -> CostwiseResult<()> {
        let key = account.email.as_str().as_bytes();
        let value = encode(EntityType::User, account)?;

        let mut wtxn = self.env.write_txn().map_err(txn_error)?;
        if self.users.get(&wtxn, key).map_err(txn_error)?.is_some() {
            return Err(duplicate_email(&account.email));
        }
        self.users.put(&mut wtxn, key, &value).map_err(txn_error)?;
        wtxn.commit().map_err(txn_error)?;
        Ok(())
    }

    async fn user_get_by_email(&self, email: &EmailAddress) -> CostwiseResult<Option<UserAccount>> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        match self
            .users
            .get(&rtxn, email.as_str().as_bytes())
            .map_err(txn_error)?
        {
            Some(bytes) => Ok(Some(decode(EntityType::User, bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StoreHealth for LmdbStore {
    async fn ping(&self) -> CostwiseResult<()> {
        let rtxn = self.env.read_txn().map_err(txn_error)?;
        self.city_costs.len(&rtxn).map_err(txn_error)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "lmdb"
    }
}
