//! Async store traits for the keyed collections.
//!
//! City cost records are keyed by canonical city. Calculation records are
//! keyed by `(owner, timestamp)`. Accounts are keyed by normalized email.
//! Every method is a single-record atomic operation except the list reads.

use ::async_trait::async_trait;
use costwise_core::{
    CalculationRecord, CityCostRecord, CityKey, CostwiseResult, EmailAddress, OwnerId, Timestamp,
    UserAccount,
};

/// Keyed collection of city cost records.
#[async_trait]
pub trait CityCostStore: Send + Sync {
    /// Get the record for a city.
    async fn city_cost_get(&self, city: &CityKey) -> CostwiseResult<Option<CityCostRecord>>;

    /// Insert or overwrite the record keyed by its city.
    async fn city_cost_upsert(&self, record: &CityCostRecord) -> CostwiseResult<()>;

    /// List all records ordered by city key.
    async fn city_cost_list(&self) -> CostwiseResult<Vec<CityCostRecord>>;
}

/// Keyed collection of calculation records, partitioned by owner.
#[async_trait]
pub trait CalculationStore: Send + Sync {
    /// Insert a record. Fails with `DuplicateKey` if the owner already has a
    /// record at that timestamp.
    async fn calculation_insert(&self, record: &CalculationRecord) -> CostwiseResult<()>;

    /// List one owner's records, most recent timestamp first.
    async fn calculation_list_by_owner(
        &self,
        owner: &OwnerId,
    ) -> CostwiseResult<Vec<CalculationRecord>>;

    /// Replace the salary of one record and return the updated record.
    async fn calculation_update_salary(
        &self,
        owner: &OwnerId,
        timestamp: Timestamp,
        salary: f64,
    ) -> CostwiseResult<CalculationRecord>;

    /// Delete one record.
    async fn calculation_delete(&self, owner: &OwnerId, timestamp: Timestamp)
        -> CostwiseResult<()>;
}

/// Registered accounts keyed by normalized email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert an account. Fails with `DuplicateKey` if the email is taken.
    async fn user_insert(&self, account: &UserAccount) -> CostwiseResult<()>;

    async fn user_get_by_email(&self, email: &EmailAddress) -> CostwiseResult<Option<UserAccount>>;
}

/// Readiness check for a backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> CostwiseResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Sort calculations newest first.
pub(crate) fn sort_newest_first(records: &mut [CalculationRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub(crate) fn duplicate_email(email: &EmailAddress) -> costwise_core::CostwiseError {
    costwise_core::StorageError::DuplicateKey {
        entity_type: costwise_core::EntityType::User,
        key: email.to_string(),
    }
    .into()
}

pub(crate) fn calculation_key_label(owner: &OwnerId, timestamp: Timestamp) -> String {
    format!("{}@{}", owner, timestamp.to_rfc3339())
}
