//! Calculation ledger.
//!
//! Every operation takes the caller's [`Identity`] explicitly and touches
//! only that identity's partition of the store.

use std::sync::Arc;

use costwise_core::{
    validate_salary, CalculationRecord, CostwiseResult, Identity, NewCalculation, Timestamp,
};
use tracing::info;

use crate::store::CalculationStore;

/// Owner-scoped history of saved calculations.
#[derive(Clone)]
pub struct CalculationLedger {
    store: Arc<dyn CalculationStore>,
}

impl CalculationLedger {
    pub fn new(store: Arc<dyn CalculationStore>) -> Self {
        Self { store }
    }

    /// Validate and append a calculation for `identity`.
    ///
    /// Fails with `InvalidInput` on malformed fields and `DuplicateTimestamp`
    /// if the caller already has a record at that timestamp.
    pub async fn save(
        &self,
        identity: &Identity,
        calculation: NewCalculation,
    ) -> CostwiseResult<CalculationRecord> {
        calculation.validate()?;
        let record = calculation.into_record(identity.owner().clone());
        self.store.calculation_insert(&record).await?;
        info!(
            owner = %record.owner,
            city = %record.city,
            timestamp = %record.timestamp,
            "Saved calculation"
        );
        Ok(record)
    }

    /// The caller's records, most recent first.
    pub async fn list(&self, identity: &Identity) -> CostwiseResult<Vec<CalculationRecord>> {
        self.store.calculation_list_by_owner(identity.owner()).await
    }

    /// Replace the salary of one of the caller's records.
    ///
    /// Derived monetary fields and the verdict are left as saved.
    pub async fn update_salary(
        &self,
        identity: &Identity,
        timestamp: Timestamp,
        salary: f64,
    ) -> CostwiseResult<CalculationRecord> {
        validate_salary("salary", salary, true)?;
        let record = self
            .store
            .calculation_update_salary(identity.owner(), timestamp, salary)
            .await?;
        info!(owner = %record.owner, timestamp = %timestamp, "Updated calculation salary");
        Ok(record)
    }

    /// Delete one of the caller's records.
    pub async fn delete(&self, identity: &Identity, timestamp: Timestamp) -> CostwiseResult<()> {
        self.store
            .calculation_delete(identity.owner(), timestamp)
            .await?;
        info!(owner = %identity.owner(), timestamp = %timestamp, "Deleted calculation");
        Ok(())
    }
}
