//! Calculation ledger behaviour against the in-memory and LMDB stores.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use costwise_core::{
    calculate, Affordability, CityCostRecord, CityKey, CostIndices, ErrorKind, Identity,
    NewCalculation, OwnerId, Timestamp,
};
use costwise_storage::{CalculationLedger, CalculationStore, InMemoryStore, LmdbStore};
use proptest::prelude::*;
use tempfile::TempDir;

fn identity(subject: &str) -> Identity {
    Identity::new(OwnerId::new(subject).expect("valid subject"))
}

fn base_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 10, 1, 18, 30, 0).unwrap()
}

fn new_calculation(salary: f64, timestamp: Timestamp) -> NewCalculation {
    let record = CityCostRecord::new(
        &CityKey::parse("Dublin").unwrap(),
        "Ireland",
        CostIndices {
            cost_of_living_index: 74.0,
            rent_index: 68.0,
            groceries_index: 66.0,
            restaurant_index: 77.0,
        },
        base_time(),
    );
    let breakdown = calculate(salary, &record).expect("valid salary");
    NewCalculation::from_breakdown(&breakdown, salary, timestamp)
}

fn memory_ledger() -> CalculationLedger {
    CalculationLedger::new(Arc::new(InMemoryStore::new()))
}

#[tokio::test]
async fn save_then_list_round_trips() {
    let ledger = memory_ledger();
    let alice = identity("alice");
    let input = new_calculation(72_000.0, base_time());

    let saved = ledger.save(&alice, input.clone()).await.unwrap();
    let listed = ledger.list(&alice).await.unwrap();

    assert_eq!(listed, vec![saved.clone()]);
    assert_eq!(saved.owner, *alice.owner());
    assert_eq!(saved, input.into_record(alice.owner().clone()));
}

#[tokio::test]
async fn duplicate_timestamp_is_rejected() {
    let ledger = memory_ledger();
    let alice = identity("alice");

    ledger
        .save(&alice, new_calculation(50_000.0, base_time()))
        .await
        .unwrap();
    let err = ledger
        .save(&alice, new_calculation(90_000.0, base_time()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateTimestamp);
    assert_eq!(ledger.list(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn owners_are_isolated_even_with_colliding_timestamps() {
    let ledger = memory_ledger();
    let alice = identity("alice");
    let bob = identity("bob");

    ledger
        .save(&alice, new_calculation(50_000.0, base_time()))
        .await
        .unwrap();
    ledger
        .save(&bob, new_calculation(80_000.0, base_time()))
        .await
        .unwrap();

    let alice_records = ledger.list(&alice).await.unwrap();
    assert_eq!(alice_records.len(), 1);
    assert_eq!(alice_records[0].salary, 50_000.0);

    // Bob cannot touch Alice's record at the shared timestamp.
    ledger.delete(&bob, base_time()).await.unwrap();
    assert_eq!(ledger.list(&alice).await.unwrap().len(), 1);
    let err = ledger.delete(&bob, base_time()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn list_is_newest_first() {
    let ledger = memory_ledger();
    let alice = identity("alice");
    for minutes in [10, 30, 20] {
        ledger
            .save(
                &alice,
                new_calculation(60_000.0, base_time() + Duration::minutes(minutes)),
            )
            .await
            .unwrap();
    }
    let stamps: Vec<Timestamp> = ledger
        .list(&alice)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.timestamp)
        .collect();
    assert_eq!(
        stamps,
        vec![
            base_time() + Duration::minutes(30),
            base_time() + Duration::minutes(20),
            base_time() + Duration::minutes(10),
        ]
    );
}

#[tokio::test]
async fn update_salary_changes_only_salary() {
    let ledger = memory_ledger();
    let alice = identity("alice");
    let saved = ledger
        .save(&alice, new_calculation(40_000.0, base_time()))
        .await
        .unwrap();

    let updated = ledger
        .update_salary(&alice, base_time(), 120_000.0)
        .await
        .unwrap();

    let mut expected = saved.clone();
    expected.salary = 120_000.0;
    assert_eq!(updated, expected);
    assert_eq!(updated.affordability, saved.affordability);
    assert_eq!(ledger.list(&alice).await.unwrap(), vec![expected]);
}

#[tokio::test]
async fn update_salary_rejects_non_positive() {
    let ledger = memory_ledger();
    let alice = identity("alice");
    ledger
        .save(&alice, new_calculation(40_000.0, base_time()))
        .await
        .unwrap();

    for salary in [0.0, -10.0, f64::NAN] {
        let err = ledger
            .update_salary(&alice, base_time(), salary)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}

#[tokio::test]
async fn update_missing_record_is_not_found() {
    let ledger = memory_ledger();
    let err = ledger
        .update_salary(&identity("alice"), base_time(), 10.0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_removes_record() {
    let ledger = memory_ledger();
    let alice = identity("alice");
    ledger
        .save(&alice, new_calculation(40_000.0, base_time()))
        .await
        .unwrap();

    ledger.delete(&alice, base_time()).await.unwrap();
    assert!(ledger.list(&alice).await.unwrap().is_empty());

    let err = ledger.delete(&alice, base_time()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn save_rejects_malformed_input() {
    let store = InMemoryStore::new();
    let ledger = CalculationLedger::new(Arc::new(store.clone()));
    let alice = identity("alice");

    let mut blank_city = new_calculation(40_000.0, base_time());
    blank_city.city = " ".to_string();
    let mut negative = new_calculation(40_000.0, base_time());
    negative.salary = -5.0;
    let mut nan_rent = new_calculation(40_000.0, base_time());
    nan_rent.estimated_monthly_rent = f64::NAN;

    for input in [blank_city, negative, nan_rent] {
        let err = ledger.save(&alice, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
    assert_eq!(store.calculation_count(), 0);
}

#[tokio::test]
async fn saved_verdict_label_survives() {
    let ledger = memory_ledger();
    let alice = identity("alice");
    let saved = ledger
        .save(&alice, new_calculation(10_000.0, base_time()))
        .await
        .unwrap();
    assert_eq!(saved.affordability, Affordability::NotAffordable);
}

#[tokio::test]
async fn lmdb_backed_ledger_behaves_the_same() {
    let temp_dir = TempDir::new().expect("TempDir creation should succeed");
    let store: Arc<dyn CalculationStore> =
        Arc::new(LmdbStore::open(temp_dir.path(), 10).expect("store opens"));
    let ledger = CalculationLedger::new(store);
    let alice = identity("alice");
    let bob = identity("bob");

    ledger
        .save(&alice, new_calculation(50_000.0, base_time()))
        .await
        .unwrap();
    ledger
        .save(&bob, new_calculation(60_000.0, base_time()))
        .await
        .unwrap();
    let err = ledger
        .save(&alice, new_calculation(50_000.0, base_time()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateTimestamp);

    ledger
        .update_salary(&alice, base_time(), 55_000.0)
        .await
        .unwrap();
    let alice_records = ledger.list(&alice).await.unwrap();
    assert_eq!(alice_records.len(), 1);
    assert_eq!(alice_records[0].salary, 55_000.0);

    ledger.delete(&alice, base_time()).await.unwrap();
    assert!(ledger.list(&alice).await.unwrap().is_empty());
    assert_eq!(ledger.list(&bob).await.unwrap().len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn isolation_holds_for_arbitrary_histories(
        alice_offsets in proptest::collection::btree_set(0i64..500, 0..8),
        bob_offsets in proptest::collection::btree_set(0i64..500, 0..8),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime builds");
        runtime.block_on(async {
            let ledger = memory_ledger();
            let alice = identity("alice");
            let bob = identity("bob");
            for offset in &alice_offsets {
                ledger
                    .save(&alice, new_calculation(1_000.0, base_time() + Duration::seconds(*offset)))
                    .await
                    .unwrap();
            }
            for offset in &bob_offsets {
                ledger
                    .save(&bob, new_calculation(2_000.0, base_time() + Duration::seconds(*offset)))
                    .await
                    .unwrap();
            }
            let listed = ledger.list(&alice).await.unwrap();
            assert_eq!(listed.len(), alice_offsets.len());
            assert!(listed.iter().all(|r| r.owner == *alice.owner() && r.salary == 1_000.0));
        });
    }
}
