#![forbid(unsafe_code)]

use cartracker_contracts::car::{Car, Repair, Vin};
use cartracker_contracts::{MonotonicTimeNs, SchemaVersion};
use cartracker_storage::memory::{MemoryLedger, SNAPSHOT_SCHEMA_VERSION};
use cartracker_storage::repo::CarRepo;
use cartracker_storage::stub::{ChaincodeStub, LedgerError, SignedCreator};

fn vin() -> Vin {
    Vin::new("SHHFK2760CU003289").unwrap()
}

fn civic() -> Car {
    Car::v1(
        vin(),
        "Honda".to_string(),
        "Civic".to_string(),
        "Black".to_string(),
        "Honda".to_string(),
        "2024-01-01".to_string(),
    )
}

fn commit_car(ledger: &mut MemoryLedger, tx: &str, ts: u64, car: &Car) {
    let mut stub = ledger.begin(tx, None, MonotonicTimeNs(ts));
    stub.store_car(car).unwrap();
    let rw = stub.into_rw_set();
    ledger.commit(rw).unwrap();
}

#[test]
fn at_car_db_01_snapshot_round_trip_preserves_state_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut ledger = MemoryLedger::new();
    commit_car(&mut ledger, "tx1", 10, &civic());
    commit_car(
        &mut ledger,
        "tx2",
        20,
        &civic().with_repair(Repair::new("2024-06-01", "InsuranceOrgMSP", "Windshield")),
    );
    ledger.save_snapshot(&path).unwrap();

    let restored = MemoryLedger::load_snapshot(&path).unwrap();
    assert_eq!(restored, ledger);
    assert_eq!(restored.versions(vin().as_str()).len(), 2);
    assert_eq!(restored.versions(vin().as_str())[0].tx_id, "tx1");
    assert_eq!(restored.versions(vin().as_str())[1].timestamp, MonotonicTimeNs(20));
}

#[test]
fn at_car_db_02_missing_or_blank_snapshot_is_empty_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("none.json");
    assert_eq!(MemoryLedger::load_snapshot(&missing).unwrap(), MemoryLedger::new());

    let blank = dir.path().join("blank.json");
    std::fs::write(&blank, "  \n").unwrap();
    assert_eq!(MemoryLedger::load_snapshot(&blank).unwrap(), MemoryLedger::new());
}

#[test]
fn at_car_db_03_unknown_snapshot_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(
        &path,
        r#"{"schema_version":9,"ledger":{"last_seq":0,"keys":{}}}"#,
    )
    .unwrap();
    assert!(matches!(
        MemoryLedger::load_snapshot(&path),
        Err(LedgerError::SnapshotVersion { found: 9 })
    ));
}

#[test]
fn at_car_db_04_creator_is_exposed_to_chaincode() {
    let ledger = MemoryLedger::new();
    let creator = SignedCreator::new("InsuranceOrgMSP", "ca.insuranceorg.cartracker.com");
    let stub = ledger.begin("tx1", Some(creator.clone()), MonotonicTimeNs(1));
    assert_eq!(stub.tx_id(), "tx1");
    assert_eq!(stub.creator(), Some(&creator));
}

#[test]
fn at_car_db_05_concurrent_repairs_on_same_car_do_not_lose_updates() {
    let mut ledger = MemoryLedger::new();
    commit_car(&mut ledger, "tx0", 1, &civic());

    let simulate_repair = |tx: &str, details: &str| {
        let mut stub = ledger.begin(tx, None, MonotonicTimeNs(2));
        let car = stub.load_car(&vin()).unwrap().unwrap();
        stub.store_car(&car.with_repair(Repair::new("2024-06-01", "InsuranceOrgMSP", details)))
            .unwrap();
        stub.into_rw_set()
    };
    let first = simulate_repair("tx_a", "front bumper");
    let second = simulate_repair("tx_b", "rear bumper");

    ledger.commit(first).unwrap();
    assert!(matches!(
        ledger.commit(second),
        Err(LedgerError::MvccReadConflict { .. })
    ));

    let mut stub = ledger.begin("q", None, MonotonicTimeNs(3));
    let stored = stub.load_car(&vin()).unwrap().unwrap();
    assert_eq!(stored.repairs.len(), 1);
    assert_eq!(stored.repairs[0].details, "front bumper");
}

#[test]
fn at_car_db_06_snapshot_document_carries_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");
    let mut ledger = MemoryLedger::new();
    commit_car(&mut ledger, "tx1", 1, &civic());
    ledger.save_snapshot(&path).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        doc["schema_version"],
        serde_json::json!(SNAPSHOT_SCHEMA_VERSION.0)
    );
    assert_eq!(SNAPSHOT_SCHEMA_VERSION, SchemaVersion(1));
}
