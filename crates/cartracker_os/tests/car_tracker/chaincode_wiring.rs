#![forbid(unsafe_code)]

use cartracker_contracts::access::OrgRole;
use cartracker_contracts::car::{Car, Repair, Vin};
use cartracker_contracts::MonotonicTimeNs;
use cartracker_os::chaincode::CarTrackerChaincode;
use cartracker_os::config::CarTrackerConfig;
use cartracker_os::identity::CreatorIdentityResolver;
use cartracker_os::runtime::{LocalPeer, TxOutcome, TxProposal};
use cartracker_storage::memory::MemoryLedger;
use cartracker_storage::stub::SignedCreator;

struct Harness {
    peer: LocalPeer<CreatorIdentityResolver>,
    clock: u64,
}

impl Harness {
    fn new() -> Self {
        Self {
            peer: LocalPeer::new(
                MemoryLedger::new(),
                CarTrackerChaincode::new(CarTrackerConfig::mvp_v1(), CreatorIdentityResolver),
            ),
            clock: 0,
        }
    }

    fn invoke_as(
        &mut self,
        creator: Option<SignedCreator>,
        function: &str,
        args: &[&str],
    ) -> TxOutcome {
        self.clock += 1;
        self.peer.submit(&TxProposal::v1(
            creator,
            function,
            args.iter().map(|a| a.to_string()).collect(),
            MonotonicTimeNs(self.clock),
        ))
    }

    fn invoke(&mut self, role: OrgRole, function: &str, args: &[&str]) -> TxOutcome {
        let creator = SignedCreator::new(role.msp_id(), role.ca_common_name());
        self.invoke_as(Some(creator), function, args)
    }

    fn query(&mut self, vin: &str) -> TxOutcome {
        self.invoke_as(None, "queryCar", &[vin])
    }

    fn history(&mut self, vin: &str) -> TxOutcome {
        self.invoke_as(None, "getCarHistory", &[vin])
    }

    fn stored_car(&mut self, vin: &str) -> Car {
        let out = self.query(vin);
        assert!(out.response.is_ok(), "{}", out.response.message);
        Car::from_ledger_bytes(&out.response.payload).unwrap()
    }

    fn create(&mut self, vin: &str) {
        let out = self.invoke(
            OrgRole::Manufacturer,
            "createCar",
            &[vin, "Honda", "Civic", "Black", "Honda", "2024-01-01"],
        );
        assert!(out.response.is_ok(), "{}", out.response.message);
    }
}

#[test]
fn at_cc_wiring_01_create_stores_supplied_fields_with_empty_repairs() {
    let mut h = Harness::new();
    h.create("VIN1");
    let car = h.stored_car("VIN1");
    assert_eq!(
        car,
        Car::v1(
            Vin::new("VIN1").unwrap(),
            "Honda".to_string(),
            "Civic".to_string(),
            "Black".to_string(),
            "Honda".to_string(),
            "2024-01-01".to_string(),
        )
    );
    assert!(car.repairs.is_empty());
}

#[test]
fn at_cc_wiring_02_owner_change_touches_only_owner() {
    let mut h = Harness::new();
    h.create("VIN1");
    h.invoke(OrgRole::Insurance, "addRepairWork", &["VIN1", "2024-03-01", "", "Tyres"]);
    let before = h.stored_car("VIN1");

    let out = h.invoke(
        OrgRole::CarRegistrationAuthority,
        "changeCarOwner",
        &["VIN1", "Alice"],
    );
    assert!(out.response.is_ok(), "{}", out.response.message);

    let after = h.stored_car("VIN1");
    assert_eq!(after.owner, "Alice");
    assert_eq!(after, before.with_owner("Alice"));
}

#[test]
fn at_cc_wiring_03_repair_appends_exactly_one_entry() {
    let mut h = Harness::new();
    h.create("VIN1");
    for (i, details) in ["Broken windshield", "Dented door"].into_iter().enumerate() {
        let before = h.stored_car("VIN1").repairs.len();
        let out = h.invoke(
            OrgRole::Insurance,
            "addRepairWork",
            &["VIN1", "2024-06-01", "ignored", details],
        );
        assert!(out.response.is_ok(), "{}", out.response.message);
        let repairs = h.stored_car("VIN1").repairs;
        assert_eq!(repairs.len(), before + 1);
        assert_eq!(repairs[i].details, details);
        assert_eq!(repairs[i].date, "2024-06-01");
    }
}

#[test]
fn at_cc_wiring_04_query_returns_last_written_bytes() {
    let mut h = Harness::new();
    assert_eq!(h.query("VIN1").response.message, "Car with VIN VIN1 not found.");
    h.create("VIN1");
    let expected = Car::v1(
        Vin::new("VIN1").unwrap(),
        "Honda".to_string(),
        "Civic".to_string(),
        "Black".to_string(),
        "Honda".to_string(),
        "2024-01-01".to_string(),
    )
    .to_ledger_bytes()
    .unwrap();
    assert_eq!(h.query("VIN1").response.payload, expected);
    assert_eq!(h.peer.ledger().current_value("VIN1").unwrap(), expected.as_slice());
}

#[test]
fn at_cc_wiring_05_history_returns_only_the_previous_version() {
    let mut h = Harness::new();
    assert_eq!(h.history("VIN1").response.message, "Car with VIN VIN1 not found.");

    h.create("VIN1");
    let first = h.query("VIN1").response.payload;
    let out = h.history("VIN1");
    assert!(out.response.is_ok());
    assert!(out.response.payload.is_empty());

    h.invoke(OrgRole::CarRegistrationAuthority, "changeCarOwner", &["VIN1", "Alice"]);
    assert_eq!(h.history("VIN1").response.payload, first);

    let second = h.query("VIN1").response.payload;
    h.invoke(OrgRole::CarRegistrationAuthority, "changeCarOwner", &["VIN1", "Bob"]);
    assert_eq!(h.history("VIN1").response.payload, second);
}

#[test]
fn at_cc_wiring_06_unauthorized_owner_change_leaves_state_unchanged() {
    let mut h = Harness::new();
    h.create("VIN1");
    let before = h.query("VIN1").response.payload;
    let seq_before = h.peer.ledger().last_seq();

    let wrong_org = h.invoke(OrgRole::Dealership, "changeCarOwner", &["VIN1", "Mallory"]);
    assert_eq!(
        wrong_org.response.message,
        "Caller not a member of Car Registration Authority Org. Access denied."
    );

    let wrong_issuer = h.invoke_as(
        Some(SignedCreator::new(
            OrgRole::CarRegistrationAuthority.msp_id(),
            OrgRole::Buyer.ca_common_name(),
        )),
        "changeCarOwner",
        &["VIN1", "Mallory"],
    );
    assert!(!wrong_issuer.response.is_ok());

    assert_eq!(h.query("VIN1").response.payload, before);
    assert_eq!(h.peer.ledger().last_seq(), seq_before);
}

#[test]
fn at_cc_wiring_07_windshield_scenario() {
    let mut h = Harness::new();
    h.create("VIN1");
    assert!(h.stored_car("VIN1").repairs.is_empty());

    let out = h.invoke(
        OrgRole::Insurance,
        "addRepairWork",
        &["VIN1", "2024-06-01", "SomeOtherInsurerMSP", "Broken windshield"],
    );
    assert!(out.response.is_ok(), "{}", out.response.message);

    assert_eq!(
        h.stored_car("VIN1").repairs,
        vec![Repair::new("2024-06-01", OrgRole::Insurance.msp_id(), "Broken windshield")]
    );
}

#[test]
fn at_cc_wiring_08_argument_count_errors() {
    let mut h = Harness::new();
    assert_eq!(
        h.invoke(OrgRole::Manufacturer, "createCar", &["VIN1"]).response.message,
        "Incorrect number of arguments. Expecting 6"
    );
    assert_eq!(
        h.invoke(OrgRole::Insurance, "addRepairWork", &["VIN1", "d", "x"]).response.message,
        "Incorrect number of arguments. Expecting 4"
    );
    assert_eq!(
        h.invoke_as(None, "getCarHistory", &[]).response.message,
        "Incorrect number of arguments. Expecting 1"
    );
}
