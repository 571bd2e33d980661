//! Shared fixtures for integration tests.
#![allow(dead_code)]

use powerwatch_core::{
    account::{AccountRecord, AccountSource, ConsumptionHistory},
    complaints::ComplaintSource,
    error::{DetectorError, DetectorResult},
    scheduler::CycleJournal,
    store::{CycleLogEntry, Store, StoreConnector},
    types::ReviewStatus,
    violator::{ViolatorRecord, ViolatorSink},
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub fn account(
    id: i64,
    review: Option<&str>,
    commercial: bool,
    address: &str,
    readings: &[f64],
) -> AccountRecord {
    AccountRecord {
        is_checked: review.map(ReviewStatus::parse),
        is_commercial: Some(commercial),
        address: Some(address.to_string()),
        rooms_count: Some(3),
        residents_count: Some(2),
        total_area: Some(64.0),
        consumption: Some(ConsumptionHistory::from_readings(readings)),
        ..AccountRecord::new(id)
    }
}

/// Declared-commercial accounts. They train the model but never show up
/// in the violator output.
pub fn commercial_filler(first_id: i64, n: i64) -> Vec<AccountRecord> {
    (0..n)
        .map(|i| {
            let level = 8_000.0 + 250.0 * i as f64;
            AccountRecord {
                residents_count: Some(0),
                ..account(
                    first_id + i,
                    None,
                    true,
                    &format!("Industrial Park {i}"),
                    &[level, level * 1.1, level * 0.9, level],
                )
            }
        })
        .collect()
}

pub fn seeded_store(accounts: &[AccountRecord], complaint_addresses: &[&str]) -> Store {
    let store = Store::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_clients_batch(accounts).expect("insert clients");
    for address in complaint_addresses {
        store
            .insert_complaint("neighbour runs a workshop", None, Some(address))
            .expect("insert complaint");
    }
    store
}

// ── In-memory fakes ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStores {
    pub accounts: RefCell<Vec<AccountRecord>>,
    pub complaints: RefCell<Vec<String>>,
    pub published: RefCell<Vec<ViolatorRecord>>,
    pub journal: RefCell<Vec<CycleLogEntry>>,
    pub fail_accounts: Cell<bool>,
    pub fail_complaints: Cell<bool>,
    pub fail_delete: Cell<bool>,
    pub fail_insert: Cell<bool>,
    pub delete_calls: Cell<usize>,
    pub insert_calls: Cell<usize>,
}

fn unavailable(source_name: &'static str) -> DetectorError {
    DetectorError::SourceUnavailable {
        source_name,
        reason: "simulated outage".into(),
    }
}

impl AccountSource for FakeStores {
    fn load_accounts(&self) -> DetectorResult<Vec<AccountRecord>> {
        if self.fail_accounts.get() {
            return Err(unavailable("account store"));
        }
        Ok(self.accounts.borrow().clone())
    }
}

impl ComplaintSource for FakeStores {
    fn complaint_addresses(&self) -> DetectorResult<Vec<String>> {
        if self.fail_complaints.get() {
            return Err(unavailable("complaint store"));
        }
        Ok(self.complaints.borrow().clone())
    }
}

impl ViolatorSink for FakeStores {
    fn delete_all_violators(&self) -> DetectorResult<usize> {
        self.delete_calls.set(self.delete_calls.get() + 1);
        if self.fail_delete.get() {
            return Err(unavailable("violator store"));
        }
        let n = self.published.borrow().len();
        self.published.borrow_mut().clear();
        Ok(n)
    }

    fn insert_violators(&self, violators: &[ViolatorRecord]) -> DetectorResult<usize> {
        self.insert_calls.set(self.insert_calls.get() + 1);
        if self.fail_insert.get() {
            return Err(unavailable("violator store"));
        }
        self.published.borrow_mut().extend_from_slice(violators);
        Ok(violators.len())
    }
}

/// A session handle onto shared fake stores.
pub struct FakeSession(pub Rc<FakeStores>);

impl AccountSource for FakeSession {
    fn load_accounts(&self) -> DetectorResult<Vec<AccountRecord>> {
        self.0.load_accounts()
    }
}

impl ComplaintSource for FakeSession {
    fn complaint_addresses(&self) -> DetectorResult<Vec<String>> {
        self.0.complaint_addresses()
    }
}

impl ViolatorSink for FakeSession {
    fn delete_all_violators(&self) -> DetectorResult<usize> {
        self.0.delete_all_violators()
    }

    fn insert_violators(&self, violators: &[ViolatorRecord]) -> DetectorResult<usize> {
        self.0.insert_violators(violators)
    }
}

impl CycleJournal for FakeSession {
    fn record_cycle(&self, entry: &CycleLogEntry) -> DetectorResult<()> {
        self.0.journal.borrow_mut().push(entry.clone());
        Ok(())
    }
}

pub struct FakeConnector {
    pub stores: Rc<FakeStores>,
    pub refuse: Cell<bool>,
    pub connects: Cell<usize>,
}

impl FakeConnector {
    pub fn new(stores: Rc<FakeStores>) -> Self {
        Self { stores, refuse: Cell::new(false), connects: Cell::new(0) }
    }
}

impl StoreConnector for FakeConnector {
    type Session = FakeSession;

    fn connect(&self) -> DetectorResult<FakeSession> {
        self.connects.set(self.connects.get() + 1);
        if self.refuse.get() {
            return Err(unavailable("account store"));
        }
        Ok(FakeSession(Rc::clone(&self.stores)))
    }
}

impl StoreConnector for &FakeConnector {
    type Session = FakeSession;

    fn connect(&self) -> DetectorResult<FakeSession> {
        (**self).connect()
    }
}
