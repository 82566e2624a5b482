//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides a call-counting zone store that can be told to fail,
//! so tests can verify how many reads and writes a reconciliation performs.

#![allow(dead_code)]

use dyndns_core::error::{Error, Result};
use dyndns_core::record::{ChangeBatch, ExistingRecord};
use dyndns_core::traits::ZoneRecordStore;
use dyndns_core::{ReconcileConfig, Reconciler};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "Z0TESTZONE";

/// A mock ZoneRecordStore that tracks calls
///
/// Applied batches are written into the held records with upsert semantics,
/// so consecutive reconciliations observe earlier changes.
pub struct MockZoneStore {
    /// Records of the single zone
    records: Arc<Mutex<Vec<ExistingRecord>>>,
    /// Call counter for list_records()
    list_call_count: Arc<AtomicUsize>,
    /// Call counter for apply_change_batch()
    apply_call_count: Arc<AtomicUsize>,
    /// Batches passed to apply_change_batch(), including rejected ones
    submitted: Arc<Mutex<Vec<ChangeBatch>>>,
    /// When set, list_records() fails
    fail_list: Arc<AtomicBool>,
    /// When set, apply_change_batch() fails without changing anything
    fail_apply: Arc<AtomicBool>,
}

impl MockZoneStore {
    pub fn new(records: Vec<ExistingRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            apply_call_count: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(Mutex::new(Vec::new())),
            fail_list: Arc::new(AtomicBool::new(false)),
            fail_apply: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a new MockZoneStore that shares state and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            list_call_count: Arc::clone(&other.list_call_count),
            apply_call_count: Arc::clone(&other.apply_call_count),
            submitted: Arc::clone(&other.submitted),
            fail_list: Arc::clone(&other.fail_list),
            fail_apply: Arc::clone(&other.fail_apply),
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn apply_call_count(&self) -> usize {
        self.apply_call_count.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<ChangeBatch> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<ExistingRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Current values of the record named `name`
    pub fn values_of(&self, name: &str) -> Vec<String> {
        self.records()
            .into_iter()
            .find(|r| r.name == name)
            .map(|r| r.values)
            .unwrap_or_default()
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_apply(&self, fail: bool) {
        self.fail_apply.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ZoneRecordStore for MockZoneStore {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID, "reconciler must list the configured zone");

        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::http("connection reset"));
        }
        Ok(self.records())
    }

    async fn apply_change_batch(&self, zone_id: &str, batch: &ChangeBatch) -> Result<()> {
        self.apply_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID, "reconciler must write the configured zone");
        self.submitted.lock().unwrap().push(batch.clone());

        if self.fail_apply.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "InvalidChangeBatch"));
        }

        let mut records = self.records.lock().unwrap();
        for change in &batch.changes {
            if let Some(record) = records.iter_mut().find(|r| r.name == change.record.name) {
                record.values = vec![change.record.value.clone()];
                record.ttl = Some(change.record.ttl);
            }
        }
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to build a reconciler over a store sharing counters with `store`
pub fn reconciler_for(store: &MockZoneStore) -> Reconciler {
    Reconciler::new(
        Arc::new(MockZoneStore::sharing_counters_with(store)),
        ZONE_ID,
        &ReconcileConfig::default(),
    )
    .expect("reconciler construction succeeds")
}

/// The three-record zone used by the subdomain scenarios
pub fn example_zone() -> Vec<ExistingRecord> {
    vec![
        ExistingRecord::a("example.com.", ["1.1.1.1"]),
        ExistingRecord::a("a.example.com.", ["1.1.1.1"]),
        ExistingRecord::a("other.com.", ["1.1.1.1"]),
    ]
}
