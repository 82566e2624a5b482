// # Memory Zone Store
//
// In-memory implementation of ZoneRecordStore.
//
// ## Purpose
//
// Provides a zone that lives only in the process. Useful for tests, local
// trials of the daemon, and as a reference for store semantics.
//
// ## Semantics
//
// - Zones are keyed by ID; listing an unknown zone fails with `NotFound`
// - Upsert replaces the values of the record set with the same name
//   (case-insensitive) and type, or appends a new set when none exists
// - A batch is validated before anything is written and applied under one
//   write lock, so readers never observe half a batch
//
// ## Crash Behavior
//
// All state is lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::{DyndnsConfig, ProviderConfig};
use crate::record::{ChangeBatch, ExistingRecord, fqdn};
use crate::traits::zone_store::{ZoneRecordStore, ZoneStoreFactory};

/// In-memory zone store implementation
///
/// Stores every zone as an ordered list of record sets behind a RwLock.
/// Clones share the same zones.
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::record::ExistingRecord;
/// use dyndns_core::store::MemoryZoneStore;
/// use dyndns_core::traits::ZoneRecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryZoneStore::with_records(
///         "zone",
///         vec![ExistingRecord::a("example.com.", ["1.2.3.4"])],
///     );
///
///     let records = store.list_records("zone").await?;
///     assert_eq!(records.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryZoneStore {
    inner: Arc<RwLock<HashMap<String, Vec<ExistingRecord>>>>,
}

impl MemoryZoneStore {
    /// Create a store without zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a single zone
    pub fn with_records(zone_id: impl Into<String>, records: Vec<ExistingRecord>) -> Self {
        let mut zones = HashMap::new();
        zones.insert(zone_id.into(), records);
        Self {
            inner: Arc::new(RwLock::new(zones)),
        }
    }

    /// Create or replace a zone
    pub async fn put_zone(&self, zone_id: impl Into<String>, records: Vec<ExistingRecord>) {
        self.inner.write().await.insert(zone_id.into(), records);
    }

    /// Number of zones held
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store holds no zones
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    fn validate(batch: &ChangeBatch) -> Result<(), Error> {
        for change in &batch.changes {
            if change.record.name.trim().is_empty() {
                return Err(Error::invalid_input("Change has an empty record name"));
            }
            if change.record.value.trim().is_empty() {
                return Err(Error::invalid_input(format!(
                    "Change for {} has an empty value",
                    change.record.name
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ZoneRecordStore for MemoryZoneStore {
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>, Error> {
        let guard = self.inner.read().await;
        guard
            .get(zone_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_id)))
    }

    async fn apply_change_batch(&self, zone_id: &str, batch: &ChangeBatch) -> Result<(), Error> {
        Self::validate(batch)?;

        let mut guard = self.inner.write().await;
        let records = guard
            .get_mut(zone_id)
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_id)))?;

        for change in &batch.changes {
            let target = &change.record;
            let name = fqdn(&target.name);
            let existing = records.iter_mut().find(|r| {
                r.record_type == target.record_type && fqdn(&r.name).eq_ignore_ascii_case(&name)
            });

            match existing {
                Some(record) => {
                    record.values = vec![target.value.clone()];
                    record.ttl = Some(target.ttl);
                }
                None => records.push(
                    ExistingRecord::new(
                        name,
                        target.record_type.clone(),
                        [target.value.clone()],
                    )
                    .with_ttl(target.ttl),
                ),
            }
        }

        tracing::debug!(
            "Applied {} change(s) to memory zone {} ({})",
            batch.len(),
            zone_id,
            batch.comment
        );
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory zone stores
pub struct MemoryZoneStoreFactory;

impl ZoneStoreFactory for MemoryZoneStoreFactory {
    fn create(&self, config: &DyndnsConfig) -> Result<Box<dyn ZoneRecordStore>, Error> {
        match &config.provider {
            ProviderConfig::Memory { records } => {
                let seeded = records
                    .iter()
                    .map(|r| ExistingRecord::new(fqdn(&r.name), r.record_type.clone(), r.values.clone()))
                    .collect();
                Ok(Box::new(MemoryZoneStore::with_records(config.zone_id.clone(), seeded)))
            }
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
