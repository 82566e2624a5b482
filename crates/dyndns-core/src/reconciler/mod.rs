//! Record reconciler
//!
//! The Reconciler is responsible for:
//! - Reading a fresh snapshot of the zone from the ZoneRecordStore
//! - Selecting the records that need an update via the matcher
//! - Submitting all upserts as one atomic ChangeBatch
//! - Reporting which record names changed
//!
//! ## Architecture
//!
//! ```text
//!        DesiredUpdate
//!              │
//!              ▼
//!      ┌──────────────┐   list_records    ┌─────────────────┐
//!      │  Reconciler  │ ────────────────▶ │ ZoneRecordStore │
//!      └──────────────┘                   └─────────────────┘
//!              │                                   ▲
//!              ▼                                   │
//!      ┌──────────────┐                            │
//!      │   matcher    │                            │
//!      │  (select)    │                            │
//!      └──────────────┘                            │
//!              │          apply_change_batch       │
//!              └───────────────────────────────────┘
//!                  (only when the batch is non-empty)
//! ```
//!
//! ## Flow
//!
//! 1. List the zone (one read)
//! 2. Select records that are in scope and not yet correct
//! 3. Map each to an upsert with the configured TTL
//! 4. Submit the batch if it is non-empty (zero or one write)
//! 5. Return the names of the changed records

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::ReconcileConfig;
use crate::error::{Error, Result};
use crate::matcher;
use crate::record::{Change, ChangeBatch, DesiredUpdate, ExistingRecord};
use crate::traits::ZoneRecordStore;

/// Map the selected records of `records` to upserts
///
/// Pure; combines [`matcher::select`] with [`Change::upsert`].
pub fn build_changes(records: &[ExistingRecord], update: &DesiredUpdate, ttl: u32) -> Vec<Change> {
    matcher::select(records, update)
        .into_iter()
        .map(|record| Change::upsert(record, update.ip.as_str(), ttl))
        .collect()
}

/// Reconciles one zone against desired updates
///
/// Holds no mutable state; a single instance is shared by all requests.
/// Concurrent reconciliations touching the same records can race inside the
/// store (read-then-write without compare-and-swap).
pub struct Reconciler {
    /// Store holding the zone
    store: Arc<dyn ZoneRecordStore>,

    /// Zone to reconcile
    zone_id: String,

    /// TTL of upserted records
    ttl: u32,

    /// Comment tag of every batch
    comment: String,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `store`: Zone record store implementation
    /// - `zone_id`: Zone to reconcile
    /// - `config`: Reconciliation settings
    pub fn new(
        store: Arc<dyn ZoneRecordStore>,
        zone_id: impl Into<String>,
        config: &ReconcileConfig,
    ) -> Result<Self> {
        config.validate()?;

        let zone_id = zone_id.into();
        if zone_id.trim().is_empty() {
            return Err(Error::config("Zone ID cannot be empty"));
        }

        Ok(Self {
            store,
            zone_id,
            ttl: config.ttl,
            comment: config.comment.clone(),
        })
    }

    /// Zone this reconciler works on
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// Compute the batch for `update` without submitting it
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeBatch)`: Possibly empty batch
    /// - `Err(Error::ZoneFetch)`: If the zone could not be listed
    pub async fn plan(&self, update: &DesiredUpdate) -> Result<ChangeBatch> {
        let records = self.list_records().await?;
        debug!(
            zone_id = %self.zone_id,
            count = records.len(),
            "records: {:?}",
            records
        );

        let changes = build_changes(&records, update, self.ttl);
        Ok(ChangeBatch::new(changes, self.comment.as_str()))
    }

    /// Point `update.hostname` (and its subdomains, if requested) at `update.ip`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Names of the changed records, empty if already up to date
    /// - `Err(Error::ZoneFetch)`: If the zone could not be listed
    /// - `Err(Error::ZoneApply)`: If the batch was rejected; nothing changed
    pub async fn update_ip_for_hostname(&self, update: &DesiredUpdate) -> Result<Vec<String>> {
        let batch = self.plan(update).await?;

        if batch.is_empty() {
            debug!(
                "No records of {} need an update to {}",
                update.hostname, update.ip
            );
            return Ok(Vec::new());
        }

        self.apply(&batch).await?;

        let names = batch.names();
        info!(
            "Updated {} record(s) to {}: {}",
            names.len(),
            update.ip,
            names.join(",")
        );
        Ok(names)
    }

    /// List the zone, wrapping store failures
    async fn list_records(&self) -> Result<Vec<ExistingRecord>> {
        self.store.list_records(&self.zone_id).await.map_err(|e| {
            error!(
                "Listing zone {} via {} failed: {}",
                self.zone_id,
                self.store.store_name(),
                e
            );
            Error::zone_fetch(&self.zone_id, &e)
        })
    }

    /// Submit a non-empty batch, wrapping store failures
    async fn apply(&self, batch: &ChangeBatch) -> Result<()> {
        match serde_json::to_string(batch) {
            Ok(payload) => debug!(zone_id = %self.zone_id, "zone update: {}", payload),
            Err(e) => debug!("Unable to render change batch: {}", e),
        }

        self.store
            .apply_change_batch(&self.zone_id, batch)
            .await
            .map_err(|e| {
                error!(
                    "Applying {} change(s) to zone {} via {} failed: {}",
                    batch.len(),
                    self.zone_id,
                    self.store.store_name(),
                    e
                );
                Error::zone_apply(&self.zone_id, &e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryZoneStore;

    fn reconciler(store: MemoryZoneStore) -> Reconciler {
        Reconciler::new(Arc::new(store), "zone", &ReconcileConfig::default()).unwrap()
    }

    #[test]
    fn test_build_changes_uses_ttl_and_ip() {
        let records = vec![
            ExistingRecord::a("example.com.", ["1.1.1.1"]).with_ttl(300),
            ExistingRecord::a("other.com.", ["1.1.1.1"]),
        ];
        let update = DesiredUpdate::new("example.com", "2.2.2.2", true).unwrap();

        let changes = build_changes(&records, &update, 60);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].record.name, "example.com.");
        assert_eq!(changes[0].record.value, "2.2.2.2");
        assert_eq!(changes[0].record.ttl, 60);
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let store: Arc<dyn ZoneRecordStore> = Arc::new(MemoryZoneStore::new());

        assert!(Reconciler::new(store.clone(), " ", &ReconcileConfig::default()).is_err());

        let config = ReconcileConfig {
            ttl: 0,
            ..ReconcileConfig::default()
        };
        assert!(Reconciler::new(store, "zone", &config).is_err());
    }

    #[test]
    fn test_zone_id_is_kept() {
        let reconciler = reconciler(MemoryZoneStore::new());
        assert_eq!(reconciler.zone_id(), "zone");
    }

    #[tokio::test]
    async fn test_plan_does_not_mutate() {
        let store = MemoryZoneStore::with_records("zone", vec![ExistingRecord::a("example.com.", ["1.1.1.1"])]);
        let reconciler = reconciler(store.clone());
        let update = DesiredUpdate::new("example.com", "2.2.2.2", false).unwrap();

        let batch = reconciler.plan(&update).await.unwrap();
        assert_eq!(batch.names(), vec!["example.com."]);
        assert_eq!(batch.comment, "DynDNS");

        let records = store.list_records("zone").await.unwrap();
        assert_eq!(records[0].values, vec!["1.1.1.1"]);
    }

    #[tokio::test]
    async fn test_unknown_zone_is_a_fetch_error() {
        let reconciler = Reconciler::new(
            Arc::new(MemoryZoneStore::new()),
            "missing",
            &ReconcileConfig::default(),
        )
        .unwrap();
        let update = DesiredUpdate::new("example.com", "2.2.2.2", false).unwrap();

        let err = reconciler.update_ip_for_hostname(&update).await.unwrap_err();
        assert!(matches!(err, Error::ZoneFetch { ref zone_id, .. } if zone_id == "missing"));
    }

    #[tokio::test]
    async fn test_update_applies_and_reports_names() {
        let store = MemoryZoneStore::with_records(
            "zone",
            vec![
                ExistingRecord::a("example.com.", ["1.1.1.1"]),
                ExistingRecord::a("www.example.com.", ["1.1.1.1"]),
            ],
        );
        let reconciler = reconciler(store.clone());
        let update = DesiredUpdate::new("example.com", "2.2.2.2", true).unwrap();

        let names = reconciler.update_ip_for_hostname(&update).await.unwrap();
        assert_eq!(names, vec!["example.com.", "www.example.com."]);

        let records = store.list_records("zone").await.unwrap();
        assert!(records.iter().all(|r| r.values == vec!["2.2.2.2"]));
        assert!(records.iter().all(|r| r.ttl == Some(60)));
    }
}
