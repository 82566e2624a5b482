// # Zone Record Store Trait
//
// Defines the interface the reconciler uses to read and mutate a DNS zone.
//
// ## Implementations
//
// - In-memory: `dyndns_core::store::MemoryZoneStore`
// - Cloudflare: `dyndns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::ZoneRecordStore;
//
// let records = store.list_records("zone-id").await?;
// store.apply_change_batch("zone-id", &batch).await?;
// ```

use async_trait::async_trait;

use crate::record::{ChangeBatch, ExistingRecord};

/// Trait for zone record store implementations
///
/// # Thread Safety
///
/// Implementations are shared between concurrent requests behind an `Arc`
/// and must be `Send + Sync`.
///
/// # Contract
///
/// - `list_records` returns the complete zone; pagination is the store's job.
/// - `apply_change_batch` applies every change or none of them.
/// - No retries, no caching between calls. Every reconciliation reads a
///   fresh snapshot, and failures go straight back to the reconciler.
#[async_trait]
pub trait ZoneRecordStore: Send + Sync {
    /// List every record set in the zone
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Identifier of the zone
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ExistingRecord>)`: All record sets, in store order
    /// - `Err(Error)`: If the zone could not be read
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>, crate::Error>;

    /// Apply a change batch atomically
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Identifier of the zone
    /// - `batch`: Non-empty batch of upserts
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Every change was applied
    /// - `Err(Error)`: Nothing was applied
    async fn apply_change_batch(&self, zone_id: &str, batch: &ChangeBatch) -> Result<(), crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing zone record stores from configuration
pub trait ZoneStoreFactory: Send + Sync {
    /// Create a ZoneRecordStore instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Full configuration; stores read their `provider` section
    ///   and may use `zone_id` to seed state
    ///
    /// # Returns
    ///
    /// A boxed ZoneRecordStore trait object
    fn create(
        &self,
        config: &crate::config::DyndnsConfig,
    ) -> Result<Box<dyn ZoneRecordStore>, crate::Error>;
}
