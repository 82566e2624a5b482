// # dyndns-core
//
// Record reconciliation engine for the dyndns updater.
//
// ## Architecture Overview
//
// Given a hostname and the caller's address, the engine brings a zone's `A`
// records in line with that address:
// - **record**: Data model (DesiredUpdate, ExistingRecord, Change, ChangeBatch)
// - **matcher**: Pure selection of records that are in scope and stale
// - **Reconciler**: Fetch → select → submit one atomic batch → report names
// - **ZoneRecordStore**: Trait for the zone storage backend
// - **ZoneStoreRegistry**: Plugin-based registry of store factories
//
// ## Design Principles
//
// 1. **Stateless**: Every reconciliation reads a fresh snapshot of the zone
// 2. **Idempotent**: Records that already hold the address are never touched
// 3. **Atomic**: All changes of one call are submitted as a single batch
// 4. **Injected**: The store is a constructor argument, never a global
// 5. **Library-First**: The HTTP daemon is a thin layer over this crate

pub mod config;
pub mod error;
pub mod matcher;
pub mod reconciler;
pub mod record;
pub mod registry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{DyndnsConfig, MemoryRecordConfig, ProviderConfig, ReconcileConfig};
pub use error::{Error, Result};
pub use reconciler::Reconciler;
pub use record::{Change, ChangeAction, ChangeBatch, DesiredUpdate, ExistingRecord, RecordType};
pub use registry::ZoneStoreRegistry;
pub use store::MemoryZoneStore;
pub use traits::{ZoneRecordStore, ZoneStoreFactory};
