//! Core traits for the dyndns system
//!
//! - [`ZoneRecordStore`]: Read and atomically mutate a DNS zone

pub mod zone_store;

pub use zone_store::{ZoneRecordStore, ZoneStoreFactory};
