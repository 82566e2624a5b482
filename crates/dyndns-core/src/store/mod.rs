// # Zone Store Implementations
//
// This module provides the zone record stores that ship with the core.
// Network-backed stores live in their own crates.

pub mod memory;

pub use memory::{MemoryZoneStore, MemoryZoneStoreFactory};
