//! Plugin-based zone store registry
//!
//! The registry allows zone record stores to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dyndns_core::registry::ZoneStoreRegistry;
//!
//! // Registry with the built-in memory store
//! let registry = ZoneStoreRegistry::with_defaults();
//!
//! // Network-backed stores register themselves
//! dyndns_provider_cloudflare::register(&registry);
//!
//! // Create the store named by the configuration
//! let store = registry.create_store(&config)?;
//! ```

use crate::config::DyndnsConfig;
use crate::error::{Error, Result};
use crate::store::MemoryZoneStoreFactory;
use crate::traits::{ZoneRecordStore, ZoneStoreFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Zone store registry
///
/// Maps store type names to factory objects, allowing dynamic instantiation
/// of stores based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ZoneStoreRegistry {
    /// Registered zone store factories
    stores: RwLock<HashMap<String, Box<dyn ZoneStoreFactory>>>,
}

impl ZoneStoreRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the stores shipped by this crate (`memory`)
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryZoneStoreFactory));
        registry
    }

    /// Register a zone store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "cloudflare", "memory")
    /// - `factory`: Factory object for creating store instances
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn ZoneStoreFactory>) {
        let name = name.into();
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name, factory);
    }

    /// Create a zone store from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration whose `provider` names the store type
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ZoneRecordStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub fn create_store(&self, config: &DyndnsConfig) -> Result<Box<dyn ZoneRecordStore>> {
        let store_type = config.provider.type_name();
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);

        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown zone store type: {}", store_type)))?;

        factory.create(config)
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    struct MockStoreFactory;

    impl ZoneStoreFactory for MockStoreFactory {
        fn create(&self, _config: &DyndnsConfig) -> Result<Box<dyn ZoneRecordStore>> {
            Err(Error::not_found("Mock store not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ZoneStoreRegistry::new();

        assert!(!registry.has_store("mock"));

        registry.register_store("mock", Box::new(MockStoreFactory));

        assert!(registry.has_store("mock"));
        assert_eq!(registry.list_stores(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_defaults_include_memory() {
        let registry = ZoneStoreRegistry::with_defaults();
        let config = DyndnsConfig::new("Z1", ProviderConfig::default());

        let store = registry.create_store(&config).unwrap();
        assert_eq!(store.store_name(), "memory");
    }

    #[test]
    fn test_unknown_store_type() {
        let registry = ZoneStoreRegistry::with_defaults();
        let config = DyndnsConfig::new(
            "Z1",
            ProviderConfig::Cloudflare {
                api_token: "token".into(),
                dry_run: false,
            },
        );

        let err = registry.create_store(&config).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
