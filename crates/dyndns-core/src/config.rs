//! Configuration types for the dyndns system
//!
//! This module defines all configuration structures used throughout the workspace.

use serde::{Deserialize, Serialize};

use crate::record::{DEFAULT_CHANGE_COMMENT, DEFAULT_TTL, RecordType};

/// Upper bound accepted for record TTLs (one day)
pub const MAX_TTL: u32 = 86_400;

/// Main dyndns configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DyndnsConfig {
    /// Zone whose records are reconciled
    pub zone_id: String,

    /// Zone store configuration
    pub provider: ProviderConfig,

    /// Optional reconciliation settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl DyndnsConfig {
    /// Create a configuration for `zone_id` with default settings
    pub fn new(zone_id: impl Into<String>, provider: ProviderConfig) -> Self {
        Self {
            zone_id: zone_id.into(),
            provider,
            reconcile: ReconcileConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Zone ID cannot be empty"));
        }

        self.provider.validate()?;
        self.reconcile.validate()?;

        Ok(())
    }
}

/// Zone store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare API v4
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// List records but never submit batches
        #[serde(default)]
        dry_run: bool,
    },

    /// In-memory zone, seeded from configuration
    Memory {
        /// Records the zone starts with
        #[serde(default)]
        records: Vec<MemoryRecordConfig>,
    },

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Memory { records } => {
                for record in records {
                    if record.name.trim().is_empty() {
                        return Err(crate::Error::config("Memory record name cannot be empty"));
                    }
                    if record.values.is_empty() {
                        return Err(crate::Error::config(format!(
                            "Memory record {} has no values",
                            record.name
                        )));
                    }
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Memory { .. } => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Memory {
            records: Vec::new(),
        }
    }
}

/// A record the in-memory zone starts with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecordConfig {
    /// Record name; a trailing dot is added if missing
    pub name: String,

    /// Record type
    #[serde(default = "default_record_type", rename = "type")]
    pub record_type: RecordType,

    /// Initial values
    pub values: Vec<String>,
}

impl MemoryRecordConfig {
    /// Create an `A` record seed
    pub fn a(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::A,
            values: vec![value.into()],
        }
    }
}

fn default_record_type() -> RecordType {
    RecordType::A
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// TTL of upserted records (in seconds)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Comment tag attached to each change batch
    #[serde(default = "default_comment")]
    pub comment: String,

    /// Whether subdomains of the requested hostname are updated too
    #[serde(default = "default_include_subdomains")]
    pub include_subdomains: bool,
}

impl ReconcileConfig {
    /// Validate the reconciliation settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 || self.ttl > MAX_TTL {
            return Err(crate::Error::config(format!(
                "Record TTL must be between 1 and {} seconds. Got: {}",
                MAX_TTL, self.ttl
            )));
        }
        if self.comment.trim().is_empty() {
            return Err(crate::Error::config("Change comment cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            comment: default_comment(),
            include_subdomains: default_include_subdomains(),
        }
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_comment() -> String {
    DEFAULT_CHANGE_COMMENT.to_string()
}

fn default_include_subdomains() -> bool {
    true
}
