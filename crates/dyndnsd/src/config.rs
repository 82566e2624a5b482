//! Daemon configuration
//!
//! All configuration is read from environment variables:
//!
//! ### Server
//! - `DYNDNS_LISTEN_ADDR`: Bind address (default `0.0.0.0:8080`)
//! - `DYNDNS_CLIENT_IP_HEADER`: Header carrying the client address behind a proxy
//! - `BASIC_AUTH_USERNAME` / `BASIC_AUTH_PASSWORD`: Required credentials
//!
//! ### Zone Store
//! - `DYNDNS_ZONE_ID`: Zone to reconcile (required)
//! - `DYNDNS_PROVIDER_TYPE`: Store type (cloudflare, memory)
//! - `DYNDNS_PROVIDER_API_TOKEN`: API token (cloudflare)
//! - `DYNDNS_MEMORY_RECORDS`: Seed records, `name=ip` comma-separated (memory)
//! - `DYNDNS_MODE`: `dry-run` to log batches instead of submitting them
//!
//! ### Reconciliation
//! - `DYNDNS_INCLUDE_SUBDOMAINS`: Update subdomains too (default true)
//! - `DYNDNS_RECORD_TTL`: TTL of updated records in seconds (default 60)
//! - `DYNDNS_CHANGE_COMMENT`: Comment attached to each batch (default `DynDNS`)
//!
//! ### Logging
//! - `DYNDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)

use anyhow::{Context, Result};
use dyndns_core::config::MAX_TTL;
use dyndns_core::record::{DEFAULT_CHANGE_COMMENT, DEFAULT_TTL};
use dyndns_core::{DyndnsConfig, MemoryRecordConfig, ProviderConfig, ReconcileConfig};
use std::net::SocketAddr;

use crate::auth::BasicCredentials;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Daemon configuration
pub struct Config {
    pub listen_addr: SocketAddr,
    pub zone_id: String,
    pub provider_type: String,
    pub provider_api_token: Option<String>,
    pub memory_records: Vec<MemoryRecordConfig>,
    pub dry_run: bool,
    pub include_subdomains: bool,
    pub record_ttl: u32,
    pub change_comment: String,
    pub client_ip_header: Option<String>,
    pub basic_auth_username: String,
    pub basic_auth_password: String,
    pub log_level: String,
}

// Secrets stay out of Debug output
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("listen_addr", &self.listen_addr)
            .field("zone_id", &self.zone_id)
            .field("provider_type", &self.provider_type)
            .field("provider_api_token", &self.provider_api_token.as_ref().map(|_| "<REDACTED>"))
            .field("memory_records", &self.memory_records)
            .field("dry_run", &self.dry_run)
            .field("include_subdomains", &self.include_subdomains)
            .field("record_ttl", &self.record_ttl)
            .field("change_comment", &self.change_comment)
            .field("client_ip_header", &self.client_ip_header)
            .field("basic_auth_username", &self.basic_auth_username)
            .field("basic_auth_password", &"<REDACTED>")
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Unset and empty variables are treated alike.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let listen_addr: SocketAddr = var("DYNDNS_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse()
            .context("DYNDNS_LISTEN_ADDR must be a socket address such as 0.0.0.0:8080")?;

        let record_ttl: u32 = match var("DYNDNS_RECORD_TTL") {
            Some(ttl) => ttl
                .parse()
                .with_context(|| format!("DYNDNS_RECORD_TTL must be a number. Got: {}", ttl))?,
            None => DEFAULT_TTL,
        };

        let include_subdomains = match var("DYNDNS_INCLUDE_SUBDOMAINS") {
            Some(flag) => parse_bool(&flag)
                .with_context(|| format!("DYNDNS_INCLUDE_SUBDOMAINS must be true or false. Got: {}", flag))?,
            None => true,
        };

        let memory_records = match var("DYNDNS_MEMORY_RECORDS") {
            Some(list) => parse_memory_records(&list)?,
            None => Vec::new(),
        };

        Ok(Self {
            listen_addr,
            zone_id: var("DYNDNS_ZONE_ID").unwrap_or_default(),
            provider_type: var("DYNDNS_PROVIDER_TYPE").unwrap_or_else(|| "cloudflare".to_string()),
            provider_api_token: var("DYNDNS_PROVIDER_API_TOKEN"),
            memory_records,
            dry_run: var("DYNDNS_MODE").is_some_and(|mode| mode.eq_ignore_ascii_case("dry-run")),
            include_subdomains,
            record_ttl,
            change_comment: var("DYNDNS_CHANGE_COMMENT")
                .unwrap_or_else(|| DEFAULT_CHANGE_COMMENT.to_string()),
            client_ip_header: var("DYNDNS_CLIENT_IP_HEADER"),
            basic_auth_username: var("BASIC_AUTH_USERNAME").unwrap_or_default(),
            basic_auth_password: var("BASIC_AUTH_PASSWORD").unwrap_or_default(),
            log_level: var("DYNDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs validation of:
    /// - Required field presence
    /// - API token format (cloudflare)
    /// - Numeric ranges
    /// - Type enumerations
    pub fn validate(&self) -> Result<()> {
        if self.zone_id.is_empty() {
            anyhow::bail!(
                "DYNDNS_ZONE_ID is required. \
                Set it via: export DYNDNS_ZONE_ID=your_zone_id"
            );
        }

        if self.basic_auth_username.is_empty() || self.basic_auth_password.is_empty() {
            anyhow::bail!(
                "BASIC_AUTH_USERNAME and BASIC_AUTH_PASSWORD are required. \
                The update endpoint is never served without credentials."
            );
        }

        match self.provider_type.as_str() {
            "cloudflare" => self.validate_api_token()?,
            "memory" => {}
            _ => anyhow::bail!(
                "DYNDNS_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudflare, memory",
                self.provider_type
            ),
        }

        if self.record_ttl == 0 || self.record_ttl > MAX_TTL {
            anyhow::bail!(
                "DYNDNS_RECORD_TTL must be between 1 and {} seconds. Got: {}",
                MAX_TTL,
                self.record_ttl
            );
        }

        if let Some(header) = &self.client_ip_header
            && axum::http::HeaderName::from_bytes(header.as_bytes()).is_err()
        {
            anyhow::bail!("DYNDNS_CLIENT_IP_HEADER '{}' is not a valid header name", header);
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DYNDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn validate_api_token(&self) -> Result<()> {
        let Some(token) = &self.provider_api_token else {
            anyhow::bail!(
                "DYNDNS_PROVIDER_API_TOKEN is required for the cloudflare store. \
                Set it via: export DYNDNS_PROVIDER_API_TOKEN=your_token"
            );
        };

        // Cloudflare API tokens are 40 characters
        if token.len() < 20 {
            anyhow::bail!(
                "DYNDNS_PROVIDER_API_TOKEN appears too short ({} chars). \
                Cloudflare tokens are typically 40 characters.",
                token.len()
            );
        }

        let token_lower = token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
        {
            anyhow::bail!(
                "DYNDNS_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from Cloudflare."
            );
        }

        Ok(())
    }

    /// Core configuration for the zone store and reconciler
    pub fn dyndns_config(&self) -> DyndnsConfig {
        let provider = match self.provider_type.as_str() {
            "cloudflare" => ProviderConfig::Cloudflare {
                api_token: self.provider_api_token.clone().unwrap_or_default(),
                dry_run: self.dry_run,
            },
            "memory" => ProviderConfig::Memory {
                records: self.memory_records.clone(),
            },
            other => ProviderConfig::Custom {
                factory: other.to_string(),
                config: serde_json::Value::Null,
            },
        };

        DyndnsConfig {
            zone_id: self.zone_id.clone(),
            provider,
            reconcile: ReconcileConfig {
                ttl: self.record_ttl,
                comment: self.change_comment.clone(),
                include_subdomains: self.include_subdomains,
            },
        }
    }

    /// Credentials enforced by the auth middleware
    pub fn credentials(&self) -> BasicCredentials {
        BasicCredentials::new(&self.basic_auth_username, &self.basic_auth_password)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `name=ip[,name=ip...]` into `A` record seeds
///
/// Entries with the same name are merged into one record set.
fn parse_memory_records(list: &str) -> Result<Vec<MemoryRecordConfig>> {
    let mut records: Vec<MemoryRecordConfig> = Vec::new();

    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((name, ip)) = entry.split_once('=') else {
            anyhow::bail!(
                "DYNDNS_MEMORY_RECORDS entry '{}' must look like name=ip",
                entry
            );
        };
        let (name, ip) = (name.trim(), ip.trim());
        if name.is_empty() || ip.is_empty() {
            anyhow::bail!(
                "DYNDNS_MEMORY_RECORDS entry '{}' must look like name=ip",
                entry
            );
        }

        match records.iter_mut().find(|r| r.name.eq_ignore_ascii_case(name)) {
            Some(record) => record.values.push(ip.to_string()),
            None => records.push(MemoryRecordConfig::a(name, ip)),
        }
    }

    Ok(records)
}
