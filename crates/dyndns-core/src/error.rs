//! Error types for the dyndns system
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for dyndns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the dyndns system
#[derive(Error, Debug)]
pub enum Error {
    /// The request carried no usable hostname
    #[error("Failed to determine hostname")]
    MissingHostname,

    /// Neither the request nor the connection yielded an address
    #[error("Failed to determine ip")]
    MissingIp,

    /// Listing the zone's records failed
    #[error("Failed to list records of zone {zone_id}: {message}")]
    ZoneFetch {
        /// Zone that was being read
        zone_id: String,
        /// Message of the underlying store error
        message: String,
    },

    /// Submitting a change batch failed; nothing was applied
    #[error("Failed to apply change batch to zone {zone_id}: {message}")]
    ZoneApply {
        /// Zone that was being written
        zone_id: String,
        /// Message of the underlying store error
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from store APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Wrap a store failure raised while listing a zone
    pub fn zone_fetch(zone_id: impl Into<String>, source: &Error) -> Self {
        Self::ZoneFetch {
            zone_id: zone_id.into(),
            message: source.to_string(),
        }
    }

    /// Wrap a store failure raised while applying a batch
    pub fn zone_apply(zone_id: impl Into<String>, source: &Error) -> Self {
        Self::ZoneApply {
            zone_id: zone_id.into(),
            message: source.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
