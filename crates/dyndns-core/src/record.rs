//! Record data model
//!
//! Value types exchanged between the reconciler and a zone record store:
//!
//! - [`DesiredUpdate`]: what the caller wants (hostname, ip, subdomain scope)
//! - [`ExistingRecord`]: one record set as read from the zone
//! - [`Change`] / [`ChangeBatch`]: the mutation submitted back to the store
//!
//! Names follow the trailing-dot FQDN convention (`example.com.`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default TTL (in seconds) of upserted records
pub const DEFAULT_TTL: u32 = 60;

/// Default comment tag attached to every submitted batch
pub const DEFAULT_CHANGE_COMMENT: &str = "DynDNS";

/// Render a name as a fully-qualified domain name
///
/// Appends the trailing dot unless it is already there.
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// A reconciliation request
///
/// Built once per inbound request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredUpdate {
    /// Hostname to point at `ip` (relative or fully-qualified)
    pub hostname: String,
    /// Target address, compared as an opaque string
    pub ip: String,
    /// Whether subdomains of `hostname` are in scope as well
    pub include_subdomains: bool,
}

impl DesiredUpdate {
    /// Create a new update
    ///
    /// # Errors
    ///
    /// - [`Error::MissingHostname`](crate::Error::MissingHostname) if `hostname` is blank
    /// - [`Error::MissingIp`](crate::Error::MissingIp) if `ip` is blank
    pub fn new(
        hostname: impl Into<String>,
        ip: impl Into<String>,
        include_subdomains: bool,
    ) -> crate::Result<Self> {
        let hostname = hostname.into().trim().to_string();
        if hostname.is_empty() {
            return Err(crate::Error::MissingHostname);
        }

        let ip = ip.into().trim().to_string();
        if ip.is_empty() {
            return Err(crate::Error::MissingIp);
        }

        Ok(Self {
            hostname,
            ip,
            include_subdomains,
        })
    }

    /// The hostname as a fully-qualified name
    pub fn fqdn(&self) -> String {
        fqdn(&self.hostname)
    }
}

/// DNS record type tag
///
/// Only [`RecordType::A`] takes part in reconciliation; the other variants
/// exist so listings can be represented faithfully.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name
    Cname,
    /// Text record
    Txt,
    /// Any other type, kept verbatim
    Other(String),
}

impl RecordType {
    /// The wire name of the type (`"A"`, `"AAAA"`, ...)
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Other(other) => other,
        }
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CNAME" => RecordType::Cname,
            "TXT" => RecordType::Txt,
            other => RecordType::Other(other.to_string()),
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        RecordType::from(value.as_str())
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record set read from a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecord {
    /// Fully-qualified name as stored
    pub name: String,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Current values of the record set
    pub values: Vec<String>,

    /// Current TTL, if the store reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    /// Store-assigned identifiers of the individual values
    ///
    /// Empty for stores that address record sets by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

impl ExistingRecord {
    /// Create a record set without TTL or store identifiers
    pub fn new<V: Into<String>>(
        name: impl Into<String>,
        record_type: RecordType,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            values: values.into_iter().map(Into::into).collect(),
            ttl: None,
            ids: Vec::new(),
        }
    }

    /// Shorthand for an `A` record set
    pub fn a<V: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(name, RecordType::A, values)
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the store identifiers
    pub fn with_ids<I: Into<String>>(mut self, ids: impl IntoIterator<Item = I>) -> Self {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Whether any current value equals `value`
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Change action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    /// Insert-or-update of a single named record set
    Upsert,
}

/// Desired state of one record set after a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully-qualified name
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// The single value the set will hold
    pub value: String,
    /// TTL in seconds
    pub ttl: u32,
}

/// One pending mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Always [`ChangeAction::Upsert`]
    pub action: ChangeAction,
    /// Target state
    pub record: RecordSet,
    /// Store identifiers of the snapshot record this change replaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaces: Vec<String>,
}

impl Change {
    /// Upsert `existing` so it holds exactly `value`
    pub fn upsert(existing: &ExistingRecord, value: impl Into<String>, ttl: u32) -> Self {
        Self {
            action: ChangeAction::Upsert,
            record: RecordSet {
                name: existing.name.clone(),
                record_type: existing.record_type.clone(),
                value: value.into(),
                ttl,
            },
            replaces: existing.ids.clone(),
        }
    }

    /// Name of the record set this change targets
    pub fn name(&self) -> &str {
        &self.record.name
    }
}

/// The unit of submission to a zone record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    /// Changes in submission order
    pub changes: Vec<Change>,
    /// Tag identifying this system as the author
    pub comment: String,
}

impl ChangeBatch {
    /// Create a batch
    pub fn new(changes: Vec<Change>, comment: impl Into<String>) -> Self {
        Self {
            changes,
            comment: comment.into(),
        }
    }

    /// Whether the batch holds no changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Names of the targeted record sets, in order
    pub fn names(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqdn_appends_dot_once() {
        assert_eq!(fqdn("example.com"), "example.com.");
        assert_eq!(fqdn("example.com."), "example.com.");
    }

    #[test]
    fn test_desired_update_rejects_blank_input() {
        assert!(matches!(
            DesiredUpdate::new("  ", "1.1.1.1", true),
            Err(crate::Error::MissingHostname)
        ));
        assert!(matches!(
            DesiredUpdate::new("example.com", "", true),
            Err(crate::Error::MissingIp)
        ));

        let update = DesiredUpdate::new(" example.com ", "1.1.1.1", false).unwrap();
        assert_eq!(update.hostname, "example.com");
        assert_eq!(update.fqdn(), "example.com.");
    }

    #[test]
    fn test_record_type_round_trips_through_strings() {
        assert_eq!(RecordType::from("a"), RecordType::A);
        assert_eq!(RecordType::from("AAAA"), RecordType::Aaaa);
        assert_eq!(RecordType::from("MX"), RecordType::Other("MX".to_string()));

        let json = serde_json::to_string(&RecordType::Cname).unwrap();
        assert_eq!(json, "\"CNAME\"");
    }

    #[test]
    fn test_upsert_carries_replaced_ids() {
        let existing = ExistingRecord::a("host.example.com.", ["1.1.1.1", "1.1.1.2"])
            .with_ttl(300)
            .with_ids(["id-1", "id-2"]);

        let change = Change::upsert(&existing, "2.2.2.2", DEFAULT_TTL);

        assert_eq!(change.action, ChangeAction::Upsert);
        assert_eq!(change.name(), "host.example.com.");
        assert_eq!(change.record.value, "2.2.2.2");
        assert_eq!(change.record.ttl, 60);
        assert_eq!(change.replaces, vec!["id-1", "id-2"]);
    }

    #[test]
    fn test_batch_serializes_with_upsert_action() {
        let batch = ChangeBatch::new(
            vec![Change::upsert(&ExistingRecord::a("a.", ["1.1.1.1"]), "2.2.2.2", 60)],
            DEFAULT_CHANGE_COMMENT,
        );

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["comment"], "DynDNS");
        assert_eq!(json["changes"][0]["action"], "UPSERT");
        assert_eq!(json["changes"][0]["record"]["type"], "A");
        assert!(json["changes"][0].get("replaces").is_none());
    }
}
