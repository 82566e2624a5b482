//! Record matcher
//!
//! Decides which records of a zone snapshot must change to satisfy a
//! [`DesiredUpdate`]. Pure and side-effect free.
//!
//! A record is selected when all of the following hold:
//!
//! 1. it is an `A` record
//! 2. its name equals the hostname (as FQDN, case-insensitively), or
//!    subdomains are in scope and it is a strict subdomain of the hostname
//! 3. none of its current values already equals the desired ip
//!
//! Selection keeps the input order.

use crate::record::{DesiredUpdate, ExistingRecord, RecordType};

/// Select the records that need an upsert
///
/// Single pass over `records`; the result borrows from the input.
pub fn select<'a>(records: &'a [ExistingRecord], update: &DesiredUpdate) -> Vec<&'a ExistingRecord> {
    let domain_name = update.fqdn().to_lowercase();
    let subdomain_suffix = format!(".{}", domain_name);

    records
        .iter()
        .filter(|record| record.record_type == RecordType::A)
        .filter(|record| {
            let name = record.name.to_lowercase();
            name == domain_name || (update.include_subdomains && name.ends_with(&subdomain_suffix))
        })
        .filter(|record| requires_update(record, update))
        .collect()
}

/// Whether `record` still lacks the desired ip
pub fn requires_update(record: &ExistingRecord, update: &DesiredUpdate) -> bool {
    !record.has_value(&update.ip)
}
