// # Cloudflare Zone Record Store
//
// This crate provides a Cloudflare-backed `ZoneRecordStore` for the dyndns
// reconciler.
//
// ## Behavior
//
// - ✅ One paginated listing per reconciliation (`list_records`)
// - ✅ One batch request per non-empty change set (`apply_change_batch`)
// - ✅ Batches are executed by Cloudflare as a single transaction
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error mapping for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (failures go straight back to the caller)
// - ❌ NO caching (every reconciliation lists the zone again)
// - ❌ NO background tasks
//
// ## Record Model
//
// Cloudflare stores one record object per value and names without a trailing
// dot. Listing groups objects sharing (name, type) into one `ExistingRecord`
// whose `ids` are the object IDs, and renders names as FQDNs. Applying an
// upsert patches the first object and deletes the rest, so the record set ends
// up holding exactly the new value.
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - API token MUST be provided via environment variables only
// - Store construction MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=..&per_page=..`
// - Batch DNS Records: POST `/zones/:zone_id/dns_records/batch`

use async_trait::async_trait;
use dyndns_core::config::{DyndnsConfig, ProviderConfig};
use dyndns_core::record::{ChangeBatch, ExistingRecord, fqdn};
use dyndns_core::traits::{ZoneRecordStore, ZoneStoreFactory};
use dyndns_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per listing page
const LIST_PAGE_SIZE: u32 = 100;

/// Provider name used in errors and logs
const PROVIDER: &str = "cloudflare";

/// Response envelope shared by all Cloudflare API v4 endpoints
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

impl<T> Envelope<T> {
    fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return "no error details".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: u32,
    total_pages: u32,
}

/// One DNS record object as returned by Cloudflare
#[derive(Debug, Clone, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    ttl: Option<u32>,
}

/// Group Cloudflare record objects into record sets
///
/// Objects sharing name (case-insensitively) and type form one set; sets keep
/// the order in which their first object was listed.
fn group_records(records: Vec<DnsRecord>) -> Vec<ExistingRecord> {
    let mut grouped: Vec<ExistingRecord> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let key = (record.name.to_lowercase(), record.record_type.to_uppercase());
        match index.get(&key) {
            Some(&position) => {
                let set = &mut grouped[position];
                set.values.push(record.content);
                set.ids.push(record.id);
            }
            None => {
                index.insert(key, grouped.len());
                let mut set = ExistingRecord::new(
                    fqdn(&record.name),
                    record.record_type.as_str().into(),
                    [record.content],
                )
                .with_ids([record.id]);
                set.ttl = record.ttl;
                grouped.push(set);
            }
        }
    }

    grouped
}

/// Build the body of a batch request
///
/// Each upsert patches its first replaced object, deletes the others, or
/// posts a new object when it replaces nothing.
fn batch_payload(batch: &ChangeBatch) -> Value {
    let mut deletes = Vec::new();
    let mut patches = Vec::new();
    let mut posts = Vec::new();

    for change in &batch.changes {
        let target = &change.record;
        match change.replaces.split_first() {
            Some((first, rest)) => {
                patches.push(json!({
                    "id": first,
                    "content": target.value,
                    "ttl": target.ttl,
                    "comment": batch.comment,
                }));
                deletes.extend(rest.iter().map(|id| json!({ "id": id })));
            }
            None => posts.push(json!({
                "name": target.name.trim_end_matches('.'),
                "type": target.record_type.as_str(),
                "content": target.value,
                "ttl": target.ttl,
                "comment": batch.comment,
            })),
        }
    }

    json!({
        "deletes": deletes,
        "patches": patches,
        "posts": posts,
    })
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", context, body)),
        409 => Error::provider(
            PROVIDER,
            format!("Conflict: Records are being changed by another process. Status: {}", status),
        ),
        429 => Error::rate_limited(format!("Please retry later. Status: {}", status)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{} failed: {} - {}", context, status, body)),
    }
}

/// Cloudflare zone record store
///
/// Stateless and single-shot: one listing per `list_records`, one batch
/// request per `apply_change_batch`. Retries are left to the caller.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the store will:
/// - Perform all GET requests (zone listing)
/// - Log the intended batch payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareZoneStore {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API base URL (overridable for tests)
    base_url: String,

    /// Dry-run mode: if true, list records but skip batch submissions
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareZoneStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareZoneStore")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareZoneStore {
    /// Create a new Cloudflare zone store
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, list records but skip batch submissions
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the token is empty
    /// - `Error::Http` if the HTTP client cannot be built
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            client,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            dry_run,
        })
    }

    /// Create a store that submits batches (production/live mode)
    pub fn new_live(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, false)
    }

    /// Create a store that only logs the batches it would submit
    pub fn new_dry_run(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, true)
    }

    /// Point the store at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether batches are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send an authenticated request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, context));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", context, envelope.error_summary()),
            ));
        }

        Ok(envelope)
    }

    /// Fetch one listing page
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=1&per_page=100
    /// Authorization: Bearer <token>
    /// ```
    async fn list_page(&self, zone_id: &str, page: u32) -> Result<(Vec<DnsRecord>, Option<ResultInfo>)> {
        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);
        let request = self
            .client
            .get(&url)
            .query(&[("page", page), ("per_page", LIST_PAGE_SIZE)]);

        let envelope: Envelope<Vec<DnsRecord>> = self.send(request, "Record listing").await?;
        Ok((envelope.result.unwrap_or_default(), envelope.result_info))
    }
}

#[async_trait]
impl ZoneRecordStore for CloudflareZoneStore {
    /// List every record of the zone, following pagination
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let (batch, info) = self.list_page(zone_id, page).await?;
            let received = batch.len();
            records.extend(batch);

            let total_pages = info.map(|i| i.total_pages.max(i.page)).unwrap_or(page);
            if received == 0 || page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Listed {} Cloudflare record(s) of zone {} over {} page(s)",
            records.len(),
            zone_id,
            page
        );
        Ok(group_records(records))
    }

    /// Submit all changes in one batch request
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records/batch
    /// {
    ///   "deletes": [{ "id": "..." }],
    ///   "patches": [{ "id": "...", "content": "1.2.3.4", "ttl": 60, "comment": "DynDNS" }],
    ///   "posts": []
    /// }
    /// ```
    async fn apply_change_batch(&self, zone_id: &str, batch: &ChangeBatch) -> Result<()> {
        let url = format!("{}/zones/{}/dns_records/batch", self.base_url, zone_id);
        let payload = batch_payload(batch);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                payload
            );
            return Ok(());
        }

        tracing::info!(
            "Submitting {} change(s) to Cloudflare zone {}",
            batch.len(),
            zone_id
        );

        let request = self.client.post(&url).json(&payload);
        let _: Envelope<Value> = self.send(request, "Batch update").await?;

        tracing::info!("Cloudflare batch applied: {}", batch.names().join(","));
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare zone stores
pub struct CloudflareFactory;

impl ZoneStoreFactory for CloudflareFactory {
    fn create(&self, config: &DyndnsConfig) -> Result<Box<dyn ZoneRecordStore>> {
        match &config.provider {
            ProviderConfig::Cloudflare { api_token, dry_run } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token is required"));
                }

                if *dry_run {
                    tracing::warn!("Cloudflare store running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(CloudflareZoneStore::new(api_token.clone(), *dry_run)?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare store")),
        }
    }
}

/// Register the Cloudflare store with a registry
///
/// This function should be called during initialization to make the
/// Cloudflare store available.
///
/// # Example
///
/// ```rust
/// use dyndns_core::ZoneStoreRegistry;
///
/// let registry = ZoneStoreRegistry::with_defaults();
/// dyndns_provider_cloudflare::register(&registry);
/// assert!(registry.has_store("cloudflare"));
/// ```
pub fn register(registry: &dyndns_core::ZoneStoreRegistry) {
    registry.register_store(PROVIDER, Box::new(CloudflareFactory));
}
