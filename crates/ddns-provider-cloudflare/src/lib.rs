// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `DnsProvider`.
//
// ## Scope
//
// - Lists every DNS record of one zone (following pagination)
// - Overwrites a single record's content by id
// - Maps HTTP failures onto `ddns_core::Error`
// - Spaces consecutive updates by a configurable delay
//
// Which records to touch, and when, is decided by `ReconcileEngine`. This
// crate never retries and never caches listing results.
//
// ## Security Requirements
//
// - The API key NEVER appears in logs or `Debug` output
// - Construction fails fast if the e-mail or key is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=N`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::Credentials;
use ddns_core::traits::{DnsProvider, ListedRecord, UpdateOutcome};
use ddns_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default spacing between consecutive record updates
pub const DEFAULT_UPDATE_DELAY: Duration = Duration::from_millis(200);

/// Records requested per listing page
const PAGE_SIZE: u32 = 100;

/// Upper bound on listing pages, in case `result_info` never converges
const MAX_PAGES: u32 = 500;

const PROVIDER: &str = "cloudflare";

/// Envelope shared by every v4 response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    page: Option<u32>,
    total_pages: Option<u32>,
}

/// One entry of a zone listing
///
/// Every field is optional so a single odd entry cannot poison the page.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    record_type: Option<String>,
    content: Option<String>,
    modified_on: Option<String>,
}

impl RawRecord {
    fn into_listed(self) -> Option<ListedRecord> {
        let record = ListedRecord::new(self.id?, self.name?, self.record_type?, self.content?);
        Some(match self.modified_on {
            Some(modified_on) => record.with_modified_on(modified_on),
            None => record,
        })
    }
}

/// PUT body for an A record overwrite
#[derive(Debug, Serialize)]
struct UpdateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

/// Cloudflare DNS provider
///
/// Authenticates with the account e-mail and global API key
/// (`X-Auth-Email` / `X-Auth-Key`).
///
/// # Pacing
///
/// Consecutive `update_record` calls are spaced by at least `update_delay`.
/// Updates are serialized through an internal lock, so the spacing also
/// holds if several tasks share one provider.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
pub struct CloudflareProvider {
    /// Account e-mail and API key
    /// ⚠️ NEVER log the key
    credentials: Credentials,

    /// API base URL, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Minimum spacing between two updates
    update_delay: Duration,

    /// When the previous update finished
    last_update: Mutex<Option<Instant>>,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("update_delay", &self.update_delay)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: account e-mail and API key
    /// - `timeout`: bound on every HTTP request
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if either credential is empty or the HTTP
    /// client cannot be built.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        if credentials.email.trim().is_empty() {
            return Err(Error::config("Cloudflare account e-mail cannot be empty"));
        }
        if credentials.api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            update_delay: DEFAULT_UPDATE_DELAY,
            last_update: Mutex::new(None),
        })
    }

    /// Point the provider at a different API root (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the minimum spacing between two updates
    pub fn with_update_delay(mut self, update_delay: Duration) -> Self {
        self.update_delay = update_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn update_delay(&self) -> Duration {
        self.update_delay
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("X-Auth-Email", &self.credentials.email)
            .header("X-Auth-Key", &self.credentials.api_token)
            .header("Content-Type", "application/json")
    }

    /// Fetch and decode one listing page
    async fn list_page(&self, zone_id: &str, page: u32) -> Result<(Vec<ListedRecord>, bool)> {
        let url = self.records_url(zone_id);
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("page", page), ("per_page", PAGE_SIZE)])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(map_status(status, &body, &format!("zone {}", zone_id)));
        }

        let parsed: ApiResponse<Vec<Value>> = serde_json::from_str(&body)
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if !parsed.success || !parsed.errors.is_empty() {
            return Err(Error::provider(
                PROVIDER,
                format!("Listing zone {} failed: {}", zone_id, describe(&parsed.errors)),
            ));
        }

        let entries = parsed.result.ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: result is not an array")
        })?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<RawRecord>(entry)
                .ok()
                .and_then(RawRecord::into_listed)
            {
                Some(record) => records.push(record),
                None => tracing::debug!("Skipping malformed listing entry in zone {}", zone_id),
            }
        }

        let more = parsed
            .result_info
            .map(|info| info.page.unwrap_or(page) < info.total_pages.unwrap_or(page))
            .unwrap_or(false);

        Ok((records, more))
    }

    /// Wait until `update_delay` has passed since the previous update
    async fn pace(&self, last_update: &Option<Instant>) {
        if let Some(last) = last_update {
            let ready_at = *last + self.update_delay;
            if ready_at > Instant::now() {
                tracing::trace!("Pacing next update by {:?}", ready_at - Instant::now());
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List every record of the zone
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?page=1&per_page=100
    /// X-Auth-Email: <email>
    /// X-Auth-Key: <key>
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ListedRecord>> {
        tracing::debug!("Listing DNS records of zone {}", zone_id);

        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let (mut batch, more) = self.list_page(zone_id, page).await?;
            records.append(&mut batch);
            if !more || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        tracing::debug!("Zone {} listed {} record(s)", zone_id, records.len());
        Ok(records)
    }

    /// Overwrite one A record's content
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "a.example.com",
    ///   "content": "1.2.3.4",
    ///   "ttl": 1,
    ///   "proxied": false
    /// }
    /// ```
    ///
    /// A response carrying a non-empty `errors` array is `Error::Rejected`
    /// with the raw body, whatever the HTTP status.
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record_name: &str,
        content: &str,
    ) -> Result<UpdateOutcome> {
        let mut last_update = self.last_update.lock().await;
        self.pace(&last_update).await;

        tracing::debug!("Updating Cloudflare DNS record: {} -> {}", record_name, content);

        let url = format!("{}/{}", self.records_url(zone_id), record_id);
        let payload = UpdateRecordRequest {
            record_type: "A",
            name: record_name,
            content,
            ttl: 1,
            proxied: false,
        };

        let sent = self
            .authorized(self.client.put(&url))
            .json(&payload)
            .send()
            .await;
        *last_update = Some(Instant::now());

        let response =
            sent.map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to read response: {}", e)))?;

        let parsed: Option<ApiResponse<Value>> = serde_json::from_str(&body).ok();

        if let Some(parsed) = &parsed {
            if !parsed.errors.is_empty() || (status.is_success() && !parsed.success) {
                tracing::debug!(
                    "Cloudflare rejected update of {}: {}",
                    record_name,
                    describe(&parsed.errors)
                );
                return Err(Error::rejected(record_name, body));
            }
        }

        if !status.is_success() {
            return Err(map_status(status, &body, record_name));
        }

        let parsed = parsed.ok_or_else(|| {
            Error::provider(PROVIDER, "Failed to parse response: body is not JSON")
        })?;

        let modified_on = parsed
            .result
            .as_ref()
            .and_then(|result| result.get("modified_on"))
            .and_then(Value::as_str)
            .map(str::to_string);

        tracing::debug!("DNS record updated successfully: {} -> {}", record_name, content);
        Ok(UpdateOutcome { modified_on })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a non-2xx status onto the error taxonomy
fn map_status(status: reqwest::StatusCode, body: &str, subject: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid e-mail/API key or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("Not found: {}", subject)),
        429 => Error::rate_limited(format!("Rate limit exceeded. Status: {}", status)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("Request failed: {} - {}", status, body)),
    }
}

fn describe(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "success=false".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join(", ")
}
