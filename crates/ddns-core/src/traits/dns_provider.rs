// # DNS Provider Trait
//
// Defines the interface for reading and updating DNS records via a
// provider's REST API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     // Resolve record ids once
//     let records = provider.list_records("zone-id").await?;
//
//     // Then update single records by id
//     provider.update_record("zone-id", &records[0].id, &records[0].name, "1.2.3.4").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// One entry of a zone listing
///
/// Only well-formed entries reach the engine; providers skip entries that
/// lack any of the required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRecord {
    /// Provider record id
    pub id: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record type as reported by the provider ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// Record content (the address for A records)
    pub content: String,
    /// Raw last-modified timestamp, if the provider sent one
    pub modified_on: Option<String>,
}

impl ListedRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            modified_on: None,
        }
    }

    /// Attach a raw last-modified timestamp
    pub fn with_modified_on(mut self, modified_on: impl Into<String>) -> Self {
        self.modified_on = Some(modified_on.into());
        self
    }
}

/// Result of a successful record update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Raw last-modified timestamp from the provider response, if present
    pub modified_on: Option<String>,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// Providers execute exactly the API call they are asked for and report the
/// result. They never decide whether an update is needed, never retry, and
/// never hold record state between calls.
///
/// ## Rate limiting
///
/// Providers own the pacing of their own API. An implementation that must
/// space out writes (Cloudflare does) enforces that spacing inside
/// [`DnsProvider::update_record`]; the engine issues calls back to back.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List all records of a zone
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ListedRecord>)`: Every well-formed record in the zone
    /// - `Err(Error)`: If the listing request itself failed
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ListedRecord>, crate::Error>;

    /// Point an existing A record at a new address
    ///
    /// # Parameters
    ///
    /// - `zone_id`: Zone the record lives in
    /// - `record_id`: Provider record id (from [`DnsProvider::list_records`])
    /// - `record_name`: Fully-qualified record name
    /// - `content`: New IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome)`: The provider accepted the update
    /// - `Err(Error::Rejected { .. })`: The provider answered with an error payload
    /// - `Err(Error)`: Any other failure
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record_name: &str,
        content: &str,
    ) -> Result<UpdateOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
