use chrono::{DateTime, Utc};
use std::net::Ipv4Addr;

/// Per-subdomain record state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRecord {
    name: String,
    provider_record_id: Option<String>,
    content: Option<String>,
    last_modified: DateTime<Utc>,
    updated_this_cycle: bool,
}

impl TrackedRecord {
    /// A record as configured, before bootstrap has resolved it
    pub(crate) fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_record_id: None,
            content: None,
            last_modified: Utc::now(),
            updated_this_cycle: false,
        }
    }

    /// Fully-qualified subdomain
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider record id, `None` until bootstrap resolves it
    pub fn provider_record_id(&self) -> Option<&str> {
        self.provider_record_id.as_deref()
    }

    /// Content currently believed to be published
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Last modification time reported by the provider
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Whether the content changed during the current cycle
    pub fn updated_this_cycle(&self) -> bool {
        self.updated_this_cycle
    }

    /// Whether the published content already matches `ip`
    pub fn matches(&self, ip: Ipv4Addr) -> bool {
        self.content.as_deref() == Some(ip.to_string().as_str())
    }

    /// Seed from a zone listing. The record id is set only once.
    ///
    /// Returns `false` if the record was already resolved.
    pub(crate) fn resolve(
        &mut self,
        record_id: &str,
        content: &str,
        modified_on: Option<&str>,
    ) -> bool {
        if self.provider_record_id.is_some() {
            return false;
        }
        self.provider_record_id = Some(record_id.to_string());
        self.content = Some(content.to_string());
        self.last_modified = parse_timestamp(modified_on);
        true
    }

    /// Record a successful update
    pub(crate) fn mark_updated(&mut self, content: &str, modified_on: Option<&str>) {
        self.content = Some(content.to_string());
        self.last_modified = parse_timestamp(modified_on);
        self.updated_this_cycle = true;
    }

    pub(crate) fn reset_cycle_flag(&mut self) {
        self.updated_this_cycle = false;
    }
}

/// The set of tracked subdomains, in configuration order
#[derive(Debug, Clone, Default)]
pub struct RecordState {
    records: Vec<TrackedRecord>,
}

impl RecordState {
    /// One unresolved record per configured subdomain
    ///
    /// Duplicate names collapse into a single record.
    pub fn new<I, S>(subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::default();
        for name in subdomains {
            let name = name.into();
            if !state.contains(&name) {
                state.records.push(TrackedRecord::unresolved(name));
            }
        }
        state
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&TrackedRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedRecord> {
        self.records.iter()
    }

    /// Names of all tracked subdomains, in configuration order
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut TrackedRecord> {
        self.records.iter_mut().find(|r| r.name == name)
    }

    /// Stop tracking a subdomain
    pub(crate) fn remove(&mut self, name: &str) -> Option<TrackedRecord> {
        let index = self.records.iter().position(|r| r.name == name)?;
        Some(self.records.remove(index))
    }

    /// Drop every record that still has no provider id, returning their names
    pub(crate) fn remove_unresolved(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        self.records.retain(|r| {
            if r.provider_record_id.is_none() {
                removed.push(r.name.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub(crate) fn reset_cycle_flags(&mut self) {
        for record in &mut self.records {
            record.reset_cycle_flag();
        }
    }
}

/// Parse a provider timestamp (RFC 3339), falling back to "now"
pub fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
