//! Test doubles and common utilities for engine contract tests
//!
//! This module provides minimal test doubles that count calls and record
//! what the engine asked for, without any network I/O.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{
    DnsProvider, IpResolver, ListedRecord, Notification, Notifier, NotifyLevel, UpdateOutcome,
};
use ddns_core::{EngineConfig, ReconcileEngine};
use std::collections::{HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A resolver that plays back a scripted sequence of answers
///
/// Once the script is exhausted the last answer repeats. Each call records
/// when it started and finished, so timer tests can check for overlap.
#[derive(Clone)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<Option<Ipv4Addr>>>>,
    last: Arc<Mutex<Option<Ipv4Addr>>>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    repeat_delay: Arc<Mutex<Duration>>,
    starts: Arc<Mutex<Vec<Instant>>>,
    finishes: Arc<Mutex<Vec<Instant>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    /// `None` entries simulate a resolver outage
    pub fn new(script: impl IntoIterator<Item = Option<Ipv4Addr>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            last: Arc::new(Mutex::new(None)),
            delays: Arc::new(Mutex::new(VecDeque::new())),
            repeat_delay: Arc::new(Mutex::new(Duration::ZERO)),
            starts: Arc::new(Mutex::new(Vec::new())),
            finishes: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the first calls take the given time, later calls are instant
    pub fn with_delays(self, delays: impl IntoIterator<Item = Duration>) -> Self {
        *self.delays.lock().unwrap() = delays.into_iter().collect();
        self
    }

    /// Make every call take `delay`
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.repeat_delay.lock().unwrap() = delay;
        self
    }

    /// When each resolve() call started
    pub fn starts(&self) -> Vec<Instant> {
        self.starts.lock().unwrap().clone()
    }

    /// When each resolve() call returned
    pub fn finishes(&self) -> Vec<Instant> {
        self.finishes.lock().unwrap().clone()
    }

    /// Always answer with `ip`
    pub fn fixed(ip: Ipv4Addr) -> Self {
        Self::new([Some(ip)])
    }

    /// Get the number of times resolve() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.starts.lock().unwrap().push(Instant::now());

        let delay = self
            .delays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| *self.repeat_delay.lock().unwrap());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.finishes.lock().unwrap().push(Instant::now());

        let next = self.script.lock().unwrap().pop_front();
        let answer = match next {
            Some(answer) => {
                *self.last.lock().unwrap() = answer;
                answer
            }
            None => *self.last.lock().unwrap(),
        };

        answer.ok_or_else(|| Error::resolver("checkip unreachable"))
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// One update call as seen by the mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub record_name: String,
    pub content: String,
}

/// A mock DnsProvider that serves a fixed zone listing and tracks calls
#[derive(Clone)]
pub struct MockDnsProvider {
    listing: Arc<Mutex<Vec<ListedRecord>>>,
    listing_fails: Arc<Mutex<bool>>,
    failing_records: Arc<Mutex<HashSet<String>>>,
    list_call_count: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<UpdateCall>>>,
}

impl MockDnsProvider {
    pub fn new(listing: Vec<ListedRecord>) -> Self {
        Self {
            listing: Arc::new(Mutex::new(listing)),
            listing_fails: Arc::new(Mutex::new(false)),
            failing_records: Arc::new(Mutex::new(HashSet::new())),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make updates of `record_name` fail with an error payload
    pub fn fail_updates_for(&self, record_name: &str) {
        self.failing_records
            .lock()
            .unwrap()
            .insert(record_name.to_string());
    }

    /// Let updates of `record_name` succeed again
    pub fn heal(&self, record_name: &str) {
        self.failing_records.lock().unwrap().remove(record_name);
    }

    /// Make the zone listing fail (or succeed again)
    pub fn set_listing_fails(&self, fails: bool) {
        *self.listing_fails.lock().unwrap() = fails;
    }

    /// Replace the zone listing
    pub fn set_listing(&self, listing: Vec<ListedRecord>) {
        *self.listing.lock().unwrap() = listing;
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Get every update call, in order
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    /// Total provider calls of any kind
    pub fn total_calls(&self) -> usize {
        self.list_call_count() + self.update_call_count()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _zone_id: &str) -> Result<Vec<ListedRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if *self.listing_fails.lock().unwrap() {
            return Err(Error::provider("mock", "zone listing unavailable"));
        }
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record_name: &str,
        content: &str,
    ) -> Result<UpdateOutcome> {
        self.updates.lock().unwrap().push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            record_name: record_name.to_string(),
            content: content.to_string(),
        });

        if self.failing_records.lock().unwrap().contains(record_name) {
            return Err(Error::rejected(
                record_name,
                r#"{"success":false,"errors":[{"code":9999,"message":"mock failure"}]}"#,
            ));
        }

        Ok(UpdateOutcome {
            modified_on: Some("2024-01-09T12:00:00Z".to_string()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A notifier that records everything it is handed
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count_level(&self, level: NotifyLevel) -> usize {
        self.sent().iter().filter(|n| n.level == level).count()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

/// An A record listing entry
pub fn a_record(id: &str, name: &str, content: &str) -> ListedRecord {
    ListedRecord::new(id, name, "A", content).with_modified_on("2024-01-01T00:00:00Z")
}

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}

/// Handles kept by a test after the engine took ownership of its collaborators
pub struct Harness {
    pub engine: ReconcileEngine,
    pub resolver: ScriptedResolver,
    pub provider: MockDnsProvider,
    pub notifier: RecordingNotifier,
}

/// Build an engine over zone "zone-1" with shared test doubles
pub fn harness(
    resolver: ScriptedResolver,
    provider: MockDnsProvider,
    subdomains: &[&str],
) -> Harness {
    let notifier = RecordingNotifier::new();
    let engine = ReconcileEngine::new(
        Box::new(resolver.clone()),
        Box::new(provider.clone()),
        Arc::new(notifier.clone()),
        EngineConfig::new("zone-1", subdomains.iter().copied()),
    )
    .expect("engine construction succeeds");

    Harness {
        engine,
        resolver,
        provider,
        notifier,
    }
}
