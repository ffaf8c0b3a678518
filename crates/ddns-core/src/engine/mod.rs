//! Reconciliation engine
//!
//! The ReconcileEngine is responsible for:
//! - Resolving the current public IP via IpResolver
//! - Resolving provider record ids once, on the bootstrap cycle
//! - Detecting drift between the public IP and the published records
//! - Updating drifted records via DnsProvider
//! - Reporting batched results via Notifier
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Scheduler  │─── tick ───┐
//! └─────────────┘            │
//!                            ▼
//!                   ┌─────────────────┐
//!                   │ ReconcileEngine │── owns ──▶ RecordState
//!                   └─────────────────┘
//!                            │
//!         ┌──────────────────┼──────────────────┐
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ IpResolver  │   │ DnsProvider  │   │  Notifier   │
//! │ (resolve)   │   │ (list/update)│   │  (report)   │
//! └─────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve the public IP; on failure skip the cycle silently
//! 2. Short-circuit if the IP is unchanged since the last cycle
//! 3. On the first cycle only, list the zone and seed RecordState
//! 4. Update every record whose content differs from the IP
//! 5. Emit one batched notification (not on the bootstrap cycle)

mod report;

pub use report::{CycleOutcome, CycleReport};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::state::RecordState;
use crate::traits::{DnsProvider, IpResolver, ListedRecord, Notification, Notifier};
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Record type the engine manages
const MANAGED_RECORD_TYPE: &str = "A";

/// Reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`ReconcileEngine::new()`]
/// 2. Drive with [`ReconcileEngine::run_every()`] (or call
///    [`ReconcileEngine::run_cycle()`] directly)
/// 3. Drop to release
///
/// ## Concurrency
///
/// Every entry point takes `&mut self`, so two cycles can never run against
/// the same state at once.
pub struct ReconcileEngine {
    /// Public IP resolver
    resolver: Box<dyn IpResolver>,

    /// DNS provider for listing and updating records
    provider: Box<dyn DnsProvider>,

    /// Status sink, shared with the daemon
    notifier: Arc<dyn Notifier>,

    /// Zone the records live in
    zone_id: String,

    /// Tracked subdomains
    records: RecordState,

    /// Last resolved public IP
    current_ip: Option<Ipv4Addr>,

    /// Set once the first cycle has listed the zone
    bootstrapped: bool,
}

impl ReconcileEngine {
    /// Create a new engine
    ///
    /// Every configured subdomain starts out tracked, with no provider id.
    pub fn new(
        resolver: Box<dyn IpResolver>,
        provider: Box<dyn DnsProvider>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver,
            provider,
            notifier,
            zone_id: config.zone_id,
            records: RecordState::new(config.subdomains),
            current_ip: None,
            bootstrapped: false,
        })
    }

    /// Tracked records
    pub fn records(&self) -> &RecordState {
        &self.records
    }

    /// Last resolved public IP
    pub fn current_ip(&self) -> Option<Ipv4Addr> {
        self.current_ip
    }

    /// Whether the bootstrap listing has completed
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// Run cycles until `shutdown` resolves
    ///
    /// The first cycle runs immediately. A cycle that overruns the interval
    /// pushes the next one a full interval past its own end, so ticks never
    /// bunch up. Shutdown is only observed between cycles.
    ///
    /// # Returns
    ///
    /// The number of cycles that ran.
    pub async fn run_every<F>(&mut self, interval: Duration, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received after {} cycle(s)", cycles);
                    break;
                }

                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            let outcome = self.run_cycle().await;
            cycles += 1;
            debug!("Cycle {} finished: {:?}", cycles, outcome);

            let took = started.elapsed();
            if took >= interval {
                warn!(
                    "Cycle {} took {:?}, longer than the {:?} interval",
                    cycles, took, interval
                );
                ticker.reset();
            }
        }

        cycles
    }

    /// Run one reconciliation pass
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let resolved = match self.resolver.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                debug!(
                    "Public IP lookup via {} failed, skipping cycle: {}",
                    self.resolver.resolver_name(),
                    e
                );
                return CycleOutcome::ResolverUnavailable;
            }
        };

        let previous_ip = self.current_ip;
        if self.bootstrapped && previous_ip == Some(resolved) {
            debug!("Public IP unchanged ({}), nothing to do", resolved);
            return CycleOutcome::NoDrift;
        }

        self.records.reset_cycle_flags();

        if previous_ip != Some(resolved) {
            self.current_ip = Some(resolved);
            if let Some(previous) = previous_ip {
                info!("Public IP changed: {} -> {}", previous, resolved);
                self.notifier
                    .notify(Notification::info(format!("{} is the new IP address.", resolved)))
                    .await;
            }
        }

        let bootstrap = !self.bootstrapped;
        let mut report = CycleReport::new(bootstrap);

        if bootstrap {
            match self.provider.list_records(&self.zone_id).await {
                Ok(listing) => self.seed(listing, &mut report).await,
                Err(e) => {
                    self.current_ip = previous_ip;
                    self.notifier
                        .notify(
                            Notification::error(format!(
                                "Listing DNS records of zone {} failed",
                                self.zone_id
                            ))
                            .with_details([e.to_string()]),
                        )
                        .await;
                    return CycleOutcome::BootstrapFailed;
                }
            }
        }

        let reported = self.apply(resolved, &mut report).await;

        if !bootstrap && !reported.is_empty() {
            self.notifier
                .notify(Notification::info("Update about following subdomains").with_details(reported))
                .await;
        }

        self.bootstrapped = true;
        CycleOutcome::Reconciled(report)
    }

    /// Seed record state from the zone listing
    async fn seed(&mut self, listing: Vec<ListedRecord>, report: &mut CycleReport) {
        debug!("Zone {} lists {} record(s)", self.zone_id, listing.len());

        for entry in listing {
            if !self.records.contains(&entry.name) {
                continue;
            }

            if entry.record_type != MANAGED_RECORD_TYPE {
                self.records.remove(&entry.name);
                warn!(
                    "Record {} has type {}, expected {}; no longer tracked",
                    entry.name, entry.record_type, MANAGED_RECORD_TYPE
                );
                self.notifier
                    .notify(
                        Notification::warning(format!(
                            "Named subdomain '{}' does not match the type that is required to update the entry.",
                            entry.name
                        ))
                        .with_details([
                            format!("Required type: {}", MANAGED_RECORD_TYPE),
                            format!("Given type: {}", entry.record_type),
                        ]),
                    )
                    .await;
                report.removed.push(entry.name);
                continue;
            }

            if let Some(record) = self.records.get_mut(&entry.name) {
                if record.resolve(&entry.id, &entry.content, entry.modified_on.as_deref()) {
                    debug!("Resolved {} to record id {}", entry.name, entry.id);
                } else {
                    debug!("Ignoring duplicate listing entry {} for {}", entry.id, entry.name);
                }
            }
        }

        let missing = self.records.remove_unresolved();
        if !missing.is_empty() {
            warn!(
                "{} subdomain(s) not found in zone {}: {}",
                missing.len(),
                self.zone_id,
                missing.join(", ")
            );
            self.notifier
                .notify(
                    Notification::warning(format!(
                        "The following subdomains could not be found in zone {} and are no longer tracked",
                        self.zone_id
                    ))
                    .with_details(missing.clone()),
                )
                .await;
            report.removed.extend(missing);
        }
    }

    /// Push `ip` to every drifted record
    ///
    /// Returns the names to report: unchanged and updated records, in
    /// processing order.
    async fn apply(&mut self, ip: Ipv4Addr, report: &mut CycleReport) -> Vec<String> {
        let content = ip.to_string();
        let mut reported = Vec::new();

        for name in self.records.names() {
            let Some(record) = self.records.get(&name) else {
                continue;
            };

            if record.matches(ip) {
                debug!("Record {} already points at {}", name, ip);
                report.unchanged.push(name.clone());
                reported.push(name);
                continue;
            }

            let Some(record_id) = record.provider_record_id().map(str::to_string) else {
                warn!("Record {} has no provider id, skipping", name);
                continue;
            };

            match self
                .provider
                .update_record(&self.zone_id, &record_id, &name, &content)
                .await
            {
                Ok(outcome) => {
                    if let Some(record) = self.records.get_mut(&name) {
                        record.mark_updated(&content, outcome.modified_on.as_deref());
                    }
                    info!("Updated {} -> {}", name, ip);
                    report.changed.push(name.clone());
                    reported.push(name);
                }
                Err(e) => {
                    warn!(
                        "Update of {} via {} failed: {}",
                        name,
                        self.provider.provider_name(),
                        e
                    );
                    self.notifier
                        .notify(
                            Notification::error(format!("{} has been found with an error", name))
                                .with_details([e.report_payload()]),
                        )
                        .await;
                    report.failed.push(name);
                }
            }
        }

        reported
    }
}
