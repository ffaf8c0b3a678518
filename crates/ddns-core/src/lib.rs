// # ddns-core
//
// Core library for the Cloudflare dynamic DNS updater.
//
// ## Architecture Overview
//
// This library keeps a set of DNS "A" records pointed at the current public
// IPv4 address:
// - **IpResolver**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for listing and updating records via a provider API
// - **Notifier**: Trait for best-effort, batched status reporting
// - **RecordState**: In-memory state of every tracked subdomain
// - **ReconcileEngine**: Scheduler-driven cycle tying the above together
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic is separate from HTTP plumbing
// 2. **Single Owner**: Only the engine mutates record state
// 3. **Cheap Steady State**: The zone is listed once; later cycles touch only drifted records
// 4. **Library-First**: The daemon is a thin wiring layer over this crate
// 5. **Failure Containment**: A failing record or sink never aborts a cycle

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{DnsProvider, IpResolver, Notifier};
pub use traits::{ListedRecord, Notification, NotifyLevel, TracingNotifier, UpdateOutcome};
pub use engine::{CycleOutcome, CycleReport, ReconcileEngine};
pub use config::{Credentials, EngineConfig, NotifyConfig, Settings};
pub use error::{Error, Result};
pub use state::{RecordState, TrackedRecord};
