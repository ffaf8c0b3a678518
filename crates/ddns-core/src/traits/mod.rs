//! Collaborator traits for the DDNS system
//!
//! The reconciliation engine talks to the outside world only through these
//! interfaces.
//!
//! - [`IpResolver`]: Discover the current public IPv4 address
//! - [`DnsProvider`]: List zone records and update a single record
//! - [`Notifier`]: Deliver leveled, batched status messages

pub mod ip_resolver;
pub mod dns_provider;
pub mod notifier;

pub use ip_resolver::IpResolver;
pub use dns_provider::{DnsProvider, ListedRecord, UpdateOutcome};
pub use notifier::{Notification, Notifier, NotifyLevel, TracingNotifier};
