// # Record State
//
// In-memory view of every tracked subdomain: the content we believe is
// published, the provider's record id, and when the provider last touched
// the record.
//
// ## Ownership
//
// The state is owned by the `ReconcileEngine` and is only mutated through
// it. Collaborators never see it. Nothing is persisted; a restart begins
// with a fresh bootstrap.

mod record;

pub use record::{RecordState, TrackedRecord, parse_timestamp};
