// Shared types for hoopscope: configuration, canonical records, and the
// persisted dataset snapshot.

pub mod config;
pub mod record;
pub mod snapshot;

pub use record::{CanonicalRecord, RecordKey, Scope, Season, SourceKind};
pub use snapshot::{DatasetSnapshot, SnapshotError, SnapshotStore};
