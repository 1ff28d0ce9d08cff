//! Sync conflict model

use chrono::{DateTime, Utc};

use super::EntryId;

/// Inbound update that lost to a newer local copy under last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConflict {
    /// Entry involved in the conflict
    pub entry_id: EntryId,
    /// Local copy's timestamp, which was kept
    pub local_updated_at: DateTime<Utc>,
    /// Incoming copy's timestamp, which was rejected
    pub incoming_updated_at: DateTime<Utc>,
    /// When the conflict was resolved
    pub resolved_at: DateTime<Utc>,
}
