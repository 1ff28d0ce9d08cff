//! Last-write-wins reconciliation of remote changes into a local collection.
//!
//! Resolution is per whole entry: when two devices edit different fields of
//! the same entry concurrently, the older edit is dropped entirely.

use crate::models::{Collection, LogEntry};

/// What applying one remote entry did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Unknown id, now present
    Inserted,
    /// Remote copy was strictly newer and replaced the local one
    Replaced,
    /// Tombstone removed a local entry
    Removed,
    /// Tombstone for an id that is not held locally
    Ignored,
    /// Same timestamp as the local copy; local kept
    Unchanged,
    /// Remote copy was older than the local one and was dropped
    Discarded,
}

impl MergeOutcome {
    /// Whether the collection changed.
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced | Self::Removed)
    }
}

/// Per-outcome counts for one applied delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub removed: usize,
    pub ignored: usize,
    pub unchanged: usize,
    pub discarded: usize,
}

impl MergeSummary {
    pub fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Replaced => self.replaced += 1,
            MergeOutcome::Removed => self.removed += 1,
            MergeOutcome::Ignored => self.ignored += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
            MergeOutcome::Discarded => self.discarded += 1,
        }
    }

    /// Whether any entry was inserted, replaced or removed.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        self.inserted + self.replaced + self.removed > 0
    }
}

/// Apply one remote entry to `collection` in place.
pub fn apply_remote_entry(collection: &mut Collection, remote: LogEntry) -> MergeOutcome {
    if remote.is_deleted {
        return if collection.remove(&remote.id).is_some() {
            MergeOutcome::Removed
        } else {
            MergeOutcome::Ignored
        };
    }

    let Some(local) = collection.get(&remote.id) else {
        collection.insert(remote.id, remote);
        return MergeOutcome::Inserted;
    };

    if remote.last_updated > local.last_updated {
        collection.insert(remote.id, remote);
        MergeOutcome::Replaced
    } else if remote.last_updated == local.last_updated {
        MergeOutcome::Unchanged
    } else {
        MergeOutcome::Discarded
    }
}

/// Fold a remote delta into a copy of `local`, entry by entry in order.
///
/// Later entries in the delta see the effect of earlier ones.
#[must_use]
pub fn merge(local: &Collection, delta: &[LogEntry]) -> Collection {
    let mut merged = local.clone();
    for remote in delta {
        apply_remote_entry(&mut merged, remote.clone());
    }
    merged
}
