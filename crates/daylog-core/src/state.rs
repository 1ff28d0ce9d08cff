//! Sync status reported by a store.

use std::fmt;

/// Where the store stands relative to remote persistence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No session, or the store was closed
    #[default]
    Offline,
    /// A load or write is in flight
    Syncing,
    Synced,
    /// The last load or write failed
    Error,
}

impl SyncState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
