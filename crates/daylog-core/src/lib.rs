//! daylog-core - Core library for daylog
//!
//! Offline-first journal entries for one signed-in user: the entry model and
//! its stored document form, display grouping, last-write-wins merging, the
//! sync store with its ordered write-through, remote persistence backends,
//! public sharing with comments, and the collaborator service clients.

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod group;
pub mod merge;
pub mod models;
pub mod remote;
pub mod services;
pub mod session;
pub mod sharing;
pub mod state;
pub mod store;
pub mod util;

pub use error::{Error, Result};
pub use group::{group_entries, Group, GroupStrategy};
pub use merge::{merge, MergeOutcome, MergeSummary};
pub use models::{Collection, EntryDraft, EntryId, LogEntry};
pub use remote::{MemoryRemote, RemotePersistence};
pub use session::{Session, SessionManager};
pub use sharing::{SharedEntries, SharedEntry};
pub use state::SyncState;
pub use store::{PendingWrite, StoreNotice, SyncStore, WriteKind};
