//! Remote persistence contract and its implementations.
//!
//! The sync store talks to durable storage only through
//! [`RemotePersistence`]. Two implementations ship with the crate: an
//! in-process [`MemoryRemote`] and the libSQL-backed
//! [`crate::db::LibSqlRemote`].

use std::future::Future;

use crate::codec::WireEntry;
use crate::models::{Collection, Comment, EntryId, LogEntry, ShareRecord};
use crate::Result;

mod memory;
mod subscription;

pub use memory::{MemoryRemote, RemoteCall};
pub use subscription::{Delta, SubscriberRegistry, Subscription};

/// Durable storage for a user's entries, trash, share records and comments.
pub trait RemotePersistence: Clone + Send + Sync + 'static {
    /// Snapshot of the user's active entries.
    fn fetch_all(&self, user_id: &str) -> impl Future<Output = Result<Collection>> + Send;

    /// Upsert by id.
    ///
    /// An existing document keeps its stored visibility and share token;
    /// only [`Self::make_public`] and [`Self::make_private`] change those.
    fn put(&self, user_id: &str, entry: &LogEntry) -> impl Future<Output = Result<()>> + Send;

    /// Mark deleted, stamp the deletion time, move to trash. Unknown ids are
    /// a no-op.
    fn soft_delete(&self, user_id: &str, id: EntryId)
        -> impl Future<Output = Result<()>> + Send;

    /// Feed of changed documents for `user_id`.
    fn subscribe(&self, user_id: &str) -> impl Future<Output = Result<Subscription>> + Send;

    /// Store `entry` as public and return its share token.
    ///
    /// A token already carried by the entry, or by the stored copy, is
    /// reused; a new share record is only created when neither has one.
    fn make_public(
        &self,
        user_id: &str,
        entry: &LogEntry,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Store `entry` as private, keeping its token.
    fn make_private(
        &self,
        user_id: &str,
        entry: &LogEntry,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Look up the owner and entry behind a share token.
    fn resolve_share_token(&self, token: &str)
        -> impl Future<Output = Result<ShareRecord>> + Send;

    /// Read one active entry of `owner_id`.
    fn fetch_entry(
        &self,
        owner_id: &str,
        id: EntryId,
    ) -> impl Future<Output = Result<LogEntry>> + Send;

    /// Comments on an entry, oldest first.
    fn fetch_comments(
        &self,
        owner_id: &str,
        id: EntryId,
    ) -> impl Future<Output = Result<Vec<Comment>>> + Send;

    /// Append a comment to an entry.
    fn post_comment(
        &self,
        owner_id: &str,
        id: EntryId,
        comment: &Comment,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Fresh opaque share token.
pub(crate) fn new_share_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Carry the stored visibility over onto an incoming document.
pub(crate) fn keep_visibility(incoming: &mut WireEntry, stored: &WireEntry) {
    incoming.is_public = stored.is_public;
    incoming.public_id.clone_from(&stored.public_id);
}
