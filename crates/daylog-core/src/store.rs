//! The authoritative local collection of one signed-in user.
//!
//! Mutations apply locally first and return a [`PendingWrite`] at once; the
//! matching remote call is queued to a single writer task per store, so
//! remote calls happen in mutation order. Remote deltas arrive through a
//! listener task and are folded in with last-write-wins.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::merge::{apply_remote_entry, MergeOutcome, MergeSummary};
use crate::models::{Collection, EntryDraft, EntryId, LogEntry, SyncConflict, Visibility};
use crate::remote::{RemotePersistence, Subscription};
use crate::session::Session;
use crate::state::SyncState;
use crate::{Error, Result};

/// Number of discarded inbound updates kept for diagnostics.
pub const CONFLICT_HISTORY: usize = 50;

const NOTICE_CAPACITY: usize = 64;

/// Remote call behind a queued write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Put,
    SoftDelete,
    MakePublic,
    MakePrivate,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Put => "put",
            Self::SoftDelete => "soft delete",
            Self::MakePublic => "make public",
            Self::MakePrivate => "make private",
        })
    }
}

/// Event broadcast to observers of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreNotice {
    /// The collection changed
    Changed,
    /// A queued remote write failed; the local change was kept
    WriteFailed {
        entry_id: EntryId,
        operation: WriteKind,
        message: String,
    },
}

enum WriteOp {
    Put(LogEntry),
    SoftDelete(EntryId),
    MakePublic(LogEntry),
    MakePrivate(LogEntry),
}

impl WriteOp {
    const fn kind(&self) -> WriteKind {
        match self {
            Self::Put(_) => WriteKind::Put,
            Self::SoftDelete(_) => WriteKind::SoftDelete,
            Self::MakePublic(_) => WriteKind::MakePublic,
            Self::MakePrivate(_) => WriteKind::MakePrivate,
        }
    }

    const fn entry_id(&self) -> EntryId {
        match self {
            Self::Put(entry) | Self::MakePublic(entry) | Self::MakePrivate(entry) => entry.id,
            Self::SoftDelete(id) => *id,
        }
    }
}

/// Share token for `MakePublic`, nothing otherwise.
type WriteReply = Result<Option<String>>;

enum WriterMessage {
    Write {
        op: WriteOp,
        reply: oneshot::Sender<WriteReply>,
    },
    Close,
}

/// Handle to a queued remote write.
///
/// The local change has already been applied. Awaiting [`Self::finish`]
/// yields the remote outcome; dropping the handle leaves the write running.
#[must_use = "the write runs regardless; call finish() to observe its outcome"]
pub struct PendingWrite<T> {
    value: T,
    reply: oneshot::Receiver<WriteReply>,
}

impl<T> PendingWrite<T> {
    /// The locally committed value.
    pub const fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Wait for the remote call to complete.
    pub async fn finish(self) -> Result<T> {
        match self.reply.await {
            Ok(Ok(_)) => Ok(self.value),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(Error::RemoteUnavailable(
                "write worker stopped before completing".to_string(),
            )),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PendingWrite<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrite")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

struct StoreState {
    open: bool,
    collection: Collection,
    sync_state: SyncState,
    pending_writes: usize,
    conflicts: VecDeque<SyncConflict>,
}

struct Shared {
    user_id: String,
    state: Mutex<StoreState>,
    notices: broadcast::Sender<StoreNotice>,
}

impl Shared {
    fn notify(&self, notice: StoreNotice) {
        // no receivers is fine
        let _ = self.notices.send(notice);
    }

    fn apply_delta(&self, source_user: &str, delta: Vec<LogEntry>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        if delta.is_empty() {
            return summary;
        }
        if source_user != self.user_id {
            tracing::warn!(
                "Dropping delta for user {source_user} delivered to store of {}",
                self.user_id
            );
            return summary;
        }

        {
            let mut state = self.state.lock();
            if !state.open {
                tracing::debug!("Dropping delta after close");
                return summary;
            }
            let now = Utc::now();
            for remote in delta {
                let local_updated_at = state.collection.get(&remote.id).map(|e| e.last_updated);
                let (id, incoming_updated_at) = (remote.id, remote.last_updated);
                let outcome = apply_remote_entry(&mut state.collection, remote);
                if outcome == MergeOutcome::Discarded {
                    if let Some(local_updated_at) = local_updated_at {
                        if state.conflicts.len() == CONFLICT_HISTORY {
                            state.conflicts.pop_front();
                        }
                        state.conflicts.push_back(SyncConflict {
                            entry_id: id,
                            local_updated_at,
                            incoming_updated_at,
                            resolved_at: now,
                        });
                    }
                }
                summary.record(outcome);
            }
        }

        tracing::debug!(?summary, "Applied remote delta");
        if summary.is_change() {
            self.notify(StoreNotice::Changed);
        }
        summary
    }

    fn finish_write(&self, op: WriteKind, entry_id: EntryId, result: &WriteReply) {
        {
            let mut state = self.state.lock();
            state.pending_writes = state.pending_writes.saturating_sub(1);
            if !state.open {
                return;
            }
            state.sync_state = match result {
                Err(_) => SyncState::Error,
                Ok(_) if state.pending_writes > 0 => SyncState::Syncing,
                Ok(_) => SyncState::Synced,
            };
        }

        if let Err(error) = result {
            tracing::warn!("Remote {op} of entry {entry_id} failed: {error}");
            self.notify(StoreNotice::WriteFailed {
                entry_id,
                operation: op,
                message: error.to_string(),
            });
        }
    }
}

#[derive(Default)]
struct Tasks {
    writer: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

/// Offline-first store for one user's entries.
///
/// Cloning is cheap; clones share the same collection and writer.
pub struct SyncStore<R: RemotePersistence> {
    remote: R,
    shared: Arc<Shared>,
    writer: mpsc::UnboundedSender<WriterMessage>,
    tasks: Arc<Mutex<Tasks>>,
}

impl<R: RemotePersistence> Clone for SyncStore<R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            shared: Arc::clone(&self.shared),
            writer: self.writer.clone(),
            tasks: Arc::clone(&self.tasks),
        }
    }
}

impl<R: RemotePersistence> SyncStore<R> {
    /// Open a store for `session`: start the writer, subscribe to remote
    /// changes, then load the collection.
    ///
    /// Remote failures here do not fail the open. The store starts empty
    /// with [`SyncState::Error`] and keeps accepting local mutations.
    pub async fn open(session: &Session, remote: R) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let shared = Arc::new(Shared {
            user_id: session.user_id().to_string(),
            state: Mutex::new(StoreState {
                open: true,
                collection: Collection::new(),
                sync_state: SyncState::Syncing,
                pending_writes: 0,
                conflicts: VecDeque::new(),
            }),
            notices,
        });

        let (writer, queue) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(run_writer(
            remote.clone(),
            Arc::clone(&shared),
            queue,
        ));

        let listener_task = match remote.subscribe(&shared.user_id).await {
            Ok(subscription) => Some(tokio::spawn(run_listener(
                Arc::clone(&shared),
                subscription,
            ))),
            Err(error) => {
                tracing::warn!("Subscribing to remote changes failed: {error}");
                None
            }
        };

        let store = Self {
            remote,
            shared,
            writer,
            tasks: Arc::new(Mutex::new(Tasks {
                writer: Some(writer_task),
                listener: listener_task,
            })),
        };

        if let Err(error) = store.load_all().await {
            tracing::warn!("Initial load for {} failed: {error}", store.user_id());
        }
        tracing::info!("Opened store for {}", store.user_id());
        store
    }

    pub fn user_id(&self) -> &str {
        &self.shared.user_id
    }

    pub fn is_open(&self) -> bool {
        self.shared.state.lock().open
    }

    /// Replace the collection with the remote's active entries.
    ///
    /// On failure the collection is left as it was.
    pub async fn load_all(&self) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(Error::AuthenticationRequired);
            }
            state.sync_state = SyncState::Syncing;
        }

        let fetched = self.remote.fetch_all(self.user_id()).await;

        let count = {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(Error::AuthenticationRequired);
            }
            match fetched {
                Ok(mut collection) => {
                    collection.retain(|_, entry| !entry.is_deleted);
                    let count = collection.len();
                    state.collection = collection;
                    state.sync_state = if state.pending_writes > 0 {
                        SyncState::Syncing
                    } else {
                        SyncState::Synced
                    };
                    count
                }
                Err(error) => {
                    state.sync_state = SyncState::Error;
                    return Err(match error {
                        Error::RemoteUnavailable(message) => Error::RemoteUnavailable(message),
                        other => Error::RemoteUnavailable(other.to_string()),
                    });
                }
            }
        };

        tracing::info!("Loaded {count} entries for {}", self.user_id());
        self.shared.notify(StoreNotice::Changed);
        Ok(())
    }

    /// Create an entry from `draft`.
    pub fn add(&self, draft: EntryDraft) -> Result<PendingWrite<LogEntry>> {
        let entry = LogEntry::from_draft(draft);
        let reply = {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(Error::AuthenticationRequired);
            }
            state.collection.insert(entry.id, entry.clone());
            self.enqueue(&mut state, WriteOp::Put(entry.clone()))
        };
        tracing::debug!("Added entry {}", entry.id);
        self.shared.notify(StoreNotice::Changed);
        Ok(PendingWrite {
            value: entry,
            reply,
        })
    }

    /// Store an edited entry. Its id must already be held locally.
    ///
    /// Visibility stays as held locally; use [`Self::toggle_public`] to
    /// change it.
    pub fn update(&self, entry: LogEntry) -> Result<PendingWrite<LogEntry>> {
        let (entry, reply) = {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(Error::AuthenticationRequired);
            }
            let current = state
                .collection
                .get(&entry.id)
                .ok_or_else(|| Error::NotFound(entry.id.to_string()))?;

            let updated = LogEntry {
                last_updated: next_stamp(current.last_updated),
                is_deleted: false,
                visibility: current.visibility.clone(),
                ..entry
            };
            state.collection.insert(updated.id, updated.clone());
            let reply = self.enqueue(&mut state, WriteOp::Put(updated.clone()));
            (updated, reply)
        };
        tracing::debug!("Updated entry {}", entry.id);
        self.shared.notify(StoreNotice::Changed);
        Ok(PendingWrite {
            value: entry,
            reply,
        })
    }

    /// Remove an entry locally and soft-delete it remotely.
    ///
    /// Returns `None` without any remote call when the id is not held.
    pub fn delete(&self, id: EntryId) -> Result<Option<PendingWrite<LogEntry>>> {
        let (removed, reply) = {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(Error::AuthenticationRequired);
            }
            let Some(removed) = state.collection.remove(&id) else {
                return Ok(None);
            };
            let reply = self.enqueue(&mut state, WriteOp::SoftDelete(id));
            (removed, reply)
        };
        tracing::debug!("Deleted entry {id}");
        self.shared.notify(StoreNotice::Changed);
        Ok(Some(PendingWrite {
            value: removed,
            reply,
        }))
    }

    pub fn toggle_favorite(&self, id: EntryId) -> Result<PendingWrite<LogEntry>> {
        let mut entry = self.get(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        entry.is_favorite = !entry.is_favorite;
        self.update(entry)
    }

    /// Flip an entry between public and private.
    ///
    /// Unlike the other mutations this waits for the remote round-trip and
    /// only then commits locally, since the share token comes from the
    /// remote. A token is kept when going private and reused when going
    /// public again.
    pub async fn toggle_public(&self, id: EntryId) -> Result<LogEntry> {
        let (requested, going_public, reply) = {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(Error::AuthenticationRequired);
            }
            let current = state
                .collection
                .get(&id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;

            let going_public = !current.is_public();
            let mut requested = current.clone().touched(next_stamp(current.last_updated));
            let op = if going_public {
                WriteOp::MakePublic(requested.clone())
            } else {
                requested.visibility = requested.visibility.to_private();
                WriteOp::MakePrivate(requested.clone())
            };
            let reply = self.enqueue(&mut state, op);
            (requested, going_public, reply)
        };

        let token = match reply.await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::RemoteUnavailable(
                    "write worker stopped before completing".to_string(),
                ))
            }
        };

        let mut committed = requested;
        if going_public {
            let public_id = token.ok_or_else(|| {
                Error::RemoteUnavailable(format!("no share token returned for {id}"))
            })?;
            committed.visibility = Visibility::Public { public_id };
        }

        {
            let mut state = self.shared.state.lock();
            if !state.open {
                return Err(Error::AuthenticationRequired);
            }
            let current = state
                .collection
                .get_mut(&id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            if current.last_updated > committed.last_updated {
                // Edited meanwhile: keep the edit, take the new visibility
                tracing::debug!("Entry {id} changed during visibility toggle");
                current.visibility = committed.visibility;
                committed = current.clone();
            } else {
                *current = committed.clone();
            }
        }

        tracing::debug!("Entry {id} is now {}", if going_public { "public" } else { "private" });
        self.shared.notify(StoreNotice::Changed);
        Ok(committed)
    }

    /// Fold a batch of remote changes into the collection, in order.
    pub fn apply_remote_delta(&self, delta: Vec<LogEntry>) -> MergeSummary {
        self.shared.apply_delta(&self.shared.user_id, delta)
    }

    /// Copy of the current collection.
    pub fn snapshot(&self) -> Collection {
        self.shared.state.lock().collection.clone()
    }

    pub fn get(&self, id: EntryId) -> Option<LogEntry> {
        self.shared.state.lock().collection.get(&id).cloned()
    }

    pub fn sync_state(&self) -> SyncState {
        self.shared.state.lock().sync_state
    }

    /// Most recent discarded inbound updates, oldest first.
    pub fn recent_conflicts(&self) -> Vec<SyncConflict> {
        self.shared.state.lock().conflicts.iter().cloned().collect()
    }

    pub fn notices(&self) -> broadcast::Receiver<StoreNotice> {
        self.shared.notices.subscribe()
    }

    /// Tear down the session: stop listening, drain queued writes and
    /// refuse further mutations.
    pub async fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            if !state.open {
                return;
            }
            state.open = false;
            state.collection.clear();
            state.sync_state = SyncState::Offline;
            // Close goes behind every write already queued
            self.writer.send(WriterMessage::Close).ok();
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        if let Some(listener) = tasks.listener {
            listener.abort();
            // Joining drops the subscription, which unsubscribes
            listener.await.ok();
        }
        if let Some(writer) = tasks.writer {
            writer.await.ok();
        }
        tracing::info!("Closed store for {}", self.user_id());
        self.shared.notify(StoreNotice::Changed);
    }

    fn enqueue(&self, state: &mut StoreState, op: WriteOp) -> oneshot::Receiver<WriteReply> {
        let (reply, receiver) = oneshot::channel();
        state.pending_writes += 1;
        state.sync_state = SyncState::Syncing;
        if self.writer.send(WriterMessage::Write { op, reply }).is_err() {
            // receiver resolves to "worker stopped"
            state.pending_writes -= 1;
            state.sync_state = SyncState::Error;
        }
        receiver
    }
}

/// Stamp for a local mutation: now, but always after `previous`.
fn next_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

async fn run_writer<R: RemotePersistence>(
    remote: R,
    shared: Arc<Shared>,
    mut queue: mpsc::UnboundedReceiver<WriterMessage>,
) {
    let user_id = shared.user_id.clone();
    while let Some(message) = queue.recv().await {
        let WriterMessage::Write { op, reply } = message else {
            break;
        };
        let kind = op.kind();
        let entry_id = op.entry_id();
        let result = match op {
            WriteOp::Put(entry) => remote.put(&user_id, &entry).await.map(|()| None),
            WriteOp::SoftDelete(id) => remote.soft_delete(&user_id, id).await.map(|()| None),
            WriteOp::MakePublic(entry) => remote.make_public(&user_id, &entry).await.map(Some),
            WriteOp::MakePrivate(entry) => {
                remote.make_private(&user_id, &entry).await.map(|()| None)
            }
        };
        shared.finish_write(kind, entry_id, &result);
        // caller may have dropped its handle
        let _ = reply.send(result);
    }
    tracing::debug!("Write worker for {user_id} stopped");
}

async fn run_listener(shared: Arc<Shared>, mut subscription: Subscription) {
    let user_id = shared.user_id.clone();
    while let Some(delta) = subscription.next().await {
        shared.apply_delta(&user_id, delta);
    }
    tracing::debug!("Remote change feed for {user_id} ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;
    use crate::remote::{MemoryRemote, RemoteCall};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::time::Duration as StdDuration;

    async fn open_store(remote: &MemoryRemote, user: &str) -> SyncStore<MemoryRemote> {
        let session = Session::new(user).unwrap();
        SyncStore::open(&session, remote.clone()).await
    }

    async fn next_notice(notices: &mut broadcast::Receiver<StoreNotice>) -> StoreNotice {
        tokio::time::timeout(StdDuration::from_secs(5), notices.recv())
            .await
            .expect("timed out waiting for a notice")
            .unwrap()
    }

    fn dated(title: &str, day: u32) -> EntryDraft {
        EntryDraft::new(title).occurred_at(Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn add_is_local_first_and_written_through() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        remote.clear_calls();

        let pending = store.add(dated("Morning run", 4).mood(Mood::Happy)).unwrap();
        let id = pending.value().id;
        assert!(store.get(id).is_some());
        assert_eq!(pending.value().last_updated, pending.value().occurred_at);

        let entry = pending.finish().await.unwrap();
        assert_eq!(remote.stored("u1", id), Some(entry));
        assert_eq!(
            remote.calls(),
            vec![RemoteCall::Put {
                user_id: "u1".to_string(),
                id
            }]
        );
        assert_eq!(store.sync_state(), SyncState::Synced);
    }

    #[tokio::test]
    async fn failed_write_keeps_local_change_and_reports() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let mut notices = store.notices();
        remote.set_offline(true);

        let pending = store.add(dated("Offline note", 5)).unwrap();
        let id = pending.value().id;
        let result = pending.finish().await;

        assert!(matches!(result, Err(Error::RemoteUnavailable(_))));
        assert!(store.get(id).is_some());
        assert_eq!(store.sync_state(), SyncState::Error);

        assert_eq!(next_notice(&mut notices).await, StoreNotice::Changed);
        match next_notice(&mut notices).await {
            StoreNotice::WriteFailed {
                entry_id,
                operation,
                ..
            } => {
                assert_eq!(entry_id, id);
                assert_eq!(operation, WriteKind::Put);
            }
            other => panic!("unexpected notice {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_with_unreachable_remote_starts_empty() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        let store = open_store(&remote, "u1").await;

        assert!(store.is_open());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.sync_state(), SyncState::Error);

        // still usable locally
        let pending = store.add(dated("Local only", 6)).unwrap();
        assert_eq!(store.snapshot().len(), 1);
        drop(pending);
    }

    #[tokio::test]
    async fn failed_reload_keeps_collection() {
        let remote = MemoryRemote::new();
        let kept = LogEntry::from_draft(dated("Kept", 1));
        remote.put("u1", &kept).await.unwrap();

        let store = open_store(&remote, "u1").await;
        assert_eq!(store.snapshot().len(), 1);

        remote.set_offline(true);
        assert!(matches!(
            store.load_all().await,
            Err(Error::RemoteUnavailable(_))
        ));
        assert_eq!(store.get(kept.id), Some(kept));
        assert_eq!(store.sync_state(), SyncState::Error);
    }

    #[tokio::test]
    async fn update_stamps_and_requires_known_id() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let entry = store.add(dated("Draft", 2)).unwrap().finish().await.unwrap();

        let mut edited = entry.clone();
        edited.content.title = "Final".to_string();
        let updated = store.update(edited).unwrap().finish().await.unwrap();
        assert_eq!(updated.title(), "Final");
        assert!(updated.last_updated > entry.last_updated);
        assert_eq!(remote.stored("u1", entry.id), Some(updated));

        let stranger = LogEntry::from_draft(dated("Stranger", 3));
        assert!(matches!(store.update(stranger), Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn future_dated_entries_still_get_newer_stamps() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let future = Utc::now() + Duration::days(30);
        let entry = store
            .add(EntryDraft::new("Planned").occurred_at(future))
            .unwrap()
            .into_value();

        let toggled = store.toggle_favorite(entry.id).unwrap().into_value();
        assert!(toggled.is_favorite);
        assert!(toggled.last_updated > entry.last_updated);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_makes_no_remote_call() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        remote.clear_calls();

        assert!(store.delete(EntryId::new()).unwrap().is_none());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn writes_reach_the_remote_in_mutation_order() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        remote.clear_calls();

        let added = store.add(dated("Short lived", 7)).unwrap();
        let id = added.value().id;
        let deleted = store.delete(id).unwrap().unwrap();
        deleted.finish().await.unwrap();

        assert!(store.get(id).is_none());
        assert!(remote.stored("u1", id).is_none());
        assert_eq!(remote.trash("u1").len(), 1);
        let user_id = "u1".to_string();
        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::Put {
                    user_id: user_id.clone(),
                    id
                },
                RemoteCall::SoftDelete { user_id, id },
            ]
        );
    }

    #[tokio::test]
    async fn share_token_is_kept_across_visibility_cycles() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let entry = store.add(dated("Sunset", 8)).unwrap().finish().await.unwrap();

        let public = store.toggle_public(entry.id).await.unwrap();
        let token = public.public_id().unwrap().to_string();
        assert!(public.is_public());
        assert!(public.last_updated > entry.last_updated);

        let private = store.toggle_public(entry.id).await.unwrap();
        assert!(!private.is_public());
        assert_eq!(private.public_id(), Some(token.as_str()));

        let again = store.toggle_public(entry.id).await.unwrap();
        assert_eq!(again.public_id(), Some(token.as_str()));
        assert_eq!(remote.share_records().len(), 1);
    }

    #[tokio::test]
    async fn edit_during_toggle_keeps_the_issued_token() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let entry = store.add(dated("Harbour", 8)).unwrap().finish().await.unwrap();

        let mut edited = entry.clone();
        edited.content.title = "Harbour at dusk".to_string();
        let (toggled, _) = tokio::join!(store.toggle_public(entry.id), async {
            store.update(edited).unwrap().finish().await
        });

        let toggled = toggled.unwrap();
        let token = toggled.public_id().unwrap().to_string();
        assert!(toggled.is_public());
        assert_eq!(toggled.title(), "Harbour at dusk");
        assert_eq!(store.get(entry.id), Some(toggled.clone()));

        let stored = remote.stored("u1", entry.id).unwrap();
        assert!(stored.is_public());
        assert_eq!(stored.public_id(), Some(token.as_str()));
        assert_eq!(stored.title(), "Harbour at dusk");

        let private = store.toggle_public(entry.id).await.unwrap();
        assert_eq!(private.public_id(), Some(token.as_str()));
        let again = store.toggle_public(entry.id).await.unwrap();
        assert_eq!(again.public_id(), Some(token.as_str()));
        assert_eq!(remote.share_records().len(), 1);
    }

    #[tokio::test]
    async fn toggle_public_commits_only_after_remote_success() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let entry = store.add(dated("Private", 9)).unwrap().finish().await.unwrap();

        remote.set_offline(true);
        assert!(store.toggle_public(entry.id).await.is_err());
        assert!(!store.get(entry.id).unwrap().is_public());
        assert!(remote.share_records().is_empty());
    }

    #[tokio::test]
    async fn closed_store_rejects_mutations_without_remote_calls() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let entry = store.add(dated("Before close", 10)).unwrap().into_value();
        store.close().await;
        remote.clear_calls();

        assert!(!store.is_open());
        assert_eq!(store.sync_state(), SyncState::Offline);
        assert_eq!(remote.subscriber_count("u1"), 0);
        // queued write drained before close finished
        assert!(remote.stored("u1", entry.id).is_some());

        assert!(matches!(
            store.add(dated("After close", 11)),
            Err(Error::AuthenticationRequired)
        ));
        assert!(matches!(
            store.delete(entry.id),
            Err(Error::AuthenticationRequired)
        ));
        assert!(matches!(
            store.toggle_public(entry.id).await,
            Err(Error::AuthenticationRequired)
        ));
        assert!(remote.calls().is_empty());

        // late deltas are ignored
        let summary = store.apply_remote_delta(vec![LogEntry::from_draft(dated("Late", 12))]);
        assert_eq!(summary, MergeSummary::default());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn remote_changes_from_other_devices_are_applied() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let mut notices = store.notices();

        let elsewhere = LogEntry::from_draft(dated("From tablet", 13));
        remote.write_from_other_device("u1", &elsewhere);

        assert_eq!(next_notice(&mut notices).await, StoreNotice::Changed);
        assert_eq!(store.get(elsewhere.id), Some(elsewhere.clone()));

        let mut tombstone = elsewhere.clone();
        tombstone.is_deleted = true;
        remote.write_from_other_device("u1", &tombstone);
        assert_eq!(next_notice(&mut notices).await, StoreNotice::Changed);
        assert!(store.get(elsewhere.id).is_none());
    }

    #[tokio::test]
    async fn stores_only_see_their_own_user() {
        let remote = MemoryRemote::new();
        let alice = open_store(&remote, "alice").await;
        let bob = open_store(&remote, "bob").await;

        let entry = alice.add(dated("Alice only", 14)).unwrap().finish().await.unwrap();
        bob.load_all().await.unwrap();

        assert!(bob.get(entry.id).is_none());
        assert!(bob.snapshot().is_empty());
        assert_eq!(alice.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn stale_remote_copies_are_recorded_as_conflicts() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let entry = store.add(dated("Current", 15)).unwrap().into_value();

        let mut stale = entry.clone();
        stale.content.title = "Stale".to_string();
        stale.last_updated = entry.last_updated - Duration::hours(1);

        let summary = store.apply_remote_delta(vec![stale.clone()]);
        assert_eq!(summary.discarded, 1);
        assert_eq!(store.get(entry.id).unwrap().title(), "Current");

        let conflicts = store.recent_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].entry_id, entry.id);
        assert_eq!(conflicts[0].incoming_updated_at, stale.last_updated);
        assert_eq!(conflicts[0].local_updated_at, entry.last_updated);
    }

    #[tokio::test]
    async fn conflict_history_is_bounded() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let entry = store.add(dated("Current", 16)).unwrap().into_value();

        let stale: Vec<LogEntry> = (1..=CONFLICT_HISTORY as i64 + 5)
            .map(|minutes| {
                let mut copy = entry.clone();
                copy.last_updated = entry.last_updated - Duration::minutes(minutes);
                copy
            })
            .collect();
        store.apply_remote_delta(stale);

        let conflicts = store.recent_conflicts();
        assert_eq!(conflicts.len(), CONFLICT_HISTORY);
        assert_eq!(
            conflicts.last().unwrap().incoming_updated_at,
            entry.last_updated - Duration::minutes(CONFLICT_HISTORY as i64 + 5)
        );
    }

    #[tokio::test]
    async fn empty_delta_changes_nothing() {
        let remote = MemoryRemote::new();
        let store = open_store(&remote, "u1").await;
        let before = store.snapshot();
        assert_eq!(store.apply_remote_delta(Vec::new()), MergeSummary::default());
        assert_eq!(store.snapshot(), before);
    }
}
