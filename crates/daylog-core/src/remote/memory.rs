//! In-process remote persistence.
//!
//! Keeps stored documents in their wire form so that everything written
//! passes through the codec, exactly like a networked backend would.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    keep_visibility, new_share_token, RemotePersistence, SubscriberRegistry, Subscription,
};
use crate::codec::{comment_to_local, comment_to_wire, to_local, to_wire, WireComment, WireEntry,
    WireTimestamp};
use crate::models::{sort_comments, Collection, Comment, EntryId, LogEntry, ShareRecord};
use crate::{Error, Result};

/// One call received by a [`MemoryRemote`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    FetchAll { user_id: String },
    Put { user_id: String, id: EntryId },
    SoftDelete { user_id: String, id: EntryId },
    Subscribe { user_id: String },
    MakePublic { user_id: String, id: EntryId },
    MakePrivate { user_id: String, id: EntryId },
}

#[derive(Default)]
struct UserDocuments {
    entries: BTreeMap<EntryId, WireEntry>,
    trash: BTreeMap<EntryId, WireEntry>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, UserDocuments>,
    shares: HashMap<String, ShareRecord>,
    comments: HashMap<(String, EntryId), Vec<WireComment>>,
    calls: Vec<RemoteCall>,
}

/// Remote persistence held in memory, shared between clones.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
    subscribers: SubscriberRegistry,
    offline: Arc<AtomicBool>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`Error::RemoteUnavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Stored active entry, bypassing call recording.
    pub fn stored(&self, user_id: &str, id: EntryId) -> Option<LogEntry> {
        let state = self.state.lock();
        state
            .users
            .get(user_id)
            .and_then(|docs| docs.entries.get(&id))
            .cloned()
            .map(to_local)
    }

    /// Trashed entries of a user.
    pub fn trash(&self, user_id: &str) -> Vec<LogEntry> {
        let state = self.state.lock();
        state
            .users
            .get(user_id)
            .map(|docs| docs.trash.values().cloned().map(to_local).collect())
            .unwrap_or_default()
    }

    /// All share records issued so far.
    pub fn share_records(&self) -> Vec<ShareRecord> {
        self.state.lock().shares.values().cloned().collect()
    }

    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.subscribers.subscriber_count(user_id)
    }

    /// Write a document as another device would, notifying subscribers.
    pub fn write_from_other_device(&self, user_id: &str, entry: &LogEntry) {
        let wire = to_wire(entry);
        {
            let mut state = self.state.lock();
            let docs = state.users.entry(user_id.to_string()).or_default();
            if entry.is_deleted {
                docs.entries.remove(&entry.id);
                docs.trash.insert(entry.id, wire.clone());
            } else {
                docs.entries.insert(entry.id, wire.clone());
            }
        }
        self.subscribers.publish(user_id, &[to_local(wire)]);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::RemoteUnavailable("remote is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn record(&self, call: RemoteCall) {
        self.state.lock().calls.push(call);
    }

    fn store_with_visibility(
        &self,
        user_id: &str,
        entry: &LogEntry,
        public: bool,
    ) -> Result<(WireEntry, Option<String>)> {
        let mut state = self.state.lock();
        let stored_token = state
            .users
            .get(user_id)
            .and_then(|docs| docs.entries.get(&entry.id))
            .ok_or_else(|| Error::NotFound(entry.id.to_string()))?
            .public_id
            .clone();

        let mut token = entry.public_id().map(ToString::to_string).or(stored_token);
        let mut issued = None;
        if public && token.is_none() {
            let new_token = new_share_token();
            state.shares.insert(
                new_token.clone(),
                ShareRecord {
                    token: new_token.clone(),
                    owner_id: user_id.to_string(),
                    entry_id: entry.id,
                },
            );
            issued = Some(new_token.clone());
            token = Some(new_token);
        }

        let mut wire = to_wire(entry);
        wire.is_public = public;
        wire.public_id = token;
        if let Some(docs) = state.users.get_mut(user_id) {
            docs.entries.insert(entry.id, wire.clone());
        }
        Ok((wire, issued))
    }
}

impl RemotePersistence for MemoryRemote {
    async fn fetch_all(&self, user_id: &str) -> Result<Collection> {
        self.record(RemoteCall::FetchAll {
            user_id: user_id.to_string(),
        });
        self.check_online()?;
        let state = self.state.lock();
        Ok(state
            .users
            .get(user_id)
            .map(|docs| {
                docs.entries
                    .values()
                    .cloned()
                    .map(to_local)
                    .map(|entry| (entry.id, entry))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put(&self, user_id: &str, entry: &LogEntry) -> Result<()> {
        self.record(RemoteCall::Put {
            user_id: user_id.to_string(),
            id: entry.id,
        });
        self.check_online()?;
        let mut wire = to_wire(entry);
        {
            let mut state = self.state.lock();
            let entries = &mut state.users.entry(user_id.to_string()).or_default().entries;
            if let Some(stored) = entries.get(&entry.id) {
                keep_visibility(&mut wire, stored);
            }
            entries.insert(entry.id, wire.clone());
        }
        self.subscribers.publish(user_id, &[to_local(wire)]);
        Ok(())
    }

    async fn soft_delete(&self, user_id: &str, id: EntryId) -> Result<()> {
        self.record(RemoteCall::SoftDelete {
            user_id: user_id.to_string(),
            id,
        });
        self.check_online()?;
        let tombstone = {
            let mut state = self.state.lock();
            let Some(docs) = state.users.get_mut(user_id) else {
                return Ok(());
            };
            let Some(mut wire) = docs.entries.remove(&id) else {
                return Ok(());
            };
            wire.is_deleted = true;
            wire.last_updated = WireTimestamp::now();
            docs.trash.insert(id, wire.clone());
            wire
        };
        self.subscribers.publish(user_id, &[to_local(tombstone)]);
        Ok(())
    }

    async fn subscribe(&self, user_id: &str) -> Result<Subscription> {
        self.record(RemoteCall::Subscribe {
            user_id: user_id.to_string(),
        });
        self.check_online()?;
        Ok(self.subscribers.subscribe(user_id))
    }

    async fn make_public(&self, user_id: &str, entry: &LogEntry) -> Result<String> {
        self.record(RemoteCall::MakePublic {
            user_id: user_id.to_string(),
            id: entry.id,
        });
        self.check_online()?;
        let (wire, issued) = self.store_with_visibility(user_id, entry, true)?;
        if issued.is_some() {
            tracing::debug!("Issued share token for entry {}", entry.id);
        }
        let token = wire.public_id.clone().unwrap_or_default();
        self.subscribers.publish(user_id, &[to_local(wire)]);
        Ok(token)
    }

    async fn make_private(&self, user_id: &str, entry: &LogEntry) -> Result<()> {
        self.record(RemoteCall::MakePrivate {
            user_id: user_id.to_string(),
            id: entry.id,
        });
        self.check_online()?;
        let (wire, _) = self.store_with_visibility(user_id, entry, false)?;
        self.subscribers.publish(user_id, &[to_local(wire)]);
        Ok(())
    }

    async fn resolve_share_token(&self, token: &str) -> Result<ShareRecord> {
        self.check_online()?;
        self.state
            .lock()
            .shares
            .get(token)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("share token {token}")))
    }

    async fn fetch_entry(&self, owner_id: &str, id: EntryId) -> Result<LogEntry> {
        self.check_online()?;
        self.stored(owner_id, id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn fetch_comments(&self, owner_id: &str, id: EntryId) -> Result<Vec<Comment>> {
        self.check_online()?;
        let mut comments: Vec<Comment> = self
            .state
            .lock()
            .comments
            .get(&(owner_id.to_string(), id))
            .map(|comments| comments.iter().cloned().map(comment_to_local).collect())
            .unwrap_or_default();
        sort_comments(&mut comments);
        Ok(comments)
    }

    async fn post_comment(&self, owner_id: &str, id: EntryId, comment: &Comment) -> Result<()> {
        self.check_online()?;
        self.state
            .lock()
            .comments
            .entry((owner_id.to_string(), id))
            .or_default()
            .push(comment_to_wire(comment));
        Ok(())
    }
}
