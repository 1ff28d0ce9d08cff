//! Remote persistence backed by a libSQL database.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{Database, EntryRepository, LibSqlEntryRepository};
use crate::codec::{comment_to_local, comment_to_wire, to_local, to_wire, WireEntry, WireTimestamp};
use crate::models::{Collection, Comment, EntryId, LogEntry, ShareRecord};
use crate::remote::{
    keep_visibility, new_share_token, RemotePersistence, SubscriberRegistry, Subscription,
};
use crate::{Error, Result};

/// [`RemotePersistence`] over a single libSQL database file.
///
/// Subscribers are notified in-process, so every writer sharing the
/// database must go through the same `LibSqlRemote` (or a clone of it).
#[derive(Clone)]
pub struct LibSqlRemote {
    db: Arc<Mutex<Database>>,
    subscribers: SubscriberRegistry,
}

impl LibSqlRemote {
    /// Open (or create) the database at `path`.
    pub async fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path).await?;
        Ok(Self::from_database(db))
    }

    /// Open an in-memory database (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            subscribers: SubscriberRegistry::default(),
        }
    }

    /// Trashed entries of a user, most recently deleted first.
    pub async fn trash(&self, user_id: &str) -> Result<Vec<LogEntry>> {
        let db = self.db.lock().await;
        let repo = LibSqlEntryRepository::new(db.connection());
        Ok(repo
            .list_trash(user_id)
            .await?
            .into_iter()
            .map(to_local)
            .collect())
    }

    async fn store_with_visibility(
        &self,
        user_id: &str,
        entry: &LogEntry,
        public: bool,
    ) -> Result<WireEntry> {
        let db = self.db.lock().await;
        let conn = db.connection();
        let repo = LibSqlEntryRepository::new(conn);

        let stored = repo
            .get_entry(user_id, &entry.id)
            .await?
            .ok_or_else(|| Error::NotFound(entry.id.to_string()))?;

        let mut wire = to_wire(entry);
        wire.is_public = public;
        wire.public_id = entry
            .public_id()
            .map(ToString::to_string)
            .or(stored.public_id);

        // The share record and the entry carrying its token land together
        let mut issued = false;
        conn.execute("BEGIN TRANSACTION", ()).await?;
        let written = async {
            if public && wire.public_id.is_none() {
                let share = ShareRecord {
                    token: new_share_token(),
                    owner_id: user_id.to_string(),
                    entry_id: entry.id,
                };
                repo.insert_share(&share).await?;
                wire.public_id = Some(share.token);
                issued = true;
            }
            repo.upsert_entry(user_id, &wire).await
        }
        .await;

        if let Err(e) = written {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e);
        }
        conn.execute("COMMIT", ()).await?;
        if issued {
            tracing::debug!("Issued share token for entry {}", entry.id);
        }
        Ok(wire)
    }
}

impl RemotePersistence for LibSqlRemote {
    async fn fetch_all(&self, user_id: &str) -> Result<Collection> {
        let db = self.db.lock().await;
        let repo = LibSqlEntryRepository::new(db.connection());
        Ok(repo
            .list_entries(user_id)
            .await?
            .into_iter()
            .map(to_local)
            .map(|entry| (entry.id, entry))
            .collect())
    }

    async fn put(&self, user_id: &str, entry: &LogEntry) -> Result<()> {
        let mut wire = to_wire(entry);
        {
            let db = self.db.lock().await;
            let repo = LibSqlEntryRepository::new(db.connection());
            if let Some(stored) = repo.get_entry(user_id, &entry.id).await? {
                keep_visibility(&mut wire, &stored);
            }
            repo.upsert_entry(user_id, &wire).await?;
        }
        self.subscribers.publish(user_id, &[to_local(wire)]);
        Ok(())
    }

    async fn soft_delete(&self, user_id: &str, id: EntryId) -> Result<()> {
        let tombstone = {
            let db = self.db.lock().await;
            let repo = LibSqlEntryRepository::new(db.connection());
            let Some(mut wire) = repo.get_entry(user_id, &id).await? else {
                return Ok(());
            };
            wire.is_deleted = true;
            wire.last_updated = WireTimestamp::now();
            if !repo.move_to_trash(user_id, &wire).await? {
                return Ok(());
            }
            wire
        };
        self.subscribers.publish(user_id, &[to_local(tombstone)]);
        Ok(())
    }

    async fn subscribe(&self, user_id: &str) -> Result<Subscription> {
        Ok(self.subscribers.subscribe(user_id))
    }

    async fn make_public(&self, user_id: &str, entry: &LogEntry) -> Result<String> {
        let wire = self.store_with_visibility(user_id, entry, true).await?;
        let token = wire
            .public_id
            .clone()
            .ok_or_else(|| Error::Database(format!("No share token stored for {}", entry.id)))?;
        self.subscribers.publish(user_id, &[to_local(wire)]);
        Ok(token)
    }

    async fn make_private(&self, user_id: &str, entry: &LogEntry) -> Result<()> {
        let wire = self.store_with_visibility(user_id, entry, false).await?;
        self.subscribers.publish(user_id, &[to_local(wire)]);
        Ok(())
    }

    async fn resolve_share_token(&self, token: &str) -> Result<ShareRecord> {
        let db = self.db.lock().await;
        LibSqlEntryRepository::new(db.connection())
            .get_share(token)
            .await?
            .ok_or_else(|| Error::NotFound(format!("share token {token}")))
    }

    async fn fetch_entry(&self, owner_id: &str, id: EntryId) -> Result<LogEntry> {
        let db = self.db.lock().await;
        LibSqlEntryRepository::new(db.connection())
            .get_entry(owner_id, &id)
            .await?
            .map(to_local)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn fetch_comments(&self, owner_id: &str, id: EntryId) -> Result<Vec<Comment>> {
        let db = self.db.lock().await;
        Ok(LibSqlEntryRepository::new(db.connection())
            .list_comments(owner_id, &id)
            .await?
            .into_iter()
            .map(comment_to_local)
            .collect())
    }

    async fn post_comment(&self, owner_id: &str, id: EntryId, comment: &Comment) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlEntryRepository::new(db.connection())
            .insert_comment(owner_id, &id, &comment_to_wire(comment))
            .await
    }
}
