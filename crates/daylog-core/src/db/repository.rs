//! Entry repository implementation

use crate::codec::{WireComment, WireEntry};
use crate::error::{Error, Result};
use crate::models::{EntryId, ShareRecord};
use libsql::{params, Connection};

/// Trait for stored-document operations (async)
#[allow(async_fn_in_trait)]
pub trait EntryRepository {
    /// Active documents of a user
    async fn list_entries(&self, user_id: &str) -> Result<Vec<WireEntry>>;

    /// One active document
    async fn get_entry(&self, user_id: &str, id: &EntryId) -> Result<Option<WireEntry>>;

    /// Insert or replace a document by id
    async fn upsert_entry(&self, user_id: &str, entry: &WireEntry) -> Result<()>;

    /// Move a document out of `entries` into `trash`. Returns false when the
    /// id is not stored.
    async fn move_to_trash(&self, user_id: &str, tombstone: &WireEntry) -> Result<bool>;

    /// Trashed documents of a user
    async fn list_trash(&self, user_id: &str) -> Result<Vec<WireEntry>>;

    async fn insert_share(&self, share: &ShareRecord) -> Result<()>;

    async fn get_share(&self, token: &str) -> Result<Option<ShareRecord>>;

    async fn insert_comment(&self, owner_id: &str, id: &EntryId, comment: &WireComment)
        -> Result<()>;

    /// Comments on an entry, oldest first
    async fn list_comments(&self, owner_id: &str, id: &EntryId) -> Result<Vec<WireComment>>;
}

/// libSQL implementation of `EntryRepository`
pub struct LibSqlEntryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlEntryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn documents<T: serde::de::DeserializeOwned>(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<T>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0)?;
            documents.push(serde_json::from_str(&raw)?);
        }
        Ok(documents)
    }
}

fn timestamp_ms(entry: &WireEntry) -> i64 {
    entry.last_updated.to_datetime().timestamp_millis()
}

impl EntryRepository for LibSqlEntryRepository<'_> {
    async fn list_entries(&self, user_id: &str) -> Result<Vec<WireEntry>> {
        self.documents(
            "SELECT document FROM entries WHERE user_id = ? ORDER BY id",
            [user_id],
        )
        .await
    }

    async fn get_entry(&self, user_id: &str, id: &EntryId) -> Result<Option<WireEntry>> {
        let documents = self
            .documents(
                "SELECT document FROM entries WHERE user_id = ? AND id = ?",
                params![user_id, id.as_str()],
            )
            .await?;
        Ok(documents.into_iter().next())
    }

    async fn upsert_entry(&self, user_id: &str, entry: &WireEntry) -> Result<()> {
        let document = serde_json::to_string(entry)?;
        self.conn
            .execute(
                "INSERT INTO entries (user_id, id, document, last_updated_ms, is_public, public_id)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(user_id, id) DO UPDATE SET
                    document = excluded.document,
                    last_updated_ms = excluded.last_updated_ms,
                    is_public = excluded.is_public,
                    public_id = excluded.public_id",
                params![
                    user_id,
                    entry.id.as_str(),
                    document,
                    timestamp_ms(entry),
                    i32::from(entry.is_public),
                    entry.public_id.clone()
                ],
            )
            .await?;
        Ok(())
    }

    async fn move_to_trash(&self, user_id: &str, tombstone: &WireEntry) -> Result<bool> {
        let id = tombstone.id.as_str();
        let document = serde_json::to_string(tombstone)?;

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let removed = match self
            .conn
            .execute(
                "DELETE FROM entries WHERE user_id = ? AND id = ?",
                params![user_id, id.clone()],
            )
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e.into());
            }
        };

        if removed == 0 {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Ok(false);
        }

        if let Err(e) = self
            .conn
            .execute(
                "INSERT OR REPLACE INTO trash (user_id, id, document, deleted_at_ms)
                 VALUES (?, ?, ?, ?)",
                params![user_id, id, document, timestamp_ms(tombstone)],
            )
            .await
        {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        self.conn.execute("COMMIT", ()).await?;
        Ok(true)
    }

    async fn list_trash(&self, user_id: &str) -> Result<Vec<WireEntry>> {
        self.documents(
            "SELECT document FROM trash WHERE user_id = ? ORDER BY deleted_at_ms DESC",
            [user_id],
        )
        .await
    }

    async fn insert_share(&self, share: &ShareRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO public_shares (token, owner_id, entry_id) VALUES (?, ?, ?)",
                params![
                    share.token.clone(),
                    share.owner_id.clone(),
                    share.entry_id.as_str()
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_share(&self, token: &str) -> Result<Option<ShareRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT owner_id, entry_id FROM public_shares WHERE token = ?",
                [token],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let owner_id: String = row.get(0)?;
        let entry_id: String = row.get(1)?;
        let entry_id = entry_id
            .parse()
            .map_err(|_| Error::Database(format!("Invalid entry id in share {token}")))?;
        Ok(Some(ShareRecord {
            token: token.to_string(),
            owner_id,
            entry_id,
        }))
    }

    async fn insert_comment(
        &self,
        owner_id: &str,
        id: &EntryId,
        comment: &WireComment,
    ) -> Result<()> {
        let document = serde_json::to_string(comment)?;
        let created_at_ms = comment.created_at.to_datetime().timestamp_millis();
        self.conn
            .execute(
                "INSERT INTO comments (owner_id, entry_id, document, created_at_ms)
                 VALUES (?, ?, ?, ?)",
                params![owner_id, id.as_str(), document, created_at_ms],
            )
            .await?;
        Ok(())
    }

    async fn list_comments(&self, owner_id: &str, id: &EntryId) -> Result<Vec<WireComment>> {
        self.documents(
            "SELECT document FROM comments
             WHERE owner_id = ? AND entry_id = ?
             ORDER BY created_at_ms ASC, seq ASC",
            params![owner_id, id.as_str()],
        )
        .await
    }
}
