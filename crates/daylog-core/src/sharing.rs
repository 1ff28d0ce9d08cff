//! Reading shared entries and their comment threads.

use chrono::Utc;

use crate::models::{sort_comments, Comment, EntryId, LogEntry};
use crate::remote::RemotePersistence;
use crate::session::Session;
use crate::{Error, Result};

/// An entry reached through its share token.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedEntry {
    pub token: String,
    pub owner_id: String,
    pub entry: LogEntry,
}

/// Access to other users' public entries.
#[derive(Clone)]
pub struct SharedEntries<R: RemotePersistence> {
    remote: R,
}

impl<R: RemotePersistence> SharedEntries<R> {
    pub const fn new(remote: R) -> Self {
        Self { remote }
    }

    /// Resolve a share token to the entry it points at.
    ///
    /// Entries that have since gone private are reported as not found.
    pub async fn resolve(&self, token: &str) -> Result<SharedEntry> {
        let token = token.trim();
        let record = self.remote.resolve_share_token(token).await?;
        let entry = self
            .remote
            .fetch_entry(&record.owner_id, record.entry_id)
            .await?;

        if !entry.is_public() {
            tracing::debug!("Share token resolved to private entry {}", entry.id);
            return Err(Error::NotFound(format!("share token {token}")));
        }

        Ok(SharedEntry {
            token: token.to_string(),
            owner_id: record.owner_id,
            entry,
        })
    }

    /// Comments on an entry, oldest first.
    pub async fn comments(&self, owner_id: &str, entry_id: EntryId) -> Result<Vec<Comment>> {
        let mut comments = self.remote.fetch_comments(owner_id, entry_id).await?;
        sort_comments(&mut comments);
        Ok(comments)
    }

    /// Post a comment as the session's user.
    pub async fn post_comment(
        &self,
        session: Option<&Session>,
        owner_id: &str,
        entry_id: EntryId,
        content: &str,
    ) -> Result<Comment> {
        let session = session.ok_or(Error::AuthenticationRequired)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("Comment cannot be empty".to_string()));
        }

        let comment = Comment {
            content: content.to_string(),
            created_at: Utc::now(),
            created_by: session.user_id().to_string(),
        };
        self.remote
            .post_comment(owner_id, entry_id, &comment)
            .await?;
        Ok(comment)
    }
}
