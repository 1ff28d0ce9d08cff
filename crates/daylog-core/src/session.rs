//! Signed-in sessions and the store bound to each.

use tokio::sync::Mutex;

use crate::remote::RemotePersistence;
use crate::store::SyncStore;
use crate::{Error, Result};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    /// Session for `user_id`, trimmed. Blank ids are rejected.
    pub fn new(user_id: impl AsRef<str>) -> Result<Self> {
        let user_id = user_id.as_ref().trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("User id cannot be empty".to_string()));
        }
        Ok(Self {
            user_id: user_id.to_string(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Owns at most one open store at a time.
pub struct SessionManager<R: RemotePersistence> {
    remote: R,
    current: Mutex<Option<SyncStore<R>>>,
}

impl<R: RemotePersistence> SessionManager<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            current: Mutex::new(None),
        }
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Sign `user_id` in and return their store.
    ///
    /// Signing in the user who is already signed in returns the existing
    /// store; any other user replaces it, closing the previous one first.
    pub async fn sign_in(&self, user_id: &str) -> Result<SyncStore<R>> {
        let session = Session::new(user_id)?;
        let mut current = self.current.lock().await;

        if let Some(store) = current.as_ref() {
            if store.user_id() == session.user_id() && store.is_open() {
                return Ok(store.clone());
            }
        }
        if let Some(previous) = current.take() {
            tracing::info!("Signing out {}", previous.user_id());
            previous.close().await;
        }

        let store = SyncStore::open(&session, self.remote.clone()).await;
        *current = Some(store.clone());
        Ok(store)
    }

    /// Close and drop the current store, if any.
    pub async fn sign_out(&self) {
        if let Some(store) = self.current.lock().await.take() {
            tracing::info!("Signing out {}", store.user_id());
            store.close().await;
        }
    }

    pub async fn current(&self) -> Option<SyncStore<R>> {
        self.current.lock().await.clone()
    }
}
