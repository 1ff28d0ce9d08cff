//! Change subscriptions delivered over channels.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::models::LogEntry;

/// Batch of changed entries pushed to a subscriber.
pub type Delta = Vec<LogEntry>;

/// Live feed of remote changes for one user.
///
/// Dropping the subscription unsubscribes from the remote.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Delta>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Delta>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Wait for the next delta. `None` once the remote side is gone.
    pub async fn next(&mut self) -> Option<Delta> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`Self::next`].
    pub fn try_next(&mut self) -> Option<Delta> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Fan-out of deltas to the subscribers of each user.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
}

struct Subscriber {
    user_id: String,
    sender: mpsc::UnboundedSender<Delta>,
}

impl SubscriberRegistry {
    /// Register a subscriber for `user_id`.
    pub fn subscribe(&self, user_id: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.insert(
                id,
                Subscriber {
                    user_id: user_id.to_string(),
                    sender,
                },
            );
            id
        };

        let registry: Weak<Mutex<RegistryInner>> = Arc::downgrade(&self.inner);
        Subscription::new(receiver, move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().subscribers.remove(&id);
            }
        })
    }

    /// Push a delta to every subscriber of `user_id`. Empty deltas are not sent.
    pub fn publish(&self, user_id: &str, delta: &[LogEntry]) {
        if delta.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|_, subscriber| {
            if subscriber.user_id != user_id {
                return true;
            }
            subscriber.sender.send(delta.to_vec()).is_ok()
        });
    }

    /// Number of live subscribers for `user_id`.
    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.inner
            .lock()
            .subscribers
            .values()
            .filter(|subscriber| subscriber.user_id == user_id)
            .count()
    }
}
