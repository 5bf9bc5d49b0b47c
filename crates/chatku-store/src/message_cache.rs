//! Last known message snapshot, kept for offline start-up and for
//! falling back when the live feed errors.

use std::sync::Arc;

use chatku_shared::constants::MESSAGES_STORAGE_KEY;
use chatku_shared::Message;
use tracing::debug;

use crate::codec;
use crate::slot::KeyValueStore;

#[derive(Clone)]
pub struct MessageCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl MessageCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, MESSAGES_STORAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Replace the cached snapshot. Write failures are logged and dropped;
    /// the return value only reports whether the write landed.
    pub async fn save(&self, messages: &[Message]) -> bool {
        let saved = codec::save_json(self.store.as_ref(), &self.key, messages).await;
        if saved {
            debug!(count = messages.len(), "Message cache updated");
        }
        saved
    }

    /// The cached snapshot, or an empty list if nothing usable is stored.
    pub async fn load(&self) -> Vec<Message> {
        codec::load_json(self.store.as_ref(), &self.key)
            .await
            .unwrap_or_default()
    }

    pub async fn clear(&self) {
        codec::remove(self.store.as_ref(), &self.key).await;
    }
}
