//! Persisted login for auto-login on the next start.

use std::sync::Arc;

use chatku_shared::constants::SESSION_STORAGE_KEY;
use chatku_shared::Session;

use crate::codec;
use crate::slot::KeyValueStore;

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: SESSION_STORAGE_KEY.to_string(),
        }
    }

    pub async fn save(&self, session: &Session) -> bool {
        codec::save_json(self.store.as_ref(), &self.key, session).await
    }

    pub async fn load(&self) -> Option<Session> {
        codec::load_json(self.store.as_ref(), &self.key).await
    }

    pub async fn clear(&self) {
        codec::remove(self.store.as_ref(), &self.key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemoryStore;

    fn session() -> Session {
        Session {
            email: "ani@example.com".into(),
            display_name: "Ani".into(),
            uid: "uid-1".into(),
        }
    }

    #[tokio::test]
    async fn save_load_clear() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(store.load().await, None);

        assert!(store.save(&session()).await);
        assert_eq!(store.load().await, Some(session()));

        store.clear().await;
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn malformed_session_is_none() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(SESSION_STORAGE_KEY, "[]").await.unwrap();
        assert_eq!(SessionStore::new(kv).load().await, None);
    }

    #[tokio::test]
    async fn stored_shape_matches_camel_case() {
        let kv = Arc::new(MemoryStore::new());
        SessionStore::new(kv.clone()).save(&session()).await;
        let raw = kv.get(SESSION_STORAGE_KEY).await.unwrap().unwrap();
        assert!(raw.contains("\"displayName\":\"Ani\""));
    }
}
