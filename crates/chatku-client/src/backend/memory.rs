//! In-process implementations of the hosted collaborators.
//!
//! Behaves like the hosted service from the client's point of view:
//! server-assigned ids and timestamps, an initial snapshot on subscribe,
//! a pending (untimestamped) snapshot followed by the acknowledged one on
//! every append. Switches for connectivity loss and write failures make
//! the failure paths reachable from tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use chatku_shared::{
    sort_messages, AuthErrorCode, FeedError, Identity, IdentityError, Message, MessageDraft,
    ObjectStoreError, ServerTimestamp,
};

use crate::ports::{
    DocumentFeed, FeedEvent, FeedSubscription, IdentityProvider, ObjectHandle, ObjectStore,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not wedge every later assertion.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// All three hosted collaborators, sharing nothing but a lifetime.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub identity: Arc<MemoryIdentity>,
    pub feed: Arc<MemoryFeed>,
    pub objects: Arc<MemoryObjectStore>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    fail_next: Option<AuthErrorCode>,
    fail_end_session: bool,
    calls: usize,
    signed_in: Option<String>,
}

#[derive(Default)]
pub struct MemoryIdentity {
    state: Mutex<IdentityState>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account without going through `create_account`.
    pub fn add_account(&self, email: &str, password: &str, display_name: Option<&str>) -> String {
        let uid = Uuid::new_v4().to_string();
        lock(&self.state).accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
                display_name: display_name.map(str::to_string),
            },
        );
        uid
    }

    /// Make the next create/verify call fail with `code`.
    pub fn fail_next(&self, code: AuthErrorCode) {
        lock(&self.state).fail_next = Some(code);
    }

    pub fn fail_end_session(&self, fail: bool) {
        lock(&self.state).fail_end_session = fail;
    }

    /// Number of create/verify/end calls that reached the provider.
    pub fn call_count(&self) -> usize {
        lock(&self.state).calls
    }

    pub fn signed_in_uid(&self) -> Option<String> {
        lock(&self.state).signed_in.clone()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let mut state = lock(&self.state);
        state.calls += 1;
        if let Some(code) = state.fail_next.take() {
            return Err(IdentityError::new(code, "injected failure"));
        }
        if !chatku_shared::validation::is_valid_email(email) {
            return Err(IdentityError::new(AuthErrorCode::InvalidEmail, email));
        }
        if password.chars().count() < chatku_shared::constants::MIN_PASSWORD_LEN {
            return Err(IdentityError::new(AuthErrorCode::WeakPassword, "too short"));
        }
        if state.accounts.contains_key(email) {
            return Err(IdentityError::new(AuthErrorCode::EmailAlreadyInUse, email));
        }

        let uid = Uuid::new_v4().to_string();
        state.accounts.insert(
            email.to_string(),
            Account {
                uid: uid.clone(),
                password: password.to_string(),
                display_name: None,
            },
        );
        state.signed_in = Some(uid.clone());
        debug!(%uid, "Account created");

        Ok(Identity {
            uid,
            email: Some(email.to_string()),
            display_name: None,
        })
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let mut state = lock(&self.state);
        state.calls += 1;
        if let Some(code) = state.fail_next.take() {
            return Err(IdentityError::new(code, "injected failure"));
        }

        let (uid, display_name) = match state.accounts.get(email) {
            None => return Err(IdentityError::new(AuthErrorCode::UserNotFound, email)),
            Some(acct) if acct.password != password => {
                return Err(IdentityError::new(AuthErrorCode::WrongPassword, email))
            }
            Some(acct) => (acct.uid.clone(), acct.display_name.clone()),
        };
        state.signed_in = Some(uid.clone());

        Ok(Identity {
            uid,
            email: Some(email.to_string()),
            display_name,
        })
    }

    async fn end_session(&self, identity: &Identity) -> Result<(), IdentityError> {
        let mut state = lock(&self.state);
        state.calls += 1;
        if state.fail_end_session {
            return Err(IdentityError::new(
                AuthErrorCode::NetworkRequestFailed,
                "injected failure",
            ));
        }
        if state.signed_in.as_deref() == Some(identity.uid.as_str()) {
            state.signed_in = None;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Document feed
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FeedState {
    /// Write order; snapshots are sorted on the way out.
    records: Vec<Message>,
    subscribers: Vec<mpsc::UnboundedSender<FeedEvent>>,
    offline: bool,
    fail_writes: bool,
    write_attempts: usize,
    last_timestamp: Option<ServerTimestamp>,
}

impl FeedState {
    fn snapshot(&self) -> Vec<Message> {
        let mut messages = self.records.clone();
        sort_messages(&mut messages);
        messages
    }

    fn broadcast(&mut self, event: FeedEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn broadcast_snapshot(&mut self) {
        if !self.offline {
            let snapshot = self.snapshot();
            self.broadcast(FeedEvent::Snapshot(snapshot));
        }
    }

    /// Server clock, forced strictly increasing so appends never tie.
    fn next_timestamp(&mut self) -> ServerTimestamp {
        let mut ts = ServerTimestamp::now();
        if let Some(last) = self.last_timestamp {
            if ts <= last {
                ts = if last.nanoseconds >= 999_999_999 {
                    ServerTimestamp::new(last.seconds + 1, 0)
                } else {
                    ServerTimestamp::new(last.seconds, last.nanoseconds + 1)
                };
            }
        }
        self.last_timestamp = Some(ts);
        ts
    }
}

#[derive(Default)]
pub struct MemoryFeed {
    state: Mutex<FeedState>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate connectivity loss. Going offline reports an error to every
    /// subscriber; coming back pushes the current snapshot.
    pub fn set_offline(&self, offline: bool) {
        let mut state = lock(&self.state);
        let was_offline = state.offline;
        state.offline = offline;
        if offline && !was_offline {
            state.broadcast(FeedEvent::Error(FeedError::Unavailable("offline".into())));
        } else if !offline && was_offline {
            state.broadcast_snapshot();
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Replace the stored records (server-side edit) and notify subscribers.
    pub fn replace_all(&self, messages: Vec<Message>) {
        let mut state = lock(&self.state);
        state.records = messages;
        state.broadcast_snapshot();
    }

    /// Push an error to every subscriber without changing connectivity.
    pub fn emit_error(&self, error: FeedError) {
        lock(&self.state).broadcast(FeedEvent::Error(error));
    }

    pub fn records(&self) -> Vec<Message> {
        lock(&self.state).snapshot()
    }

    /// Calls to `append`, successful or not.
    pub fn write_attempts(&self) -> usize {
        lock(&self.state).write_attempts
    }

    pub fn subscriber_count(&self) -> usize {
        let mut state = lock(&self.state);
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }
}

#[async_trait]
impl DocumentFeed for MemoryFeed {
    async fn append(&self, draft: MessageDraft) -> Result<String, FeedError> {
        let mut state = lock(&self.state);
        state.write_attempts += 1;
        if state.fail_writes {
            return Err(FeedError::Rejected("writes disabled".into()));
        }
        if state.offline {
            return Err(FeedError::Unavailable("offline".into()));
        }

        let id = Uuid::new_v4().simple().to_string();
        state.records.push(draft.into_message(id.clone(), None));
        state.broadcast_snapshot();

        let ts = state.next_timestamp();
        if let Some(record) = state.records.iter_mut().find(|m| m.id == id) {
            record.created_at = Some(ts);
        }
        state.broadcast_snapshot();

        debug!(%id, "Record appended");
        Ok(id)
    }

    fn subscribe(&self) -> FeedSubscription {
        let (tx, subscription) = FeedSubscription::channel();
        let mut state = lock(&self.state);
        let first = if state.offline {
            FeedEvent::Error(FeedError::Unavailable("offline".into()))
        } else {
            FeedEvent::Snapshot(state.snapshot())
        };
        if tx.send(first).is_ok() {
            state.subscribers.push(tx);
        }
        subscription
    }

    async fn fetch(&self) -> Result<Vec<Message>, FeedError> {
        let state = lock(&self.state);
        if state.offline {
            return Err(FeedError::Unavailable("offline".into()));
        }
        Ok(state.snapshot())
    }
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ObjectState {
    objects: HashMap<String, (Bytes, String)>,
    fail_uploads: bool,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    state: Mutex<ObjectState>,
}

impl MemoryObjectStore {
    pub const URL_SCHEME: &'static str = "memory://";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        lock(&self.state).fail_uploads = fail;
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = lock(&self.state).objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get(&self, key: &str) -> Option<(Bytes, String)> {
        lock(&self.state).objects.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<ObjectHandle, ObjectStoreError> {
        let mut state = lock(&self.state);
        if state.fail_uploads {
            return Err(ObjectStoreError::Upload("uploads disabled".into()));
        }
        state
            .objects
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(ObjectHandle {
            key: key.to_string(),
        })
    }

    async fn public_url(&self, handle: &ObjectHandle) -> Result<String, ObjectStoreError> {
        if lock(&self.state).objects.contains_key(&handle.key) {
            Ok(format!("{}{}", Self::URL_SCHEME, handle.key))
        } else {
            Err(ObjectStoreError::NotFound(handle.key.clone()))
        }
    }
}
