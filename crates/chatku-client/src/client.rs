//! The client facade the UI layer talks to.
//!
//! [`ChatClient`] wires the auth flow, the composer, the synchronizer and
//! image acquisition to one set of collaborators and one local store, and
//! remembers who is logged in so sends carry the right display name.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use chatku_shared::{ChatError, Message, Session, UserMessages, ValidationError};
use chatku_store::{KeyValueStore, MessageCache, SessionStore, SqliteStore, StoreError};

use crate::auth::AuthService;
use crate::composer::Composer;
use crate::config::ClientConfig;
use crate::events::EventSink;
use crate::image::ImageAcquisition;
use crate::ports::{
    CameraPermission, DocumentFeed, IdentityProvider, ImagePicker, MediaReader, ObjectStore,
    SourceChooser,
};
use crate::sync::{SyncHandle, Synchronizer};

/// Everything the client needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityProvider>,
    pub feed: Arc<dyn DocumentFeed>,
    pub objects: Arc<dyn ObjectStore>,
    pub media: Arc<dyn MediaReader>,
    pub picker: Arc<dyn ImagePicker>,
    pub permission: Arc<dyn CameraPermission>,
    pub chooser: Arc<dyn SourceChooser>,
    pub events: Arc<dyn EventSink>,
}

/// Which screen to show first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Chat { display_name: String },
}

pub struct ChatClient {
    config: ClientConfig,
    strings: Arc<UserMessages>,
    auth: AuthService,
    composer: Composer,
    sync: Synchronizer,
    cache: MessageCache,
    images: ImageAcquisition,
    session: Mutex<Option<Session>>,
}

impl ChatClient {
    pub fn new(
        config: ClientConfig,
        collaborators: Collaborators,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let strings = Arc::new(config.strings());
        let cache = MessageCache::new(store.clone());
        let sessions = SessionStore::new(store);

        let auth = AuthService::new(
            collaborators.identity,
            sessions,
            strings.clone(),
            config.min_password_len,
        );
        let composer = Composer::new(
            collaborators.feed.clone(),
            collaborators.objects,
            collaborators.media,
            config.upload_prefix.clone(),
        );
        let sync = Synchronizer::new(collaborators.feed, cache.clone());
        let images = ImageAcquisition::new(
            collaborators.chooser,
            collaborators.picker,
            collaborators.permission,
            collaborators.events,
            strings.clone(),
            config.picker_options(),
        );

        Self {
            config,
            strings,
            auth,
            composer,
            sync,
            cache,
            images,
            session: Mutex::new(None),
        }
    }

    /// Open the SQLite-backed local store named by the config (or the
    /// platform default) and build a client on top of it.
    pub fn open(config: ClientConfig, collaborators: Collaborators) -> Result<Self, StoreError> {
        let store = match &config.db_path {
            Some(path) => SqliteStore::open_at(path)?,
            None => SqliteStore::open_default()?,
        };
        info!(path = ?config.db_path, "Local store opened");
        Ok(Self::new(config, collaborators, Arc::new(store)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn strings(&self) -> &UserMessages {
        &self.strings
    }

    /// Localized text for an error returned by this client.
    pub fn user_message(&self, err: &ChatError) -> String {
        err.user_message(&self.strings)
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The logged-in session, if any.
    pub fn session(&self) -> Option<Session> {
        self.session_slot().clone()
    }

    fn require_session(&self) -> Result<Session, ChatError> {
        self.session().ok_or(ChatError::Validation(ValidationError::NotLoggedIn))
    }

    /// Decide the first screen from the stored session. A stored session
    /// also becomes the current one.
    pub async fn initial_route(&self) -> Route {
        match self.auth.restore().await {
            Some(session) => {
                let display_name = session.effective_display_name();
                debug!(uid = %session.uid, "Restored session");
                *self.session_slot() = Some(session);
                Route::Chat { display_name }
            }
            None => Route::Login,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, ChatError> {
        let session = self.auth.register(email, password, display_name).await?;
        *self.session_slot() = Some(session.clone());
        Ok(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ChatError> {
        let session = self.auth.login(email, password).await?;
        *self.session_slot() = Some(session.clone());
        Ok(session)
    }

    /// End the current session. Without one this is a no-op. On failure
    /// the session stays in place.
    pub async fn logout(&self) -> Result<(), ChatError> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        self.auth.logout(&session).await?;
        *self.session_slot() = None;
        Ok(())
    }

    /// Start delivering the message list to `on_update`. See
    /// [`Synchronizer::start`].
    pub fn start_sync<F>(&self, on_update: F) -> SyncHandle
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        self.sync.start(on_update)
    }

    pub async fn fetch_once(&self) -> Vec<Message> {
        self.sync.fetch_once().await
    }

    /// Whatever the local cache holds right now.
    pub async fn cached_messages(&self) -> Vec<Message> {
        self.cache.load().await
    }

    pub async fn send_text(&self, text: &str) -> Result<(), ChatError> {
        let session = self.require_session()?;
        self.composer
            .send_text(text, &session.effective_display_name())
            .await
    }

    pub async fn send_image(&self, local_uri: &str) -> Result<(), ChatError> {
        let session = self.require_session()?;
        self.composer
            .send_image(local_uri, &session.effective_display_name())
            .await
    }

    /// Ask for an image and send it. `Ok(false)` means no image was
    /// chosen; nothing was uploaded or written.
    pub async fn pick_and_send_image(&self) -> Result<bool, ChatError> {
        let session = self.require_session()?;
        let Some(image) = self.images.acquire().await else {
            return Ok(false);
        };
        self.composer
            .send_image(&image.uri, &session.effective_display_name())
            .await?;
        Ok(true)
    }
}
