//! Interfaces to the collaborators the client talks to: the identity
//! provider, the document feed, the object store, local media and the
//! platform image picker.
//!
//! Everything here is injected as `Arc<dyn ...>` so tests (and the
//! in-memory backend) can stand in for the hosted services.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use chatku_shared::{
    FeedError, Identity, IdentityError, ImageSource, Message, MessageDraft, ObjectStoreError,
};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    async fn create_account(&self, email: &str, password: &str)
        -> Result<Identity, IdentityError>;

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError>;

    async fn end_session(&self, identity: &Identity) -> Result<(), IdentityError>;
}

// ---------------------------------------------------------------------------
// Document feed
// ---------------------------------------------------------------------------

/// What a live subscription delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The complete message list ordered by `created_at` ascending.
    Snapshot(Vec<Message>),
    /// The subscription hit an error (typically lost connectivity). The
    /// feed may keep delivering snapshots afterwards if it reconnects.
    Error(FeedError),
}

/// Receiving end of a live subscription. Dropping it detaches the
/// listener.
#[derive(Debug)]
pub struct FeedSubscription {
    rx: mpsc::UnboundedReceiver<FeedEvent>,
}

impl FeedSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<FeedEvent>) -> Self {
        Self { rx }
    }

    /// A connected sender/subscription pair for feed implementations.
    pub fn channel() -> (mpsc::UnboundedSender<FeedEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    /// `None` once the feed has closed the subscription.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait DocumentFeed: Send + Sync + 'static {
    /// Write a new record. The feed assigns the id and server timestamp
    /// and returns the id.
    async fn append(&self, draft: MessageDraft) -> Result<String, FeedError>;

    /// Attach a live listener ordered by `created_at` ascending.
    ///
    /// Attaching never blocks and never fails up front: connection
    /// problems arrive as [`FeedEvent::Error`] on the subscription.
    fn subscribe(&self) -> FeedSubscription;

    /// One-shot read of the current ordered snapshot.
    async fn fetch(&self) -> Result<Vec<Message>, FeedError>;
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

/// Opaque reference to a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub key: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<ObjectHandle, ObjectStoreError>;

    async fn public_url(&self, handle: &ObjectHandle) -> Result<String, ObjectStoreError>;
}

// ---------------------------------------------------------------------------
// Local media
// ---------------------------------------------------------------------------

/// Reads the bytes behind a local image reference returned by the picker.
#[async_trait]
pub trait MediaReader: Send + Sync + 'static {
    async fn read(&self, uri: &str) -> std::io::Result<Bytes>;
}

// ---------------------------------------------------------------------------
// Image picker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PickerOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality in `(0, 1]`.
    pub quality: f32,
    pub include_base64: bool,
    /// Camera only: also store the capture in the device gallery.
    pub save_to_photos: bool,
}

/// One asset as reported by the platform picker. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickedAsset {
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    Cancelled,
    Picked(Vec<PickedAsset>),
    Failed { code: String, message: String },
}

#[async_trait]
pub trait ImagePicker: Send + Sync + 'static {
    async fn launch(&self, source: ImageSource, options: &PickerOptions) -> PickerOutcome;
}

#[async_trait]
pub trait CameraPermission: Send + Sync + 'static {
    /// Ask for the runtime camera permission. Platforms without runtime
    /// permissions return `Ok(true)`.
    async fn request(&self) -> Result<bool, String>;
}

/// The user's answer to "camera or library?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChoice {
    Camera,
    Library,
    Cancel,
}

#[async_trait]
pub trait SourceChooser: Send + Sync + 'static {
    async fn choose(&self) -> SourceChoice;
}
