use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ServerTimestamp
// ---------------------------------------------------------------------------

/// Timestamp assigned by the document store when a write is acknowledged.
///
/// Serialized as `{"seconds": .., "nanoseconds": ..}`, the shape the
/// document store hands out and the shape kept in the local cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerTimestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl ServerTimestamp {
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }

    /// `None` when the value is outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanoseconds).single()
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message as delivered by the feed and stored in the local cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned document id.
    pub id: String,
    /// Message body. Empty for image messages.
    #[serde(default)]
    pub text: String,
    /// Display name of the author.
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// `None` while the write is still pending on the server.
    #[serde(default)]
    pub created_at: Option<ServerTimestamp>,
}

/// The meaningful content of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePayload<'a> {
    Text(&'a str),
    Image(&'a str),
}

impl Message {
    pub fn is_pending(&self) -> bool {
        self.created_at.is_none()
    }

    /// An image URL takes precedence over text; a message carrying
    /// neither has no payload.
    pub fn payload(&self) -> Option<MessagePayload<'_>> {
        match self.image_url.as_deref() {
            Some(url) if !url.is_empty() => Some(MessagePayload::Image(url)),
            _ if !self.text.is_empty() => Some(MessagePayload::Text(&self.text)),
            _ => None,
        }
    }
}

/// Order a snapshot by `created_at` ascending.
///
/// Pending messages (no timestamp yet) go last. The sort is stable, so
/// pending messages keep their write order among themselves, as do
/// messages sharing a timestamp.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by_key(|m| (m.created_at.is_none(), m.created_at));
}

// ---------------------------------------------------------------------------
// MessageDraft
// ---------------------------------------------------------------------------

/// An outgoing record handed to the document feed. The feed assigns the
/// id and the server timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    pub text: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MessageDraft {
    pub fn text(text: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user: user.into(),
            image_url: None,
        }
    }

    pub fn image(image_url: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            user: user.into(),
            image_url: Some(image_url.into()),
        }
    }

    /// Materialise the draft as a stored message.
    pub fn into_message(self, id: String, created_at: Option<ServerTimestamp>) -> Message {
        Message {
            id,
            text: self.text,
            user: self.user,
            image_url: self.image_url,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Session / Identity
// ---------------------------------------------------------------------------

/// The logged-in user, persisted locally for auto-login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub display_name: String,
    pub uid: String,
}

impl Session {
    /// Display name, falling back to the local part of the email.
    pub fn effective_display_name(&self) -> String {
        if self.display_name.trim().is_empty() {
            email_local_part(&self.email).to_string()
        } else {
            self.display_name.clone()
        }
    }
}

/// An authenticated account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Everything before the first `@`.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Where a picked image came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageSource {
    Camera,
    Library,
}

/// A local image chosen by the user, ready to be sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedImage {
    pub uri: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub file_name: String,
}
