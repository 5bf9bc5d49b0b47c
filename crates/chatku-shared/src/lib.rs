//! Types shared by every ChatKu crate: the message and session model,
//! the error taxonomy, user-facing strings and input validation.

pub mod constants;
pub mod error;
pub mod strings;
pub mod types;
pub mod validation;

pub use error::{
    AuthError, AuthErrorCode, ChatError, FeedError, IdentityError, ObjectStoreError,
    SubmissionError, ValidationError,
};
pub use strings::{Locale, UserMessages};
pub use types::{
    sort_messages, Identity, ImageSource, Message, MessageDraft, MessagePayload, SelectedImage,
    ServerTimestamp, Session,
};
