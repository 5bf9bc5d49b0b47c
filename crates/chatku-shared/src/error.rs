use thiserror::Error;

use crate::strings::UserMessages;

/// Umbrella error returned by client operations that reach the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),
}

impl ChatError {
    /// The string to put in front of the user.
    pub fn user_message(&self, strings: &UserMessages) -> String {
        match self {
            ChatError::Validation(e) => e.user_message(strings).to_string(),
            ChatError::Auth(e) => e.message.clone(),
            ChatError::Submission(e) => e.user_message(strings).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Input rejected locally, before any I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Malformed email address")]
    InvalidEmail,

    #[error("Password shorter than {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Display name is required to register")]
    MissingDisplayName,

    #[error("No user is logged in")]
    NotLoggedIn,
}

impl ValidationError {
    pub fn user_message<'a>(&self, strings: &'a UserMessages) -> &'a str {
        match self {
            ValidationError::EmptyMessage => &strings.empty_message,
            ValidationError::MissingCredentials => &strings.missing_credentials,
            ValidationError::InvalidEmail => &strings.invalid_email_format,
            ValidationError::PasswordTooShort { .. } => &strings.password_too_short,
            ValidationError::MissingDisplayName => &strings.missing_display_name,
            ValidationError::NotLoggedIn => &strings.not_logged_in,
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Error codes emitted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    OperationNotAllowed,
    WeakPassword,
    UserDisabled,
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    TooManyRequests,
    NetworkRequestFailed,
    /// Raised locally when ending the provider session fails.
    LogoutFailed,
    /// Any code outside the known vocabulary, kept verbatim.
    Other(String),
}

impl AuthErrorCode {
    /// Parse a provider code. Accepts both `auth/user-not-found` and
    /// `user-not-found`.
    pub fn from_code(code: &str) -> Self {
        let bare = code.strip_prefix("auth/").unwrap_or(code);
        match bare {
            "email-already-in-use" => Self::EmailAlreadyInUse,
            "invalid-email" => Self::InvalidEmail,
            "operation-not-allowed" => Self::OperationNotAllowed,
            "weak-password" => Self::WeakPassword,
            "user-disabled" => Self::UserDisabled,
            "user-not-found" => Self::UserNotFound,
            "wrong-password" => Self::WrongPassword,
            "invalid-credential" => Self::InvalidCredential,
            "too-many-requests" => Self::TooManyRequests,
            "network-request-failed" => Self::NetworkRequestFailed,
            _ => Self::Other(code.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::InvalidEmail => "auth/invalid-email",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::WeakPassword => "auth/weak-password",
            Self::UserDisabled => "auth/user-disabled",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::NetworkRequestFailed => "auth/network-request-failed",
            Self::LogoutFailed => "logout-failed",
            Self::Other(code) => code,
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Failure reported by the identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Identity provider error {code}: {detail}")]
pub struct IdentityError {
    pub code: AuthErrorCode,
    pub detail: String,
}

impl IdentityError {
    pub fn new(code: AuthErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

/// User-facing auth failure. `message` is already localized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn localize(code: AuthErrorCode, strings: &UserMessages) -> Self {
        let message = strings.auth_message(&code).to_string();
        Self { code, message }
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// A send that reached the network and failed there.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Failed to write message: {0}")]
    MessageWrite(String),

    #[error("Failed to read local image: {0}")]
    ImageRead(String),

    #[error("Failed to upload image: {0}")]
    ImageUpload(String),

    #[error("Failed to write image message: {0}")]
    ImageMessageWrite(String),
}

impl SubmissionError {
    pub fn user_message<'a>(&self, strings: &'a UserMessages) -> &'a str {
        match self {
            SubmissionError::MessageWrite(_) => &strings.send_failed,
            SubmissionError::ImageRead(_)
            | SubmissionError::ImageUpload(_)
            | SubmissionError::ImageMessageWrite(_) => &strings.image_send_failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Subscription closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_parsing_accepts_bare_and_prefixed() {
        assert_eq!(
            AuthErrorCode::from_code("auth/user-not-found"),
            AuthErrorCode::UserNotFound
        );
        assert_eq!(
            AuthErrorCode::from_code("user-not-found"),
            AuthErrorCode::UserNotFound
        );
        assert_eq!(
            AuthErrorCode::from_code("auth/quota-exceeded"),
            AuthErrorCode::Other("auth/quota-exceeded".into())
        );
    }

    #[test]
    fn user_not_found_maps_to_configured_string() {
        let strings = UserMessages::default();
        let err = AuthError::localize(AuthErrorCode::from_code("auth/user-not-found"), &strings);
        assert_eq!(err.message, strings.user_not_found);
        assert_ne!(err.message, "auth/user-not-found");
    }

    #[test]
    fn unknown_code_maps_to_default() {
        let strings = UserMessages::default();
        let err = AuthError::localize(AuthErrorCode::Other("weird".into()), &strings);
        assert_eq!(err.message, strings.auth_default);
    }

    #[test]
    fn chat_error_user_message() {
        let strings = UserMessages::english();
        let err: ChatError = SubmissionError::ImageUpload("boom".into()).into();
        assert_eq!(err.user_message(&strings), strings.image_send_failed);

        let err: ChatError = ValidationError::EmptyMessage.into();
        assert_eq!(err.user_message(&strings), strings.empty_message);
    }
}
