//! Local input checks run before any request leaves the device.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Check login or registration input.
///
/// Pass `display_name` only when registering; it must then be non-blank.
pub fn validate_credentials(
    email: &str,
    password: &str,
    display_name: Option<&str>,
    min_password_len: usize,
) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    if !is_valid_email(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.chars().count() < min_password_len {
        return Err(ValidationError::PasswordTooShort {
            min: min_password_len,
        });
    }
    if let Some(name) = display_name {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingDisplayName);
        }
    }
    Ok(())
}

/// Trim an outgoing text message, rejecting blank input.
pub fn normalize_message_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyMessage)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
    }

    #[test]
    fn credential_checks_in_order() {
        assert_eq!(
            validate_credentials(" ", "secret1", None, 6),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate_credentials("nope", "secret1", None, 6),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_credentials("a@b.co", "12345", None, 6),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
        assert_eq!(
            validate_credentials("a@b.co", "123456", Some("  "), 6),
            Err(ValidationError::MissingDisplayName)
        );
        assert!(validate_credentials("a@b.co", "123456", Some("Ani"), 6).is_ok());
        assert!(validate_credentials("a@b.co", "123456", None, 6).is_ok());
    }

    #[test]
    fn blank_text_rejected() {
        assert_eq!(normalize_message_text(""), Err(ValidationError::EmptyMessage));
        assert_eq!(normalize_message_text("   "), Err(ValidationError::EmptyMessage));
        assert_eq!(normalize_message_text("  hi "), Ok("hi"));
    }
}
