//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client starts with zero
//! configuration.

use std::path::PathBuf;

use tracing::warn;

use chatku_shared::constants::{
    IMAGE_KEY_PREFIX, MIN_PASSWORD_LEN, PICKER_MAX_DIMENSION, PICKER_QUALITY,
};
use chatku_shared::{Locale, UserMessages};

use crate::ports::PickerOptions;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// SQLite file backing the local key-value slots.
    /// Env: `CHATKU_DB_PATH`
    /// Default: `None` (platform data directory).
    pub db_path: Option<PathBuf>,

    /// Language of user-facing messages.
    /// Env: `CHATKU_LOCALE` (`id` or `en`)
    /// Default: Indonesian.
    pub locale: Locale,

    /// Env: `CHATKU_MIN_PASSWORD_LEN`
    /// Default: `6`
    pub min_password_len: usize,

    /// Longest edge the picker may return, in pixels.
    /// Env: `CHATKU_IMAGE_MAX_DIMENSION`
    /// Default: `1024`
    pub image_max_dimension: u32,

    /// JPEG quality in `(0, 1]`. Out-of-range values are clamped.
    /// Env: `CHATKU_IMAGE_QUALITY`
    /// Default: `0.8`
    pub image_quality: f32,

    /// Object key prefix for uploaded images.
    /// Env: `CHATKU_UPLOAD_PREFIX`
    /// Default: `chat_images`
    pub upload_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            locale: Locale::default(),
            min_password_len: MIN_PASSWORD_LEN,
            image_max_dimension: PICKER_MAX_DIMENSION,
            image_quality: PICKER_QUALITY,
            upload_prefix: IMAGE_KEY_PREFIX.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("CHATKU_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(tag) = lookup("CHATKU_LOCALE") {
            match Locale::parse(&tag) {
                Some(locale) => config.locale = locale,
                None => warn!(value = %tag, "Unknown CHATKU_LOCALE, using default"),
            }
        }

        if let Some(val) = lookup("CHATKU_MIN_PASSWORD_LEN") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.min_password_len = n,
                _ => warn!(value = %val, "Invalid CHATKU_MIN_PASSWORD_LEN, using default"),
            }
        }

        if let Some(val) = lookup("CHATKU_IMAGE_MAX_DIMENSION") {
            match val.trim().parse::<u32>() {
                Ok(n) if n > 0 => config.image_max_dimension = n,
                _ => warn!(value = %val, "Invalid CHATKU_IMAGE_MAX_DIMENSION, using default"),
            }
        }

        if let Some(val) = lookup("CHATKU_IMAGE_QUALITY") {
            match val.trim().parse::<f32>() {
                Ok(q) if q.is_finite() && q > 0.0 => config.image_quality = q.min(1.0),
                _ => warn!(value = %val, "Invalid CHATKU_IMAGE_QUALITY, using default"),
            }
        }

        if let Some(prefix) = lookup("CHATKU_UPLOAD_PREFIX") {
            let prefix = prefix.trim().trim_matches('/');
            if prefix.is_empty() {
                warn!("Empty CHATKU_UPLOAD_PREFIX, using default");
            } else {
                config.upload_prefix = prefix.to_string();
            }
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter.

        config
    }

    pub fn strings(&self) -> UserMessages {
        UserMessages::for_locale(self.locale)
    }

    /// Base picker options. The camera flow turns on `save_to_photos`.
    pub fn picker_options(&self) -> PickerOptions {
        PickerOptions {
            max_width: self.image_max_dimension,
            max_height: self.image_max_dimension,
            quality: self.image_quality,
            include_base64: false,
            save_to_photos: false,
        }
    }
}
