/// Key of the local slot holding the cached message snapshot
pub const MESSAGES_STORAGE_KEY: &str = "@ChatKu:messages";

/// Key of the local slot holding the logged-in session
pub const SESSION_STORAGE_KEY: &str = "@ChatKu:user";

/// Object store prefix for uploaded chat images
pub const IMAGE_KEY_PREFIX: &str = "chat_images";

/// Extension given to every uploaded chat image
pub const IMAGE_EXTENSION: &str = "jpg";

/// Length of the random suffix in generated image keys
pub const IMAGE_KEY_SUFFIX_LEN: usize = 6;

/// MIME type assumed when the picker does not report one
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Minimum password length accepted before calling the identity provider
pub const MIN_PASSWORD_LEN: usize = 6;

/// Picker output bound (pixels, both axes)
pub const PICKER_MAX_DIMENSION: u32 = 1024;

/// Picker JPEG quality
pub const PICKER_QUALITY: f32 = 0.8;
