//! User-facing strings.
//!
//! Every message shown to the user goes through [`UserMessages`], so a
//! deployment can swap the catalog (or individual entries) without
//! touching the error types.

use serde::{Deserialize, Serialize};

use crate::error::AuthErrorCode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Indonesian,
    English,
}

impl Locale {
    /// Parse a language tag such as `id`, `id-ID`, `en` or `en_US`.
    pub fn parse(tag: &str) -> Option<Self> {
        let lang = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match lang.as_str() {
            "id" | "in" => Some(Self::Indonesian),
            "en" => Some(Self::English),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserMessages {
    // auth provider codes
    pub email_already_in_use: String,
    pub invalid_email: String,
    pub operation_not_allowed: String,
    pub weak_password: String,
    pub user_disabled: String,
    pub user_not_found: String,
    pub wrong_password: String,
    pub invalid_credential: String,
    pub too_many_requests: String,
    pub network_request_failed: String,
    pub logout_failed: String,
    pub auth_default: String,

    // local validation
    pub empty_message: String,
    pub missing_credentials: String,
    pub invalid_email_format: String,
    pub password_too_short: String,
    pub missing_display_name: String,
    pub not_logged_in: String,

    // submission
    pub send_failed: String,
    pub image_send_failed: String,

    // alert titles
    pub error_title: String,
    pub permission_denied_title: String,

    // image acquisition
    pub camera_permission_denied: String,
    pub pick_failed: String,
    pub capture_failed: String,
}

impl Default for UserMessages {
    fn default() -> Self {
        Self::indonesian()
    }
}

impl UserMessages {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Indonesian => Self::indonesian(),
            Locale::English => Self::english(),
        }
    }

    pub fn indonesian() -> Self {
        Self {
            email_already_in_use: "Email sudah terdaftar. Silakan login.".into(),
            invalid_email: "Format email tidak valid.".into(),
            operation_not_allowed: "Registrasi tidak diizinkan. Hubungi admin.".into(),
            weak_password: "Password terlalu lemah. Minimal 6 karakter.".into(),
            user_disabled: "Akun ini telah dinonaktifkan.".into(),
            user_not_found: "Email tidak terdaftar. Silakan register.".into(),
            wrong_password: "Password salah.".into(),
            invalid_credential: "Email atau password salah.".into(),
            too_many_requests: "Terlalu banyak percobaan. Coba lagi nanti.".into(),
            network_request_failed: "Tidak ada koneksi internet.".into(),
            logout_failed: "Gagal logout. Silakan coba lagi.".into(),
            auth_default: "Terjadi kesalahan. Silakan coba lagi.".into(),

            empty_message: "Pesan tidak boleh kosong".into(),
            missing_credentials: "Email dan password harus diisi".into(),
            invalid_email_format: "Format email tidak valid".into(),
            password_too_short: "Password minimal 6 karakter".into(),
            missing_display_name: "Nama harus diisi untuk registrasi".into(),
            not_logged_in: "Silakan login terlebih dahulu".into(),

            send_failed: "Gagal mengirim pesan".into(),
            image_send_failed: "Gagal mengirim gambar".into(),

            error_title: "Error".into(),
            permission_denied_title: "Izin Ditolak".into(),

            camera_permission_denied: "Izin kamera diperlukan untuk mengambil foto".into(),
            pick_failed: "Gagal memilih gambar".into(),
            capture_failed: "Gagal mengambil foto".into(),
        }
    }

    pub fn english() -> Self {
        Self {
            email_already_in_use: "Email is already registered. Please log in.".into(),
            invalid_email: "Invalid email format.".into(),
            operation_not_allowed: "Registration is not allowed. Contact the admin.".into(),
            weak_password: "Password is too weak. At least 6 characters.".into(),
            user_disabled: "This account has been disabled.".into(),
            user_not_found: "Email is not registered. Please register.".into(),
            wrong_password: "Wrong password.".into(),
            invalid_credential: "Wrong email or password.".into(),
            too_many_requests: "Too many attempts. Try again later.".into(),
            network_request_failed: "No internet connection.".into(),
            logout_failed: "Logout failed. Please try again.".into(),
            auth_default: "An error occurred. Please try again.".into(),

            empty_message: "Message cannot be empty".into(),
            missing_credentials: "Email and password are required".into(),
            invalid_email_format: "Invalid email format".into(),
            password_too_short: "Password must be at least 6 characters".into(),
            missing_display_name: "Name is required to register".into(),
            not_logged_in: "Please log in first".into(),

            send_failed: "Failed to send message".into(),
            image_send_failed: "Failed to send image".into(),

            error_title: "Error".into(),
            permission_denied_title: "Permission Denied".into(),

            camera_permission_denied: "Camera permission is required to take a photo".into(),
            pick_failed: "Failed to pick image".into(),
            capture_failed: "Failed to take photo".into(),
        }
    }

    pub fn auth_message(&self, code: &AuthErrorCode) -> &str {
        match code {
            AuthErrorCode::EmailAlreadyInUse => &self.email_already_in_use,
            AuthErrorCode::InvalidEmail => &self.invalid_email,
            AuthErrorCode::OperationNotAllowed => &self.operation_not_allowed,
            AuthErrorCode::WeakPassword => &self.weak_password,
            AuthErrorCode::UserDisabled => &self.user_disabled,
            AuthErrorCode::UserNotFound => &self.user_not_found,
            AuthErrorCode::WrongPassword => &self.wrong_password,
            AuthErrorCode::InvalidCredential => &self.invalid_credential,
            AuthErrorCode::TooManyRequests => &self.too_many_requests,
            AuthErrorCode::NetworkRequestFailed => &self.network_request_failed,
            AuthErrorCode::LogoutFailed => &self.logout_failed,
            AuthErrorCode::Other(_) => &self.auth_default,
        }
    }
}
