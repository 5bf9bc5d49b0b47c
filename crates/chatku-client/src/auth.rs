//! Registration, login, logout and auto-login.
//!
//! Credential checks happen locally first; everything past that is the
//! identity provider's call. Provider error codes are turned into
//! localized [`AuthError`]s here and nowhere else.

use std::sync::Arc;

use tracing::{info, warn};

use chatku_shared::types::email_local_part;
use chatku_shared::validation::validate_credentials;
use chatku_shared::{
    AuthError, AuthErrorCode, ChatError, Identity, IdentityError, Session, UserMessages,
};
use chatku_store::SessionStore;

use crate::ports::IdentityProvider;

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    sessions: SessionStore,
    strings: Arc<UserMessages>,
    min_password_len: usize,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        sessions: SessionStore,
        strings: Arc<UserMessages>,
        min_password_len: usize,
    ) -> Self {
        Self {
            identity,
            sessions,
            strings,
            min_password_len,
        }
    }

    fn localize(&self, err: IdentityError) -> AuthError {
        warn!(code = %err.code, detail = %err.detail, "Identity provider rejected request");
        AuthError::localize(err.code, &self.strings)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, ChatError> {
        validate_credentials(email, password, Some(display_name), self.min_password_len)?;
        let email = email.trim();

        let identity = self
            .identity
            .create_account(email, password)
            .await
            .map_err(|e| self.localize(e))?;

        let session = Session {
            email: identity.email.unwrap_or_else(|| email.to_string()),
            display_name: display_name.trim().to_string(),
            uid: identity.uid,
        };
        self.sessions.save(&session).await;

        info!(uid = %session.uid, "Registered");
        Ok(session)
    }

    /// Display name preference: the one stored from an earlier session of
    /// the same account on this device, then the provider's, then the
    /// email local part.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ChatError> {
        validate_credentials(email, password, None, self.min_password_len)?;
        let email = email.trim();

        let identity = self
            .identity
            .verify_credentials(email, password)
            .await
            .map_err(|e| self.localize(e))?;

        let stored_name = self
            .sessions
            .load()
            .await
            .filter(|s| s.email.eq_ignore_ascii_case(email))
            .map(|s| s.display_name)
            .filter(|n| !n.trim().is_empty());
        let display_name = stored_name
            .or(identity.display_name.filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| email_local_part(email).to_string());

        let session = Session {
            email: identity.email.unwrap_or_else(|| email.to_string()),
            display_name,
            uid: identity.uid,
        };
        self.sessions.save(&session).await;

        info!(uid = %session.uid, "Logged in");
        Ok(session)
    }

    /// End the provider session, then forget the stored one.
    pub async fn logout(&self, session: &Session) -> Result<(), ChatError> {
        let identity = Identity {
            uid: session.uid.clone(),
            email: Some(session.email.clone()),
            display_name: Some(session.display_name.clone()),
        };

        if let Err(e) = self.identity.end_session(&identity).await {
            warn!(code = %e.code, detail = %e.detail, "Failed to end session");
            return Err(AuthError::localize(AuthErrorCode::LogoutFailed, &self.strings).into());
        }

        self.sessions.clear().await;
        info!(uid = %session.uid, "Logged out");
        Ok(())
    }

    /// The stored session, if it is usable for auto-login.
    pub async fn restore(&self) -> Option<Session> {
        self.sessions
            .load()
            .await
            .filter(|s| !s.email.trim().is_empty())
    }
}
