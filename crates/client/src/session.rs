//! Authenticated session state.
//!
//! [`Session`] is the pure data half: the current user and bearer token,
//! with the invariant that both are set together or neither is set.
//! [`SessionHolder`] is the service half: it drives login/logout against
//! the backend, keeps the [`ApiClient`] bearer token in sync, and persists
//! the session across restarts.

use std::sync::{Mutex, PoisonError};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use dishly_core::{Email, EmailError};

use crate::api::types::User;
use crate::api::{ApiClient, ApiError};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::store::{StateStore, StoreError};

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The supplied email is not structurally valid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The backend rejected the email/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The operation requires a logged-in user.
    #[error("not logged in")]
    NotAuthenticated,

    /// An account already exists for this email.
    #[error("an account with this email already exists")]
    EmailAlreadyRegistered,

    /// Backend API failure.
    #[error("API error: {0}")]
    Api(ApiError),

    /// Persistence failure.
    #[error("state store error: {0}")]
    Store(#[from] StoreError),
}

/// The authenticated identity and bearer credential of the current user.
///
/// Invariant: `user` and `token` are always both present or both absent.
/// Fields are private so the invariant cannot be broken from outside, and
/// deserialization of a half-written document degrades to a logged-out
/// session rather than a broken one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSession")]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
}

/// Unvalidated persisted form of [`Session`].
#[derive(Debug, Deserialize)]
struct RawSession {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    token: Option<String>,
}

impl From<RawSession> for Session {
    fn from(raw: RawSession) -> Self {
        match (raw.user, raw.token) {
            (Some(user), Some(token)) => Self::establish(user, token),
            _ => Self::default(),
        }
    }
}

impl Session {
    /// Create an authenticated session.
    #[must_use]
    pub const fn establish(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
        }
    }

    /// The authenticated user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Drop user and token together.
    pub fn clear(&mut self) {
        self.user = None;
        self.token = None;
    }
}

/// Owns the current [`Session`] and drives auth operations.
pub struct SessionHolder {
    api: ApiClient,
    store: StateStore,
    session: Mutex<Session>,
}

impl SessionHolder {
    /// Create a holder with an empty session.
    #[must_use]
    pub fn new(api: ApiClient, store: StateStore) -> Self {
        Self {
            api,
            store,
            session: Mutex::new(Session::default()),
        }
    }

    /// Restore a persisted session from the state store, installing its
    /// token into the API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted document cannot be read.
    pub fn restore(&self) -> Result<Option<User>, AuthError> {
        let Some(session) = self.store.load_session()? else {
            return Ok(None);
        };

        if let Some(token) = session.token() {
            self.api.set_token(SecretString::from(token.to_string()));
        }
        if let Some(user) = session.user() {
            set_sentry_user(&user.id, Some(user.email.as_str()));
        }

        let user = session.user().cloned();
        *self.lock() = session;
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// Exchanges the credentials for a token, fetches the owning user, and
    /// only then commits the new session (memory, disk, and API client
    /// token). On any failure the previous session is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the backend rejects the
    /// pair, or the underlying API/store error otherwise.
    #[instrument(skip(self, password), fields(email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let previous_token = self.lock().token().map(String::from);

        let token = self
            .api
            .login(&email, password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized | ApiError::Status { status: 400, .. } => {
                    AuthError::InvalidCredentials
                }
                other => AuthError::Api(other),
            })?;

        // The user fetch must carry the new token.
        self.api
            .set_token(SecretString::from(token.access_token.clone()));

        let committed = match self.api.current_user().await {
            Ok(user) => {
                let session = Session::establish(user.clone(), token.access_token);
                match self.store.save_session(&session) {
                    Ok(()) => {
                        *self.lock() = session;
                        set_sentry_user(&user.id, Some(user.email.as_str()));
                        info!(user_id = %user.id, "logged in");
                        Ok(user)
                    }
                    Err(e) => Err(AuthError::Store(e)),
                }
            }
            Err(e) => Err(AuthError::Api(e)),
        };

        if committed.is_err() {
            // Roll the API client back to the pre-login token state.
            match previous_token {
                Some(t) => self.api.set_token(SecretString::from(t)),
                None => self.api.clear_token(),
            }
        }

        committed
    }

    /// Register a new account. Pass-through: no local state changes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailAlreadyRegistered` if the email is taken,
    /// or the underlying API error otherwise.
    #[instrument(skip(self, password), fields(email))]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.api.register(&email, password).await.map_err(|e| match e {
            ApiError::Status { status: 400, .. } => AuthError::EmailAlreadyRegistered,
            other => AuthError::Api(other),
        })
    }

    /// Log out: clear user and token together, drop the persisted session,
    /// and detach the API client token.
    ///
    /// The in-memory session is cleared even if removing the persisted
    /// document fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be removed.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.lock().clear();
        self.api.clear_token();
        clear_sentry_user();
        info!("logged out");

        self.store.clear_session()?;
        Ok(())
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current(&self) -> Session {
        self.lock().clone()
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().user().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dishly_core::{UserId, UserRole};

    fn sample_user() -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("user@example.com").unwrap(),
            role: UserRole::Customer,
            phone: None,
            address: None,
        }
    }

    #[test]
    fn test_session_user_iff_token() {
        let session = Session::default();
        assert!(session.user().is_none());
        assert!(session.token().is_none());

        let session = Session::establish(sample_user(), "tok".to_string());
        assert!(session.user().is_some());
        assert_eq!(session.token(), Some("tok"));
    }

    #[test]
    fn test_clear_drops_both_together() {
        let mut session = Session::establish(sample_user(), "tok".to_string());
        session.clear();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_deserialize_half_session_degrades_to_logged_out() {
        // token without user
        let session: Session = serde_json::from_str(r#"{"token": "tok"}"#).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());

        // user without token
        let session: Session = serde_json::from_str(
            r#"{"user": {"id": 1, "email": "user@example.com", "role": "customer"}}"#,
        )
        .unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_session_serde_roundtrip() {
        let session = Session::establish(sample_user(), "tok".to_string());
        let json = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
