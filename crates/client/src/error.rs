//! Unified error handling with Sentry integration.
//!
//! Every component raises its own error enum; `AppError` unifies them for
//! callers that don't care which layer failed. The taxonomy maps onto four
//! families: validation (bad input), authorization (missing/rejected
//! session), network (backend call failure), and state invariants (an
//! operation that the current cart/checkout state forbids).
//!
//! Errors are always returned, never silently absorbed into state fields;
//! the one place the original design swallowed errors (catalog fetch) is
//! deliberately normalized to the same policy.

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::session::AuthError;
use crate::store::StoreError;

/// Application-level error type for the Dishly client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend API call failed.
    #[error("Network error: {0}")]
    Api(#[from] ApiError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout rejected or failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Persisted state could not be read or written.
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    /// Input failed local validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether this error should be captured to Sentry.
    ///
    /// User mistakes (bad credentials, cart rules, validation) are
    /// expected; infrastructure failures are not.
    #[must_use]
    pub const fn is_unexpected(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Config(_))
    }

    /// Report the error: log it, and capture to Sentry when unexpected.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "unexpected error");
        } else {
            tracing::debug!(error = %self, "operation failed");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
