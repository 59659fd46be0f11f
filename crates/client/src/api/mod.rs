//! Typed HTTP client for the Dishly backend REST API.
//!
//! # Architecture
//!
//! - The backend is the source of truth - no local sync, direct API calls
//! - A bearer token is attached to every request while a session is active
//! - Idempotent reads (GETs) retry with exponential backoff; order creation
//!   is never retried because it is not idempotent
//!
//! # Example
//!
//! ```rust,ignore
//! use dishly_client::api::ApiClient;
//!
//! let api = ApiClient::new(&config)?;
//! let restaurants = api.restaurants().await?;
//! let token = api.login(&email, "hunter2!").await?;
//! api.set_token(token.access_token.into());
//! let me = api.current_user().await?;
//! ```

pub mod types;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use dishly_core::{Email, RestaurantId, UserId};

use crate::config::ClientConfig;
use types::{
    Category, CredentialsRequest, ErrorBody, Order, OrderSubmission, Restaurant, TokenResponse,
    User,
};

/// Base delay for retry backoff; doubles per attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A path could not be joined onto the configured base URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the bearer token (or none was sent).
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response, with the backend's `detail` message.
    #[error("API error (HTTP {status}): {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend-provided detail message, or a truncated body.
        detail: String,
    },
}

impl ApiError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport failures, 5xx responses, and rate limits are transient;
    /// everything else reflects the request itself and must not be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Client for the Dishly backend API.
///
/// Cheaply cloneable via `Arc`. Holds the bearer token for the active
/// session; [`crate::session::SessionHolder`] keeps it in sync.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    get_retries: u32,
}

impl ApiClient {
    /// Create a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        // Url::join treats a base without a trailing slash as a file, which
        // would silently drop the last path segment of the configured URL.
        let mut base_url = config.api_base_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                token: RwLock::new(None),
                get_retries: config.catalog_retries,
            }),
        })
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// Install the bearer token attached to subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        if let Ok(mut slot) = self.inner.token.write() {
            *slot = Some(token);
        }
    }

    /// Remove the bearer token.
    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.inner.token.write() {
            *slot = None;
        }
    }

    /// Whether a bearer token is currently installed.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let mut builder = self.inner.client.request(method, url);

        if let Ok(slot) = self.inner.token.read()
            && let Some(token) = slot.as_ref()
        {
            builder = builder.bearer_auth(token.expose_secret());
        }

        Ok(builder)
    }

    /// Send a request and decode the response, mapping error statuses.
    async fn execute<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let detail = extract_detail(&body);
            debug!(status = %status, detail = %detail, "backend returned error status");
            return Err(match status {
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
                StatusCode::NOT_FOUND => ApiError::NotFound(detail),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    detail,
                },
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// GET with decoded JSON response; no retry.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::execute(self.request(Method::GET, path)?).await
    }

    /// GET with bounded retry and exponential backoff.
    ///
    /// Safe for idempotent reads only. Gives up immediately on
    /// non-transient errors.
    async fn get_json_with_retry<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            match self.get_json(path).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.inner.get_retries => {
                    let delay = match err {
                        ApiError::RateLimited(secs) => Duration::from_secs(secs),
                        _ => RETRY_BASE_DELAY * 2_u32.saturating_pow(attempt),
                    };
                    warn!(path, attempt, error = %err, "transient API error, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// POST with JSON body and decoded JSON response; never retried.
    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        Self::execute(self.request(Method::POST, path)?.json(body)).await
    }

    // =========================================================================
    // Auth Endpoints
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<TokenResponse, ApiError> {
        let request = CredentialsRequest {
            email: email.clone(),
            password: password.to_string(),
        };
        self.post_json("auth/login", &request).await
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(&self, email: &Email, password: &str) -> Result<(), ApiError> {
        let request = CredentialsRequest {
            email: email.clone(),
            password: password.to_string(),
        };
        // The backend returns a token here too, but registration is a
        // pass-through: the caller logs in explicitly afterwards.
        let _: serde_json::Value = self.post_json("auth/register", &request).await?;
        Ok(())
    }

    /// Fetch the user owning the installed bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if no valid token is installed.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json("users/me").await
    }

    // =========================================================================
    // Catalog Endpoints
    // =========================================================================

    /// List all restaurants.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after bounded retries.
    #[instrument(skip(self))]
    pub async fn restaurants(&self) -> Result<Vec<Restaurant>, ApiError> {
        self.get_json_with_retry("restaurants").await
    }

    /// List all dish categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after bounded retries.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json_with_retry("categories").await
    }

    /// Fetch one restaurant with its full menu.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the restaurant does not exist.
    #[instrument(skip(self), fields(restaurant_id = %id))]
    pub async fn restaurant(&self, id: RestaurantId) -> Result<Restaurant, ApiError> {
        self.get_json_with_retry(&format!("restaurants/{id}")).await
    }

    // =========================================================================
    // Order Endpoints
    // =========================================================================

    /// Submit an order. Not idempotent - never retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects or fails the submission.
    #[instrument(skip(self, submission), fields(user_id = %submission.user_id))]
    pub async fn create_order(&self, submission: &OrderSubmission) -> Result<Order, ApiError> {
        self.post_json("orders", submission).await
    }

    /// Fetch the order history for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after bounded retries.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn order_history(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        self.get_json_with_retry(&format!("users/{user_id}/orders"))
            .await
    }
}

/// Pull the `detail` field out of a backend error body, falling back to a
/// truncated copy of the raw body.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |parsed| parsed.detail,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(base: &str) -> ClientConfig {
        ClientConfig {
            api_base_url: base.parse().unwrap(),
            state_dir: std::env::temp_dir(),
            request_timeout: Duration::from_secs(5),
            catalog_retries: 0,
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_extract_detail_from_backend_body() {
        assert_eq!(
            extract_detail(r#"{"detail": "Cart is empty"}"#),
            "Cart is empty"
        );
    }

    #[test]
    fn test_extract_detail_falls_back_to_raw_body() {
        assert_eq!(extract_detail("<html>bad gateway</html>"), "<html>bad gateway</html>");

        let long = "x".repeat(500);
        assert_eq!(extract_detail(&long).len(), 200);
    }

    #[test]
    fn test_is_transient() {
        assert!(ApiError::RateLimited(3).is_transient());
        assert!(
            ApiError::Status {
                status: 503,
                detail: String::new()
            }
            .is_transient()
        );
        assert!(
            !ApiError::Status {
                status: 400,
                detail: String::new()
            }
            .is_transient()
        );
        assert!(!ApiError::Unauthorized.is_transient());
    }

    #[test]
    fn test_token_lifecycle() {
        let api = ApiClient::new(&test_config("http://localhost:9/")).unwrap();
        assert!(!api.has_token());

        api.set_token(SecretString::from("tok"));
        assert!(api.has_token());

        api.clear_token();
        assert!(!api.has_token());
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: 502,
            detail: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 502): upstream down");
        assert_eq!(ApiError::NotFound("restaurant 9".to_string()).to_string(), "not found: restaurant 9");
    }
}
