//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DISHLY_API_URL` - Base URL of the backend API (e.g., <https://api.dishly.app>)
//!
//! ## Optional
//! - `DISHLY_STATE_DIR` - Directory for persisted cart/session state
//!   (default: `$HOME/.dishly`)
//! - `DISHLY_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `DISHLY_CATALOG_RETRIES` - Extra attempts for idempotent catalog reads
//!   (default: 2)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dishly client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API.
    pub api_base_url: Url,
    /// Directory holding persisted cart and session state.
    pub state_dir: PathBuf,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
    /// Extra attempts for idempotent catalog reads (0 disables retry).
    pub catalog_retries: u32,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("DISHLY_API_URL")?
            .parse::<Url>()
            .map_err(|e| ConfigError::InvalidEnvVar("DISHLY_API_URL".to_string(), e.to_string()))?;

        let state_dir = get_optional_env("DISHLY_STATE_DIR")
            .map_or_else(default_state_dir, PathBuf::from);

        let request_timeout = Duration::from_secs(
            get_env_or_default("DISHLY_REQUEST_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "DISHLY_REQUEST_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })?,
        );

        let catalog_retries = get_env_or_default("DISHLY_CATALOG_RETRIES", "2")
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("DISHLY_CATALOG_RETRIES".to_string(), e.to_string())
            })?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_base_url,
            state_dir,
            request_timeout,
            catalog_retries,
            sentry_dsn,
        })
    }
}

/// Default state directory: `$HOME/.dishly`, falling back to the working
/// directory when `HOME` is unset.
fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(|| PathBuf::from(".dishly"), |home| {
        PathBuf::from(home).join(".dishly")
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_dir_is_not_empty() {
        let dir = default_state_dir();
        assert!(dir.ends_with(".dishly"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("DISHLY_API_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: DISHLY_API_URL"
        );
    }
}
