//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TAVOLA_API_BASE_URL` - Base URL of the remote ordering API
//!
//! ## Optional
//! - `TAVOLA_DATA_DIR` - Directory for the local persistent store
//!   (default: `.tavola`)
//! - `TAVOLA_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".tavola";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote ordering API
    pub api_base_url: Url,
    /// Directory holding the local persistent store (guest cart, credential)
    pub data_dir: PathBuf,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
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

        let api_base_url = parse_base_url(
            "TAVOLA_API_BASE_URL",
            &get_required_env("TAVOLA_API_BASE_URL")?,
        )?;
        let data_dir =
            PathBuf::from(get_env_or_default("TAVOLA_DATA_DIR", DEFAULT_DATA_DIR));
        let timeout_secs = get_env_or_default(
            "TAVOLA_REQUEST_TIMEOUT_SECS",
            &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("TAVOLA_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_base_url,
            data_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build a configuration directly, without touching the environment.
    ///
    /// Used by tests and embedders that already know their endpoints.
    #[must_use]
    pub fn new(api_base_url: Url, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url,
            data_dir: data_dir.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and validate an API base URL.
///
/// A trailing slash is enforced so `Url::join` keeps the final path segment.
fn parse_base_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    };

    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_trailing_slash() {
        let url = parse_base_url("TEST_VAR", "https://api.example.com/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
        assert_eq!(url.join("cart").unwrap().path(), "/v1/cart");
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("TEST_VAR", "https://api.example.com/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let result = parse_base_url("TEST_VAR", "not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("TAVOLA_API_BASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: TAVOLA_API_BASE_URL"
        );
    }
}
