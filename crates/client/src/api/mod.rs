//! Remote ordering API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`, JSON bodies
//! - Bearer credential from the [`TokenProvider`] attached to every call
//!   when present
//! - Menu reads cached via `moka` (5 minute TTL); cart state never cached
//!
//! # Surfaces
//!
//! - cart: the cart CRUD endpoints (source of truth for signed-in users)
//! - menu: catalog browsing
//! - auth: login, registration, logout
//! - orders: checkout and order history

mod auth;
mod cache;
mod cart;
mod menu;
mod orders;
pub mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::auth::TokenProvider;
use crate::config::ClientConfig;

use cache::CacheValue;

const MENU_CACHE_CAPACITY: u64 = 1000;
const MENU_CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes
const ERROR_BODY_PREVIEW: usize = 200;

/// Errors that can occur when calling the remote ordering API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connectivity, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential missing or rejected (401/403).
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body for diagnostics.
        body: String,
    },

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint path could not be joined to the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the remote ordering API.
///
/// Cheaply cloneable; clones share the HTTP connection pool, the menu cache,
/// and the token provider.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    tokens: TokenProvider,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: TokenProvider) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(MENU_CACHE_CAPACITY)
            .time_to_live(MENU_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                tokens,
                cache,
            }),
        })
    }

    /// The token provider this client attaches credentials from.
    #[must_use]
    pub fn tokens(&self) -> &TokenProvider {
        &self.inner.tokens
    }

    pub(crate) fn cache(&self) -> &Cache<String, CacheValue> {
        &self.inner.cache
    }

    /// Resolve an endpoint path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Build a request with the bearer credential attached when present.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match self.inner.tokens.get() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and parse a JSON response body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        check_status(status, &response)?;

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request that returns no content on success (e.g. DELETE).
    pub(crate) async fn send_no_content(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        check_status(status, &response)?;

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        Ok(())
    }
}

/// Map the statuses that carry meaning beyond their body.
fn check_status(status: StatusCode, response: &reqwest::Response) -> Result<(), ApiError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ApiError::RateLimited(retry_after));
    }

    Ok(())
}

/// Build an error for a non-success status that reached the body stage.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound(body.chars().take(ERROR_BODY_PREVIEW).collect());
    }

    ApiError::Status {
        status: status.as_u16(),
        body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("cart item 9".to_string());
        assert_eq!(err.to_string(), "Not found: cart item 9");

        let err = ApiError::Unauthorized;
        assert_eq!(err.to_string(), "Unauthorized");
    }

    #[test]
    fn test_status_error_truncates_body() {
        let long_body = "x".repeat(1000);
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, &long_body);
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), ERROR_BODY_PREVIEW);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_status_error_maps_not_found() {
        let err = status_error(StatusCode::NOT_FOUND, "no such item");
        assert!(matches!(err, ApiError::NotFound(msg) if msg == "no such item"));
    }

    #[test]
    fn test_rate_limited_display() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
