//! Authentication endpoints.
//!
//! Authentication itself happens on the remote API; the client's only job is
//! to exchange credentials for a bearer token and hand it to the
//! [`TokenProvider`](crate::auth::TokenProvider).

use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use super::types::{AuthResponse, LoginRequest, RegisterRequest};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Log in with email and password, storing the returned credential.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials, or another
    /// `ApiError` if the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let url = self.endpoint("auth/login")?;
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: AuthResponse = self.send(self.request(Method::POST, url).json(&body)).await?;
        self.store_token(response.token);
        Ok(())
    }

    /// Register a new account and store the returned credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails (e.g. email already taken).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let url = self.endpoint("auth/register")?;
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: AuthResponse = self.send(self.request(Method::POST, url).json(&body)).await?;
        self.store_token(response.token);
        Ok(())
    }

    /// Log out: tell the API (best effort) and drop the local credential.
    ///
    /// The credential is cleared even when the remote call fails; a token the
    /// server never hears about again is equivalent to a revoked one from the
    /// client's point of view.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.tokens().is_signed_in() {
            let result = async {
                let url = self.endpoint("auth/logout")?;
                self.send_no_content(self.request(Method::POST, url)).await
            }
            .await;

            if let Err(e) = result {
                tracing::warn!(error = %e, "logout call failed; clearing credential anyway");
            }
        }

        self.tokens().clear();
    }

    fn store_token(&self, token: String) {
        if let Err(e) = self.tokens().set(SecretString::from(token)) {
            // In-memory credential is set regardless; only persistence failed
            tracing::warn!(error = %e, "failed to persist credential");
        }
    }
}
