//! Auth token provider - supplies and invalidates the bearer credential.
//!
//! The credential indicates sign-in state: present means signed-in, absent
//! means guest. It is persisted in the [`LocalStore`] so sessions survive
//! restarts, and cached in memory for synchronous access.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};

use crate::store::{LocalStore, StoreError, keys};

/// Provider of the current bearer credential.
///
/// Cheaply cloneable; all clones share the same in-memory and on-disk state.
#[derive(Clone)]
pub struct TokenProvider {
    inner: Arc<TokenProviderInner>,
}

struct TokenProviderInner {
    store: LocalStore,
    current: RwLock<Option<SecretString>>,
}

impl TokenProvider {
    /// Create a provider backed by `store`, loading any persisted credential.
    ///
    /// A credential that cannot be read is treated as absent and logged.
    #[must_use]
    pub fn new(store: LocalStore) -> Self {
        let current = match store.get::<String>(keys::TOKEN) {
            Ok(token) => token.map(SecretString::from),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted credential");
                None
            }
        };

        Self {
            inner: Arc::new(TokenProviderInner {
                store,
                current: RwLock::new(current),
            }),
        }
    }

    /// Get the current credential, or `None` when signed out.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a credential is currently held.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.get().is_some()
    }

    /// Store a new credential (after a successful login).
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be persisted; the in-memory
    /// credential is set regardless, so the session works until restart.
    pub fn set(&self, token: SecretString) -> Result<(), StoreError> {
        let persisted = self
            .inner
            .store
            .put(keys::TOKEN, &token.expose_secret().to_string());
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        persisted
    }

    /// Invalidate the stored credential (logout, or a rejected token).
    pub fn clear(&self) {
        if let Err(e) = self.inner.store.remove(keys::TOKEN) {
            tracing::warn!(error = %e, "failed to remove persisted credential");
        }
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("signed_in", &self.is_signed_in())
            .finish_non_exhaustive()
    }
}
