//! CLI command implementations.

pub mod account;
pub mod cart;
pub mod menu;
pub mod orders;

use tavola_client::{ApiClient, CartManager, ClientConfig, LocalStore, TokenProvider};

/// Shared handles every command needs.
pub struct Context {
    pub api: ApiClient,
    pub store: LocalStore,
    pub tokens: TokenProvider,
}

impl Context {
    /// Build the client stack from environment configuration.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = ClientConfig::from_env()?;
        let store = LocalStore::open(&config.data_dir)?;
        let tokens = TokenProvider::new(store.clone());
        let api = ApiClient::new(&config, tokens.clone())?;
        Ok(Self { api, store, tokens })
    }

    /// Run the cart initialization protocol (guest load or login merge).
    pub async fn cart(&self) -> CartManager {
        CartManager::initialize(self.api.clone(), self.store.clone(), self.tokens.clone()).await
    }
}
