//! Tavola client - typed access to the restaurant ordering API.
//!
//! # Architecture
//!
//! - The remote REST API is the source of truth for signed-in users - no
//!   local sync, direct API calls
//! - Guest cart state is persisted in a local JSON store and migrated to the
//!   remote cart once on login
//! - Menu reads are cached in-memory via `moka` (5 minute TTL); cart state is
//!   never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use tavola_client::{ApiClient, CartManager, ClientConfig, LocalStore, TokenProvider};
//!
//! let config = ClientConfig::from_env()?;
//! let store = LocalStore::open(&config.data_dir)?;
//! let tokens = TokenProvider::new(store.clone());
//! let api = ApiClient::new(&config, tokens.clone())?;
//!
//! // Runs the init protocol: guest load, or merge-then-fetch when signed in
//! let mut cart = CartManager::initialize(api.clone(), store, tokens).await;
//!
//! let product = api.get_menu_item(ProductId::new(5)).await?;
//! cart.add_item(&product, 2).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;
pub mod store;

pub use api::{ApiClient, ApiError};
pub use auth::TokenProvider;
pub use cart::CartManager;
pub use config::{ClientConfig, ConfigError};
pub use store::{LocalStore, StoreError};
