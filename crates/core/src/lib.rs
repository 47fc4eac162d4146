//! Tavola Core - Shared types library.
//!
//! This crate provides common types used across all Tavola components:
//! - `client` - API client and cart reconciliation manager
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and money values

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
