//! Local persistent store - the durable key-value storage for guest state.
//!
//! One key maps to one JSON file under the configured data directory. Values
//! are read and overwritten wholesale; there is no partial update. Access is
//! synchronous: a full-list write always follows the network response it
//! reflects, never precedes it.
//!
//! This is the client-side analogue of browser local storage: a persistence
//! cache of API responses, not an offline-capable store.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Well-known store keys.
pub mod keys {
    /// The guest cart: a JSON array of cart line items.
    pub const CART: &str = "cart";
    /// The persisted bearer credential.
    pub const TOKEN: &str = "token";
}

/// Errors from the local persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// File-backed key-value store holding JSON documents.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the value stored under `key` wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized or written.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let contents = serde_json::to_string(value)?;
        fs::write(self.path_for(key), contents)?;
        Ok(())
    }

    /// Delete the entry for `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}
