//! Durable key-value persistence for cart and session state.
//!
//! State survives restarts the way the original browser client survived
//! reloads: whole-value JSON documents under a state directory, one file
//! per key. Writes go through a temp file and an atomic rename, so a
//! concurrent reader always sees either the previous or the new document,
//! never a torn one. Reconciliation between concurrent writers is
//! last-writer-wins at the file level.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::cart::Cart;
use crate::session::Session;

const SESSION_FILE: &str = "session.json";
const CART_FILE: &str = "cart.json";

/// Errors raised by the state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("state store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted document could not be decoded.
    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        /// The offending file.
        path: PathBuf,
        /// Decode failure.
        source: serde_json::Error,
    },

    /// A document could not be encoded.
    #[error("state encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed store for client state.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Load the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a corrupt document.
    pub fn load_session(&self) -> Result<Option<Session>, StoreError> {
        self.load(SESSION_FILE)
    }

    /// Persist the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn save_session(&self, session: &Session) -> Result<(), StoreError> {
        self.save(SESSION_FILE, session)
    }

    /// Remove the persisted session entirely.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn clear_session(&self) -> Result<(), StoreError> {
        self.remove(SESSION_FILE)
    }

    /// Load the persisted cart, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or a corrupt document.
    pub fn load_cart(&self) -> Result<Option<Cart>, StoreError> {
        self.load(CART_FILE)
    }

    /// Persist the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        self.save(CART_FILE, cart)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { path, source })?;
        Ok(Some(value))
    }

    fn save<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path(file);
        let body = serde_json::to_vec_pretty(value)?;

        // Atomic replace: a crash mid-write leaves the old document intact.
        let tmp = self.dir.join(format!("{file}.tmp"));
        {
            let mut out = fs::File::create(&tmp)?;
            out.write_all(&body)?;
            out.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), "state persisted");
        Ok(())
    }

    fn remove(&self, file: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(file)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::Dish;
    use dishly_core::{DishId, Price, RestaurantId};

    fn temp_store() -> StateStore {
        let dir = std::env::temp_dir().join(format!("dishly-store-{}", uuid::Uuid::new_v4()));
        StateStore::open(dir).unwrap()
    }

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(
            Dish {
                id: DishId::new(1),
                restaurant_id: RestaurantId::new(2),
                name: "Pad Thai".to_string(),
                description: String::new(),
                price: Price::from_minor_units(1150).unwrap(),
                category: None,
                is_available: true,
            },
            2,
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_load_missing_files_returns_none() {
        let store = temp_store();
        assert!(store.load_cart().unwrap().is_none());
        assert!(store.load_session().unwrap().is_none());
    }

    #[test]
    fn test_cart_roundtrip() {
        let store = temp_store();
        let cart = sample_cart();

        store.save_cart(&cart).unwrap();
        let restored = store.load_cart().unwrap().unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_save_overwrites_previous_document() {
        let store = temp_store();
        store.save_cart(&sample_cart()).unwrap();
        store.save_cart(&Cart::new()).unwrap();

        let restored = store.load_cart().unwrap().unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let store = temp_store();
        store.clear_session().unwrap();
        store.clear_session().unwrap();
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let store = temp_store();
        fs::write(store.path(CART_FILE), b"{not json").unwrap();

        let err = store.load_cart().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
