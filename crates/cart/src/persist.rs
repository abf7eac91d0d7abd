//! Local key-value persistence for the anonymous cart and the cross-tab
//! sentinel.
//!
//! The store is shared read/write across sibling tabs of the same origin
//! with no transactional guarantee: concurrent writers apply
//! last-write-wins. Two implementations ship here: [`MemoryStore`] for
//! tests and single-process use, and [`FileStore`] mapping each key to a
//! file under a state directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Serialized anonymous cart (the guest record).
    pub const GUEST_CART: &str = "guest_cart";
    /// Cross-tab sentinel. Only the fact that its value changed matters;
    /// the content (a timestamp) is irrelevant.
    pub const CART_SIGNAL: &str = "cart_signal";
}

/// Errors from the persistence layer.
///
/// The cart store swallows these with a warning; cart functionality
/// degrades gracefully to in-memory-only.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed (quota, permissions, disk).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains characters the backend cannot represent.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Local durable key-value storage, tab-shared, last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Read a key.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written (e.g., quota).
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// Sibling tabs share one backing store through an Arc.
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory store. Shared between "tabs" by cloning an `Arc<MemoryStore>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned mutex only occurs after a panic mid-write; the map
        // holds plain strings, so the previous value is still usable.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// File-backed store: one file per key under a state directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys become file names; restrict to a safe alphabet.
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::write(&path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
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

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));

        // Last write wins
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        // Removing an absent key is fine
        store.remove("k").unwrap();
    }

    #[test]
    fn test_arc_shares_one_backing_store() {
        let store = Arc::new(MemoryStore::new());
        let tab_a = Arc::clone(&store);
        let tab_b = Arc::clone(&store);

        tab_a.set(keys::GUEST_CART, "from-a").unwrap();
        assert_eq!(
            tab_b.get(keys::GUEST_CART).unwrap().as_deref(),
            Some("from-a")
        );
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("zella-store-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(&dir).unwrap();

        assert_eq!(store.get(keys::GUEST_CART).unwrap(), None);
        store.set(keys::GUEST_CART, "{\"items\":[]}").unwrap();
        assert_eq!(
            store.get(keys::GUEST_CART).unwrap().as_deref(),
            Some("{\"items\":[]}")
        );
        store.remove(keys::GUEST_CART).unwrap();
        assert_eq!(store.get(keys::GUEST_CART).unwrap(), None);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_store_rejects_unsafe_keys() {
        let dir = std::env::temp_dir().join(format!("zella-store-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(&dir).unwrap();

        assert!(matches!(
            store.get("../escape"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.set("", "v"), Err(StorageError::InvalidKey(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
