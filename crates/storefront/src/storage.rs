//! Durable client-side key/value storage.
//!
//! The storefront keeps two entries: [`keys::CART`] (the serialized cart in
//! local mode) and [`keys::SESSION_ID`] (the anonymous session identifier).
//! Storage is allowed to fail; callers degrade to in-memory state.
//!
//! [`DurableStorage`] is synchronous. Async code reaches it through
//! [`blocking`], which runs the call on tokio's blocking thread pool.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Storage keys used by the storefront.
pub mod keys {
    /// Key for the serialized cart (local mode).
    pub const CART: &str = "cart";

    /// Key for the anonymous session identifier.
    pub const SESSION_ID: &str = "sessionId";
}

/// Errors raised by durable storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key cannot be mapped onto the backing medium.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Storage is blocked or otherwise unusable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key/value storage that survives restarts.
pub trait DurableStorage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the entry under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Run a storage call on the blocking thread pool.
///
/// # Errors
///
/// Returns the call's own error, or `StorageError::Unavailable` if the
/// blocking task panicked or was cancelled.
pub async fn blocking<T, F>(call: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| StorageError::Unavailable(format!("storage task failed: {e}")))?
}

// =============================================================================
// FileStorage
// =============================================================================

/// Storage with one file per key inside a directory.
///
/// Writes go to a temporary file that is renamed into place, so a crash never
/// leaves a half-written entry behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = self.dir.join(format!(".{key}.tmp"));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// Process-local storage. Contents vanish when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get(keys::CART).unwrap(), None);
        storage.set(keys::CART, "[]").unwrap();
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));

        storage.set(keys::CART, "[1]").unwrap();
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[1]"));

        storage.remove(keys::CART).unwrap();
        assert_eq!(storage.get(keys::CART).unwrap(), None);
        storage.remove(keys::CART).unwrap();
    }

    #[test]
    fn test_file_storage_survives_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path())
            .set(keys::SESSION_ID, "abc")
            .unwrap();
        let reopened = FileStorage::new(dir.path());
        assert_eq!(reopened.get(keys::SESSION_ID).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(storage.get(".hidden"), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_file_storage_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let storage = FileStorage::new(blocker.join("store"));
        assert!(matches!(storage.set(keys::CART, "[]"), Err(StorageError::Io(_))));
    }

    #[tokio::test]
    async fn test_blocking_runs_off_the_async_thread() {
        let caller = std::thread::current().id();
        let storage = Arc::new(MemoryStorage::new());

        let handle = Arc::clone(&storage);
        let ran_on = blocking(move || {
            handle.set(keys::CART, "[]")?;
            Ok(std::thread::current().id())
        })
        .await
        .unwrap();

        assert_ne!(ran_on, caller);
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_blocking_reports_panics_as_unavailable() {
        let result: Result<(), StorageError> = blocking(|| panic!("disk on fire")).await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
