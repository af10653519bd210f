//! Persistent key-value storage for the session token

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous key-value storage, the shape of browser `localStorage`
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{KeyValueStorage, StorageError};
    use std::collections::BTreeMap;
    use std::fs::{File, OpenOptions};
    use std::io::Write;
    use std::path::{Path, PathBuf};

    /// Storage backed by a JSON object on disk
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
            match std::fs::read_to_string(&self.path) {
                Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
                Ok(content) => Ok(serde_json::from_str(&content)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(e.into()),
            }
        }

        fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            // Write-then-rename so readers never see a half written file
            let tmp = self.path.with_extension("tmp");
            let mut file = create_private(&tmp)?;
            file.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
            file.sync_all()?;
            drop(file);
            std::fs::rename(&tmp, &self.path)?;
            Ok(())
        }
    }

    /// Create `path` fresh, readable by the owner only on unix
    fn create_private(path: &Path) -> std::io::Result<File> {
        // The mode only applies on creation, so never reuse a leftover file
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options.open(path)
    }

    impl KeyValueStorage for FileStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.load()?.remove(key))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let mut entries = self.load()?;
            entries.insert(key.to_string(), value.to_string());
            self.save(&entries)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            let mut entries = self.load()?;
            if entries.remove(key).is_some() {
                self.save(&entries)?;
            }
            Ok(())
        }
    }
}

#[cfg(all(target_arch = "wasm32", feature = "browser"))]
pub use browser::BrowserStorage;

#[cfg(all(target_arch = "wasm32", feature = "browser"))]
mod browser {
    use super::{KeyValueStorage, StorageError};
    use web_sys::Storage;

    /// `window.localStorage`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BrowserStorage;

    fn local_storage() -> Result<Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".into()))
    }

    fn js_error(err: wasm_bindgen::JsValue) -> StorageError {
        StorageError::Unavailable(format!("{err:?}"))
    }

    impl KeyValueStorage for BrowserStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            local_storage()?.get_item(key).map_err(js_error)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            local_storage()?.set_item(key, value).map_err(js_error)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            local_storage()?.remove_item(key).map_err(js_error)
        }
    }
}

/// The single persisted-token slot.
///
/// Without a storage capability every operation is a no-op and reads
/// return `None`. Storage failures are logged and otherwise ignored.
#[derive(Clone)]
pub struct TokenStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
    key: String,
}

impl TokenStore {
    pub fn new(storage: Option<Arc<dyn KeyValueStorage>>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Currently persisted token, if any
    pub fn get(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(&self.key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(key = %self.key, "Failed to read token from storage: {e}");
                None
            }
        }
    }

    /// Replace the persisted token
    pub fn set(&self, token: &str) {
        if let Some(storage) = &self.storage
            && let Err(e) = storage.set(&self.key, token)
        {
            warn!(key = %self.key, "Failed to persist token: {e}");
        }
    }

    pub fn clear(&self) {
        if let Some(storage) = &self.storage
            && let Err(e) = storage.remove(&self.key)
        {
            warn!(key = %self.key, "Failed to clear token: {e}");
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("has_storage", &self.storage.is_some())
            .finish()
    }
}
