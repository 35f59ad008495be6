//! Storage trait definitions

use anyhow::Result;

use crate::models::SyncState;

/// Whole-document persistence for [`SyncState`]
pub trait StateStore: Send + Sync {
    /// Load the stored state, or `None` on first startup
    fn load(&self) -> Result<Option<SyncState>>;

    /// Durably replace the stored state
    fn save(&self, state: &SyncState) -> Result<()>;
}

/// Device-scoped key-value storage that is never synced between machines
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Virtual filesystem of the document store
///
/// Paths are vault-relative and use `/` as separator; implementations
/// normalize them with [`normalize_path`](super::normalize_path).
pub trait Vault: Send + Sync {
    /// Check whether a file or directory exists at `path`
    fn exists(&self, path: &str) -> Result<bool>;

    /// Create a directory, including missing parents
    fn create_dir(&self, path: &str) -> Result<()>;

    /// Create a new file with `content`; fails if `path` already exists
    fn create_file(&self, path: &str, content: &str) -> Result<()>;
}

impl<S: StateStore + ?Sized> StateStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<SyncState>> {
        (**self).load()
    }

    fn save(&self, state: &SyncState) -> Result<()> {
        (**self).save(state)
    }
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<V: Vault + ?Sized> Vault for std::sync::Arc<V> {
    fn exists(&self, path: &str) -> Result<bool> {
        (**self).exists(path)
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        (**self).create_dir(path)
    }

    fn create_file(&self, path: &str, content: &str) -> Result<()> {
        (**self).create_file(path, content)
    }
}
