//! In-memory storage implementations
//!
//! Used by tests and by embedders that keep state elsewhere.

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::vault::{normalize_path, parent_dir};
use super::{KeyValueStore, StateStore, Vault};
use crate::models::SyncState;

/// In-memory [`StateStore`] that counts saves
#[derive(Default)]
pub struct InMemoryStateStore {
    state: RwLock<Option<SyncState>>,
    saves: AtomicUsize,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted state
    pub fn with_state(state: SyncState) -> Self {
        Self {
            state: RwLock::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Most recently saved state
    pub fn saved(&self) -> Option<SyncState> {
        self.state.read().unwrap().clone()
    }

    /// Number of times `save` has been called
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl StateStore for InMemoryStateStore {
    fn load(&self) -> Result<Option<SyncState>> {
        Ok(self.state.read().unwrap().clone())
    }

    fn save(&self, state: &SyncState) -> Result<()> {
        *self.state.write().unwrap() = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory [`KeyValueStore`]
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// In-memory [`Vault`] with filesystem-like rules: files need an existing
/// parent directory and are never overwritten.
#[derive(Default)]
pub struct InMemoryVault {
    files: RwLock<BTreeMap<String, String>>,
    dirs: RwLock<BTreeSet<String>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of the file at `path`, if any
    pub fn read(&self, path: &str) -> Option<String> {
        self.files.read().unwrap().get(&normalize_path(path)).cloned()
    }

    /// All file paths, sorted
    pub fn file_paths(&self) -> Vec<String> {
        self.files.read().unwrap().keys().cloned().collect()
    }
}

impl Vault for InMemoryVault {
    fn exists(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path);
        Ok(path == "/"
            || self.files.read().unwrap().contains_key(&path)
            || self.dirs.read().unwrap().contains(&path))
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        if self.files.read().unwrap().contains_key(&path) {
            anyhow::bail!("A file already exists at {}", path);
        }

        let mut dirs = self.dirs.write().unwrap();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            dirs.insert(current.clone());
        }
        Ok(())
    }

    fn create_file(&self, path: &str, content: &str) -> Result<()> {
        let path = normalize_path(path);
        if let Some(parent) = parent_dir(&path)
            && !self.dirs.read().unwrap().contains(parent)
        {
            anyhow::bail!("Parent directory does not exist: {}", parent);
        }

        let mut files = self.files.write().unwrap();
        if files.contains_key(&path) || self.dirs.read().unwrap().contains(&path) {
            anyhow::bail!("File already exists: {}", path);
        }
        files.insert(path, content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_store_counts_saves() {
        let store = InMemoryStateStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&SyncState::default()).unwrap();
        store.save(&SyncState::default()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert!(store.saved().is_some());
    }

    #[test]
    fn test_vault_requires_parent_dir() {
        let vault = InMemoryVault::new();
        assert!(vault.create_file("Cooksync/Soup.md", "x").is_err());

        vault.create_dir("Cooksync").unwrap();
        vault.create_file("Cooksync/Soup.md", "x").unwrap();
        assert_eq!(vault.read("Cooksync/Soup.md").as_deref(), Some("x"));
    }

    #[test]
    fn test_vault_never_overwrites() {
        let vault = InMemoryVault::new();
        vault.create_file("Soup.md", "first").unwrap();
        assert!(vault.create_file("/Soup.md", "second").is_err());
        assert_eq!(vault.read("Soup.md").as_deref(), Some("first"));
    }

    #[test]
    fn test_vault_nested_dirs() {
        let vault = InMemoryVault::new();
        vault.create_dir("Recipes/Cooksync").unwrap();
        assert!(vault.exists("Recipes").unwrap());
        assert!(vault.exists("Recipes/Cooksync").unwrap());
        assert!(!vault.exists("Cooksync").unwrap());
    }

    #[test]
    fn test_key_value_store() {
        let store = InMemoryKeyValueStore::new();
        assert!(store.get("k").unwrap().is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
