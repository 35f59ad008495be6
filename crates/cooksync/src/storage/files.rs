//! JSON file-backed state and key-value stores

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::{KeyValueStore, StateStore};
use crate::models::SyncState;

/// Sync state document stored as a JSON file
///
/// Stored keys are merged over [`SyncState::default`] on load, so files
/// written by older versions keep working.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// State file in the Cooksync config directory (~/.config/cooksync/state.json)
    pub fn default_location() -> Result<Self> {
        let path = config::config_path("state.json").context("Could not determine config directory")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<Option<SyncState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        config::load_json_file(&self.path).map(Some)
    }

    fn save(&self, state: &SyncState) -> Result<()> {
        config::save_json_file(&self.path, state)
    }
}

/// Device-local key-value pairs stored as a flat JSON object
pub struct JsonKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store in the local data directory (~/.local/share/cooksync/local.json on Linux)
    pub fn default_location() -> Result<Self> {
        let path = config::local_data_path("local.json")
            .context("Could not determine local data directory")?;
        Ok(Self::new(path))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        config::load_json_file(&self.path)
    }
}

impl KeyValueStore for JsonKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        config::save_json_file(&self.path, &values)
    }
}
