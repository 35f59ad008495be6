//! Persisted sync state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Folder recipes are written to when the user has not chosen one
pub const DEFAULT_TARGET_DIR: &str = "Cooksync";

/// Process-wide sync state, persisted as a single JSON document.
///
/// Keys match the data file of the Cooksync Obsidian plugin so an existing
/// data file can be read as-is. Missing keys take their defaults, which is
/// how fields added later get populated when an older file is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncState {
    /// Bearer credential; empty means unauthenticated
    pub token: String,
    /// Vault-relative base directory for materialized recipes
    #[serde(rename = "cooksyncDir")]
    pub target_dir: String,
    /// True only while a sync cycle is in flight
    #[serde(rename = "isSyncing")]
    pub is_syncing: bool,
    /// Whether a cycle is triggered on startup
    #[serde(rename = "triggerOnLoad")]
    pub auto_sync_on_start: bool,
    /// Sticky flag set when the most recent cycle ended in error
    #[serde(rename = "lastSyncFailed")]
    pub last_sync_failed: bool,
    /// Time of the most recent successful recipe write
    #[serde(
        rename = "lastSyncTime",
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Recipe ids that already have a file in the vault
    #[serde(rename = "recipeIDs")]
    pub imported_recipe_ids: BTreeSet<i64>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            token: String::new(),
            target_dir: DEFAULT_TARGET_DIR.to_string(),
            is_syncing: false,
            auto_sync_on_start: true,
            last_sync_failed: false,
            last_sync_time: None,
            imported_recipe_ids: BTreeSet::new(),
        }
    }
}

impl SyncState {
    /// Whether a bearer token is present
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// Record a durably written recipe.
    ///
    /// The id set only grows and `last_sync_time` never moves backwards.
    pub fn record_import(&mut self, recipe_id: i64, written_at: DateTime<Utc>) {
        self.imported_recipe_ids.insert(recipe_id);
        self.advance_last_sync_time(written_at);
    }

    /// Move `last_sync_time` forward to `at`, ignoring earlier instants
    pub fn advance_last_sync_time(&mut self, at: DateTime<Utc>) {
        if self.last_sync_time.is_none_or(|current| at > current) {
            self.last_sync_time = Some(at);
        }
    }

    /// Whether `recipe_id` has already been materialized
    pub fn has_imported(&self, recipe_id: i64) -> bool {
        self.imported_recipe_ids.contains(&recipe_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_defaults() {
        let state = SyncState::default();
        assert!(!state.is_authenticated());
        assert_eq!(state.target_dir, "Cooksync");
        assert!(state.auto_sync_on_start);
        assert!(!state.is_syncing);
        assert!(state.last_sync_time.is_none());
        assert!(state.imported_recipe_ids.is_empty());
    }

    #[test]
    fn test_stored_values_merge_over_defaults() {
        let json = r#"{ "token": "t0k3n", "recipeIDs": [3, 1, 3] }"#;
        let state: SyncState = serde_json::from_str(json).unwrap();

        assert_eq!(state.token, "t0k3n");
        assert_eq!(state.target_dir, DEFAULT_TARGET_DIR);
        assert!(state.auto_sync_on_start);
        assert_eq!(state.imported_recipe_ids.len(), 2);
        assert!(state.has_imported(1));
        assert!(state.has_imported(3));
    }

    #[test]
    fn test_reads_plugin_data_file() {
        let json = r#"{
            "token": "abc",
            "cooksyncDir": "Recipes/Cooksync",
            "isSyncing": false,
            "triggerOnLoad": false,
            "lastSyncFailed": true,
            "lastSyncTime": 1700000000000,
            "recipeIDs": [7, 8],
            "someFutureKey": 42
        }"#;
        let state: SyncState = serde_json::from_str(json).unwrap();

        assert_eq!(state.target_dir, "Recipes/Cooksync");
        assert!(!state.auto_sync_on_start);
        assert!(state.last_sync_failed);
        assert_eq!(
            state.last_sync_time.unwrap().timestamp_millis(),
            1_700_000_000_000
        );
        assert_eq!(state.imported_recipe_ids.iter().copied().collect::<Vec<_>>(), vec![7, 8]);
    }

    #[test]
    fn test_serialization_uses_plugin_keys() {
        let mut state = SyncState::default();
        state.record_import(5, Utc::now());
        let value = serde_json::to_value(&state).unwrap();

        assert!(value.get("cooksyncDir").is_some());
        assert!(value.get("recipeIDs").is_some());
        assert!(value.get("lastSyncTime").unwrap().is_i64());

        let back: SyncState = serde_json::from_value(value).unwrap();
        assert!(back.has_imported(5));
    }

    #[test]
    fn test_last_sync_time_only_moves_forward() {
        let mut state = SyncState::default();
        let now = Utc::now();

        state.advance_last_sync_time(now);
        state.advance_last_sync_time(now - Duration::hours(1));
        assert_eq!(state.last_sync_time, Some(now));

        let later = now + Duration::seconds(5);
        state.record_import(1, later);
        assert_eq!(state.last_sync_time, Some(later));
    }
}
