//! Startup auto-sync timing
//!
//! Pure functions that can be tested without any host collaborators.

use chrono::{DateTime, Utc};

use crate::models::SyncState;

/// Age after which the last sync is considered stale on startup (2 hours)
pub const AUTO_SYNC_STALE_AFTER_SECS: u64 = 2 * 60 * 60;

/// Check if enough time has elapsed since the last sync to allow a new sync.
///
/// # Arguments
/// * `last_sync_at` - When the last successful write happened (None if never synced)
/// * `cooldown_secs` - Minimum seconds that must elapse between syncs
///
/// # Returns
/// `true` if enough time has passed (or never synced), `false` if still in cooldown
pub fn cooldown_elapsed(last_sync_at: Option<DateTime<Utc>>, cooldown_secs: u64) -> bool {
    match last_sync_at {
        Some(last) => {
            let elapsed = Utc::now() - last;
            elapsed.num_seconds() >= cooldown_secs as i64
        }
        None => true,
    }
}

/// Whether a sync cycle should be started automatically on startup
///
/// Requires `auto_sync_on_start` and a last sync that is missing or older
/// than [`AUTO_SYNC_STALE_AFTER_SECS`].
pub fn should_auto_sync_on_startup(state: &SyncState) -> bool {
    state.auto_sync_on_start
        && cooldown_elapsed(state.last_sync_time, AUTO_SYNC_STALE_AFTER_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cooldown_elapsed_never_synced() {
        assert!(cooldown_elapsed(None, 30));
        assert!(cooldown_elapsed(None, 0));
    }

    #[test]
    fn test_cooldown_elapsed_recent_sync() {
        let last_sync = Utc::now() - Duration::seconds(10);
        assert!(!cooldown_elapsed(Some(last_sync), 30));
    }

    #[test]
    fn test_cooldown_elapsed_old_sync() {
        let last_sync = Utc::now() - Duration::seconds(60);
        assert!(cooldown_elapsed(Some(last_sync), 30));
    }

    #[test]
    fn test_auto_sync_never_synced() {
        assert!(should_auto_sync_on_startup(&SyncState::default()));
    }

    #[test]
    fn test_auto_sync_disabled() {
        let state = SyncState {
            auto_sync_on_start: false,
            ..SyncState::default()
        };
        assert!(!should_auto_sync_on_startup(&state));
    }

    #[test]
    fn test_auto_sync_recent_sync_skipped() {
        let state = SyncState {
            last_sync_time: Some(Utc::now() - Duration::minutes(90)),
            ..SyncState::default()
        };
        assert!(!should_auto_sync_on_startup(&state));
    }

    #[test]
    fn test_auto_sync_stale_sync() {
        let state = SyncState {
            last_sync_time: Some(Utc::now() - Duration::hours(3)),
            ..SyncState::default()
        };
        assert!(should_auto_sync_on_startup(&state));
    }
}
