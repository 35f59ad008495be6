//! Sync controller: the single entry point for sync cycles
//!
//! Owns the [`SyncState`] and drives one cycle at a time through
//! `Idle -> Syncing -> Idle`. Hosts read state through [`SyncController::snapshot`]
//! or [`SyncController::subscribe`] and change it only through the command
//! methods on this type.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use log::{debug, error, info, warn};

use super::export::{ExportOutcome, ExportRequester};
use super::materialize::{MaterializeReport, RecipeMaterializer};
use super::timing::should_auto_sync_on_startup;
use crate::api::Transport;
use crate::auth::{AuthHandshake, Browser, CredentialStore};
use crate::config::{Endpoints, ServiceConfig};
use crate::error::SyncError;
use crate::models::{DEFAULT_TARGET_DIR, SyncState};
use crate::notify::Notifier;
use crate::storage::{KeyValueStore, StateStore, Vault, normalize_path};

pub const NOTICE_IN_PROGRESS: &str = "Cooksync sync already in progress";
pub const NOTICE_UP_TO_DATE: &str = "Cooksync data is already up to date";
pub const NOTICE_COMPLETED: &str = "Cooksync: sync completed";
pub const NOTICE_CONNECTED: &str = "Connected to Cooksync";
pub const NOTICE_AUTH_FAILED: &str = "Authorization failed. Please try again";
pub const NOTICE_AUTH_TIMED_OUT: &str = "Authorization timed out. Please try again";

/// Where a sync request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// An explicit user command
    Command,
    /// The startup auto-sync
    Startup,
    /// A UI control that displays its own status; errors are returned
    /// to it instead of being shown as a notice
    Control,
}

/// How a call to [`SyncController::start_sync`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Another cycle was already running; nothing was started
    AlreadyInProgress,
    /// No token is stored; nothing was started
    NotAuthenticated,
    /// The service had nothing new
    UpToDate,
    /// A manifest was processed (individual writes may still have failed)
    Completed(SyncStats),
}

/// Statistics from a completed sync cycle
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncStats {
    /// Valid records in the manifest
    pub recipes_received: usize,
    /// Manifest entries dropped as malformed
    pub recipes_rejected: usize,
    /// Per-record outcomes
    pub report: MaterializeReport,
    /// Duration of the cycle
    pub duration_ms: u64,
}

impl SyncStats {
    pub fn recipes_written(&self) -> usize {
        self.report.written()
    }

    pub fn write_failures(&self) -> usize {
        self.report.failed()
    }
}

/// Host-provided collaborators the controller works through
pub struct Collaborators {
    pub transport: Box<dyn Transport>,
    pub vault: Box<dyn Vault>,
    /// Device-local storage for the client id
    pub local_store: Box<dyn KeyValueStore>,
    pub notifier: Box<dyn Notifier>,
    pub browser: Box<dyn Browser>,
}

/// Orchestrates authorization, export, and materialization
pub struct SyncController {
    config: ServiceConfig,
    endpoints: Endpoints,
    state: Mutex<SyncState>,
    store: Box<dyn StateStore>,
    credentials: CredentialStore,
    transport: Box<dyn Transport>,
    vault: Box<dyn Vault>,
    notifier: Box<dyn Notifier>,
    browser: Box<dyn Browser>,
    subscribers: Mutex<Vec<Sender<SyncState>>>,
}

impl SyncController {
    /// Load persisted state (or create the defaults on first startup).
    ///
    /// A stored `isSyncing` flag can only be left over from a run that
    /// stopped mid-cycle, so it is cleared and the cycle counted as failed.
    pub fn load(
        config: ServiceConfig,
        store: Box<dyn StateStore>,
        collaborators: Collaborators,
    ) -> Result<Self, SyncError> {
        let loaded = store.load().map_err(SyncError::Persist)?;
        let first_startup = loaded.is_none();
        let mut state = loaded.unwrap_or_default();

        let interrupted = state.is_syncing;
        if interrupted {
            warn!("Previous sync cycle was interrupted; marking it as failed");
            state.is_syncing = false;
            state.last_sync_failed = true;
        }

        if first_startup || interrupted {
            store.save(&state).map_err(SyncError::Persist)?;
        }

        Ok(Self {
            endpoints: config.endpoints(),
            config,
            state: Mutex::new(state),
            store,
            credentials: CredentialStore::new(collaborators.local_store),
            transport: collaborators.transport,
            vault: collaborators.vault,
            notifier: collaborators.notifier,
            browser: collaborators.browser,
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SyncState {
        self.lock_state().clone()
    }

    /// Receive a state snapshot after every persisted change
    pub fn subscribe(&self) -> Receiver<SyncState> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// The per-installation client id
    pub fn client_id(&self) -> Result<String, SyncError> {
        self.credentials.client_id().map_err(SyncError::Persist)
    }

    /// Run the startup auto-sync if it is enabled and due.
    ///
    /// Returns `Ok(None)` when no cycle was due.
    pub fn on_startup(&self) -> Result<Option<SyncOutcome>, SyncError> {
        let due = should_auto_sync_on_startup(&self.lock_state());
        if !due {
            debug!("Startup sync not due");
            return Ok(None);
        }
        self.start_sync(SyncTrigger::Startup).map(Some)
    }

    /// Start a sync cycle.
    ///
    /// A call while a cycle is in flight is rejected with a notice, and a
    /// call without a token does nothing. Every exit path clears `isSyncing`.
    pub fn start_sync(&self, trigger: SyncTrigger) -> Result<SyncOutcome, SyncError> {
        let (token, known_ids, target_dir) = {
            let mut state = self.lock_state();
            if state.is_syncing {
                drop(state);
                self.notifier.notify(NOTICE_IN_PROGRESS);
                return Ok(SyncOutcome::AlreadyInProgress);
            }
            if !state.is_authenticated() {
                debug!("Not connected; skipping sync");
                return Ok(SyncOutcome::NotAuthenticated);
            }

            state.is_syncing = true;
            if let Err(e) = self.store.save(&state) {
                state.is_syncing = false;
                error!("Failed to persist sync start: {:#}", e);
                return Err(SyncError::Persist(e));
            }
            (
                state.token.clone(),
                state.imported_recipe_ids.clone(),
                state.target_dir.clone(),
            )
        };
        self.publish();
        info!("Sync started ({:?})", trigger);

        let result = self.run_cycle(&token, &known_ids, &target_dir);
        self.finish_cycle(result.is_err());

        match &result {
            Ok(SyncOutcome::UpToDate) => self.notifier.notify(NOTICE_UP_TO_DATE),
            Ok(SyncOutcome::Completed(stats)) => {
                info!(
                    "Sync completed: {} written, {} failed, {} rejected in {}ms",
                    stats.recipes_written(),
                    stats.write_failures(),
                    stats.recipes_rejected,
                    stats.duration_ms
                );
                self.notifier.notify(NOTICE_COMPLETED);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Sync failed: {}", e);
                if trigger != SyncTrigger::Control {
                    self.notifier.notify(&e.user_message());
                }
            }
        }

        result
    }

    /// Export and materialize; the caller owns the `isSyncing` bookkeeping
    fn run_cycle(
        &self,
        token: &str,
        known_ids: &std::collections::BTreeSet<i64>,
        target_dir: &str,
    ) -> Result<SyncOutcome, SyncError> {
        let start = Instant::now();
        let headers = self
            .credentials
            .auth_headers(token)
            .map_err(SyncError::Persist)?;

        let manifest = match ExportRequester::new(self.transport.as_ref(), &self.endpoints)
            .request_export(&headers, known_ids)?
        {
            ExportOutcome::NoNewData => return Ok(SyncOutcome::UpToDate),
            ExportOutcome::Manifest(manifest) => manifest,
        };

        let materializer = RecipeMaterializer::new(self.vault.as_ref(), self.notifier.as_ref());
        let report = materializer.materialize(target_dir, &manifest.records, &mut |record, _| {
            self.commit_import(record.id)
        });

        Ok(SyncOutcome::Completed(SyncStats {
            recipes_received: manifest.len(),
            recipes_rejected: manifest.rejected,
            report,
            duration_ms: start.elapsed().as_millis() as u64,
        }))
    }

    /// Record a written recipe and persist right away, so a crash mid-batch
    /// loses at most the record in flight
    fn commit_import(&self, recipe_id: i64) {
        {
            let mut state = self.lock_state();
            state.record_import(recipe_id, Utc::now());
            if let Err(e) = self.store.save(&state) {
                error!("Failed to persist import of recipe {}: {:#}", recipe_id, e);
            }
        }
        self.publish();
    }

    fn finish_cycle(&self, failed: bool) {
        {
            let mut state = self.lock_state();
            state.is_syncing = false;
            state.last_sync_failed = failed;
            if let Err(e) = self.store.save(&state) {
                error!("Failed to persist end of sync cycle: {:#}", e);
            }
        }
        self.publish();
    }

    /// Obtain a token through the browser handshake and store it.
    ///
    /// Failures and timeouts are both surfaced as notices.
    pub fn connect(&self) -> Result<(), SyncError> {
        let client_id = self.client_id()?;
        let handshake =
            AuthHandshake::new(self.transport.as_ref(), self.browser.as_ref(), &self.config);

        match handshake.run(&client_id) {
            Ok(token) => {
                self.update(|state| state.token = token)?;
                self.notifier.notify(NOTICE_CONNECTED);
                Ok(())
            }
            Err(e) => {
                let notice = match e {
                    SyncError::AuthTimedOut { .. } => NOTICE_AUTH_TIMED_OUT,
                    _ => NOTICE_AUTH_FAILED,
                };
                self.notifier.notify(notice);
                Err(e)
            }
        }
    }

    /// Forget the stored token
    pub fn disconnect(&self) -> Result<(), SyncError> {
        self.update(|state| state.token.clear())?;
        info!("Disconnected from Cooksync");
        Ok(())
    }

    /// Change the base directory for new recipe files; empty restores the default
    pub fn update_target_dir(&self, dir: &str) -> Result<String, SyncError> {
        let dir = if dir.trim().is_empty() {
            DEFAULT_TARGET_DIR.to_string()
        } else {
            normalize_path(dir)
        };
        let state = self.update(|state| state.target_dir = dir)?;
        Ok(state.target_dir)
    }

    pub fn set_auto_sync_on_start(&self, enabled: bool) -> Result<(), SyncError> {
        self.update(|state| state.auto_sync_on_start = enabled)?;
        Ok(())
    }

    /// Open the recipe import customization page in the browser
    pub fn open_customize_page(&self) -> anyhow::Result<()> {
        self.browser.open(&self.endpoints.customize_page())
    }

    /// Apply a mutation, persist it, and notify subscribers
    fn update<F: FnOnce(&mut SyncState)>(&self, mutate: F) -> Result<SyncState, SyncError> {
        let snapshot = {
            let mut state = self.lock_state();
            mutate(&mut state);
            self.store.save(&state).map_err(SyncError::Persist)?;
            state.clone()
        };
        self.publish();
        Ok(snapshot)
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
