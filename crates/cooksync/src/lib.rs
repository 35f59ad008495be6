//! Cooksync crate - one-way recipe sync into a notes vault
//!
//! This crate provides the host-independent sync core:
//! - Client identity and the browser authorization handshake
//! - Export requests against the Cooksync service
//! - Collision-safe materialization of recipes as markdown files
//! - The sync controller with its persisted state
//!
//! Hosts supply the HTTP transport, vault, storage, notices, and browser
//! through the traits in [`api`], [`storage`], [`notify`], and [`auth`].

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod storage;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiRequest, ApiResponse, Method, Transport, UreqTransport};
pub use auth::{AuthHandshake, AuthHeaders, Browser, CredentialStore, SystemBrowser};
pub use config::{Endpoints, ServiceConfig};
pub use error::SyncError;
pub use models::{DEFAULT_TARGET_DIR, ExportManifest, RecipeRecord, SyncState};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use storage::{
    FsVault, InMemoryKeyValueStore, InMemoryStateStore, InMemoryVault, JsonKeyValueStore,
    JsonStateStore, KeyValueStore, StateStore, Vault,
};
pub use sync::{
    Collaborators, MaterializeReport, RecordOutcome, SyncController, SyncOutcome, SyncStats,
    SyncTrigger, should_auto_sync_on_startup,
};
