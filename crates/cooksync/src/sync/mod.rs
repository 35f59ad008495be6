//! Sync engine for importing recipes into the vault
//!
//! One cycle requests an export of every recipe not yet imported and writes
//! each one as a new file. Cycles are safe to repeat: the request carries
//! the full set of imported ids.

mod controller;
mod export;
mod materialize;
mod timing;

pub use controller::{
    Collaborators, NOTICE_AUTH_FAILED, NOTICE_AUTH_TIMED_OUT, NOTICE_COMPLETED, NOTICE_CONNECTED,
    NOTICE_IN_PROGRESS, NOTICE_UP_TO_DATE, SyncController, SyncOutcome, SyncStats, SyncTrigger,
};
pub use export::{ExportOutcome, ExportRequester};
pub use materialize::{
    FALLBACK_TITLE, ILLEGAL_FILENAME_CHARS, MaterializeReport, RecipeMaterializer, RecordOutcome,
    sanitize_title, target_path,
};
pub use timing::{AUTO_SYNC_STALE_AFTER_SECS, cooldown_elapsed, should_auto_sync_on_startup};
