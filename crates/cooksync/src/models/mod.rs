//! Domain models for sync state and recipe exports

mod recipe;
mod sync_state;

pub use recipe::{ExportManifest, RecipeRecord};
pub use sync_state::{DEFAULT_TARGET_DIR, SyncState};
