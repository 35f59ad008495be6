//! Host storage abstractions and implementations
//!
//! The sync core never touches the filesystem directly. It goes through
//! three traits:
//! - [`StateStore`] for the persisted sync state document
//! - [`KeyValueStore`] for device-local values such as the client id
//! - [`Vault`] for the document store recipes are written into
//!
//! File-backed implementations are used by the CLI; the in-memory ones
//! back tests and embedders that provide their own persistence.

mod files;
mod memory;
mod traits;
mod vault;

pub use files::{JsonKeyValueStore, JsonStateStore};
pub use memory::{InMemoryKeyValueStore, InMemoryStateStore, InMemoryVault};
pub use traits::{KeyValueStore, StateStore, Vault};
pub use vault::{FsVault, normalize_path, parent_dir};
