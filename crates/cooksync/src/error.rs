//! Error taxonomy for the sync core

use thiserror::Error;

/// Message used when a failure carries no response text of its own
pub const GENERIC_CONNECTIVITY_MESSAGE: &str = "Can't connect to server";

/// Errors surfaced by the auth handshake, export requester, materializer,
/// and sync controller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or connectivity failure before any response was received
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a status above 400
    #[error("{message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Response body text, or the generic connectivity message
        message: String,
    },

    /// A single recipe file could not be written
    #[error("Error writing file {path}: {reason}")]
    Write { path: String, reason: String },

    /// The token endpoint failed while waiting for browser authorization
    #[error("authorization failed: {0}")]
    AuthFailed(String),

    /// The token endpoint never produced a token within the attempt ceiling
    #[error("authorization timed out after {attempts} attempts")]
    AuthTimedOut { attempts: u32 },

    /// The export payload could not be interpreted as a manifest
    #[error("malformed export manifest: {0}")]
    MalformedManifest(String),

    /// Sync state could not be durably written
    #[error("failed to persist sync state: {0}")]
    Persist(#[source] anyhow::Error),
}

impl SyncError {
    /// Build a service error from a response status and body text.
    ///
    /// An empty body falls back to [`GENERIC_CONNECTIVITY_MESSAGE`].
    pub fn service(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            GENERIC_CONNECTIVITY_MESSAGE.to_string()
        } else {
            body.to_string()
        };
        SyncError::Service { status, message }
    }

    /// Text shown to the user when this error ends a sync cycle.
    ///
    /// Transport failures have no response body, so they are reported with
    /// the generic connectivity message.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Transport(_) => GENERIC_CONNECTIVITY_MESSAGE.to_string(),
            SyncError::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
