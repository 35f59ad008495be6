//! Recipe records and export manifests

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SyncError;

/// A single recipe as returned by the export endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub id: i64,
    pub title: String,
    /// Markdown body, written to disk verbatim
    pub content: String,
}

impl RecipeRecord {
    pub fn new(id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Ordered batch of recipes returned by one export request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportManifest {
    pub latest_id: Option<i64>,
    pub status: Option<String>,
    pub records: Vec<RecipeRecord>,
    /// Entries dropped because they did not have the record shape
    pub rejected: usize,
}

/// Export payloads arrive either as a bare array of records or as an
/// object carrying `latest_id`/`status` next to the records.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExportPayload {
    Records(Vec<Value>),
    Envelope(ExportEnvelope),
}

#[derive(Deserialize)]
struct ExportEnvelope {
    latest_id: Option<i64>,
    status: Option<String>,
    #[serde(default, alias = "recipes", alias = "data")]
    records: Vec<Value>,
}

impl ExportManifest {
    /// Parse an export response body.
    ///
    /// Returns `Ok(None)` when the body carries no new data: empty, `null`,
    /// or a payload without any entries.
    pub fn from_json(body: &str) -> Result<Option<Self>, SyncError> {
        let body = body.trim();
        if body.is_empty() || body == "null" {
            return Ok(None);
        }

        let payload: ExportPayload = serde_json::from_str(body)
            .map_err(|e| SyncError::MalformedManifest(e.to_string()))?;

        let (latest_id, status, entries) = match payload {
            ExportPayload::Records(entries) => (None, None, entries),
            ExportPayload::Envelope(envelope) => {
                (envelope.latest_id, envelope.status, envelope.records)
            }
        };

        if entries.is_empty() {
            return Ok(None);
        }

        let mut manifest = ExportManifest {
            latest_id,
            status,
            ..Default::default()
        };

        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<RecipeRecord>(entry) {
                Ok(record) => manifest.records.push(record),
                Err(e) => {
                    warn!("Rejecting malformed manifest entry {}: {}", index, e);
                    manifest.rejected += 1;
                }
            }
        }

        Ok(Some(manifest))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
