//! Export requests against the Cooksync service

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::api::wire::ExportRequestBody;
use crate::api::{ApiRequest, Transport};
use crate::auth::AuthHeaders;
use crate::config::{EXPORT_TARGET, Endpoints};
use crate::error::SyncError;
use crate::models::ExportManifest;

/// Result of a successful export request
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// New recipes to materialize
    Manifest(ExportManifest),
    /// Everything is already imported
    NoNewData,
}

/// Asks the service for recipes that are not yet imported
///
/// The request carries the full set of imported ids rather than a time
/// cursor, so repeating it is harmless and independent of the local clock.
/// There are no retries here; failures go back to the sync controller.
pub struct ExportRequester<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
}

impl<'a> ExportRequester<'a> {
    pub fn new(transport: &'a dyn Transport, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn request_export(
        &self,
        headers: &AuthHeaders,
        known_imported_ids: &BTreeSet<i64>,
    ) -> Result<ExportOutcome, SyncError> {
        let body = ExportRequestBody {
            export_target: EXPORT_TARGET,
            recipe_ids: known_imported_ids.iter().copied().collect(),
        };
        let request = headers.apply(ApiRequest::post_json(self.endpoints.export(), &body)?);

        let response = self.transport.send(&request).inspect_err(|e| {
            warn!("Export request failed: {}", e);
        })?;

        if !response.is_success() {
            warn!("Export request returned status {}", response.status);
            return Err(SyncError::service(response.status, &response.body));
        }

        match ExportManifest::from_json(&response.body)? {
            Some(manifest) => {
                debug!(
                    "Export returned {} recipe(s), {} rejected",
                    manifest.len(),
                    manifest.rejected
                );
                Ok(ExportOutcome::Manifest(manifest))
            }
            None => Ok(ExportOutcome::NoNewData),
        }
    }
}
