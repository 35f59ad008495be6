//! Cooksync HTTP API plumbing
//!
//! This module provides:
//! - The [`Transport`] seam used by the auth handshake and export requester
//! - A blocking `ureq` implementation of it
//! - Wire types for request and response bodies

mod transport;

pub use transport::{ApiRequest, ApiResponse, Method, Transport, UreqTransport};

/// Cooksync API wire types
pub mod wire {
    use serde::{Deserialize, Serialize};

    /// Body of the export request
    ///
    /// `recipe_ids` carries the ids already imported so the service can
    /// compute which recipes are new.
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExportRequestBody<'a> {
        pub export_target: &'a str,
        pub recipe_ids: Vec<i64>,
    }

    /// Response from the token endpoint; `token` is absent while the user
    /// has not finished authorizing in the browser
    #[derive(Debug, Default, Deserialize)]
    pub struct TokenResponse {
        #[serde(default)]
        pub token: Option<String>,
    }
}
