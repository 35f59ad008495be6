//! Client identity and bearer headers

use std::sync::OnceLock;

use anyhow::Result;
use log::info;
use rand::Rng;
use rand::distr::Alphanumeric;

use crate::api::ApiRequest;
use crate::storage::KeyValueStore;

/// Local store key holding the client id
pub const CLIENT_ID_KEY: &str = "cooksync-ObsidianClientId";

/// Length of a generated client id
pub const CLIENT_ID_LEN: usize = 13;

/// Header carrying the client id on authenticated requests
pub const CLIENT_ID_HEADER: &str = "Client-Id";

/// Generate a lowercase alphanumeric client id
pub fn generate_client_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CLIENT_ID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Owns the per-installation client id
///
/// The id is generated once, written to device-local storage, and cached
/// for the rest of the session.
pub struct CredentialStore {
    local: Box<dyn KeyValueStore>,
    cached: OnceLock<String>,
}

impl CredentialStore {
    pub fn new(local: Box<dyn KeyValueStore>) -> Self {
        Self {
            local,
            cached: OnceLock::new(),
        }
    }

    /// Return the client id, generating and persisting one on first use
    pub fn client_id(&self) -> Result<String> {
        if let Some(id) = self.cached.get() {
            return Ok(id.clone());
        }

        let id = match self.local.get(CLIENT_ID_KEY)? {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = generate_client_id();
                self.local.set(CLIENT_ID_KEY, &id)?;
                info!("Generated new client id");
                id
            }
        };

        Ok(self.cached.get_or_init(|| id).clone())
    }

    /// Headers for an authenticated request with `token`
    pub fn auth_headers(&self, token: &str) -> Result<AuthHeaders> {
        Ok(AuthHeaders::new(token, self.client_id()?))
    }
}

/// Bearer token and client id headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub authorization: String,
    pub client_id: String,
}

impl AuthHeaders {
    pub fn new(token: &str, client_id: impl Into<String>) -> Self {
        Self {
            authorization: format!("Bearer {}", token),
            client_id: client_id.into(),
        }
    }

    /// Header name/value pairs
    pub fn pairs(&self) -> [(&'static str, &str); 2] {
        [
            ("Authorization", self.authorization.as_str()),
            (CLIENT_ID_HEADER, self.client_id.as_str()),
        ]
    }

    /// Attach the headers to a request
    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        self.pairs()
            .into_iter()
            .fold(request, |req, (name, value)| req.header(name, value))
    }
}
