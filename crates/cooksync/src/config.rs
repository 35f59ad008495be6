//! Service configuration for the Cooksync API
//!
//! The base URL is resolved from (in order of priority):
//! 1. Compile-time `COOKSYNC_BASE_URL` (for builds pointed at staging)
//! 2. JSON file (~/.config/cooksync/service.json)
//! 3. Runtime `COOKSYNC_BASE_URL` environment variable
//! 4. The production endpoint

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Service config filename in the Cooksync config directory
const SERVICE_FILE: &str = "service.json";

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://go.cooksync.app";

/// Export target sent with every export request
pub const EXPORT_TARGET: &str = "obsidian";

/// Settings for talking to the Cooksync service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    /// Wait between token polls while browser authorization is pending
    pub poll_interval: Duration,
    /// Token polls issued before the handshake gives up
    pub max_token_attempts: u32,
}

/// Optional overrides read from service.json
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceFile {
    base_url: Option<String>,
    poll_interval_secs: Option<u64>,
    max_token_attempts: Option<u32>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(3),
            max_token_attempts: 51,
        }
    }
}

impl ServiceConfig {
    /// Resolve the service configuration using the priority order above
    pub fn load() -> Result<Self> {
        if let Some(base_url) = Self::base_url_from_compile_time() {
            return Ok(Self::with_base_url(base_url));
        }

        if config::config_exists(SERVICE_FILE) {
            let file: ServiceFile = config::load_json(SERVICE_FILE)?;
            return Ok(Self::from_service_file(file));
        }

        Ok(Self::from_env())
    }

    /// Load overrides from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: ServiceFile = config::load_json_file(path)?;
        Ok(Self::from_service_file(file))
    }

    /// Use the runtime environment, falling back to the production endpoint
    pub fn from_env() -> Self {
        match std::env::var("COOKSYNC_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(url),
            _ => Self::default(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    fn base_url_from_compile_time() -> Option<String> {
        option_env!("COOKSYNC_BASE_URL")
            .filter(|url| !url.is_empty())
            .map(str::to_string)
    }

    fn from_service_file(file: ServiceFile) -> Self {
        let mut cfg = match file.base_url {
            Some(url) => Self::with_base_url(url),
            None => Self::default(),
        };
        if let Some(secs) = file.poll_interval_secs {
            cfg.poll_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = file.max_token_attempts {
            cfg.max_token_attempts = attempts.max(1);
        }
        cfg
    }

    /// Endpoint URLs derived from the base URL
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            base_url: self.base_url.clone(),
        }
    }
}

/// URLs of the Cooksync service used by the sync core
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// POST endpoint that returns recipes not yet imported
    pub fn export(&self) -> String {
        format!("{}/api/recipes/export/{}", self.base_url, EXPORT_TARGET)
    }

    /// Unauthenticated token retrieval keyed by client id
    pub fn token(&self, client_id: &str) -> String {
        format!(
            "{}/api/clients/token?uuid={}",
            self.base_url,
            urlencoding::encode(client_id)
        )
    }

    /// Browser page where the user authorizes this client
    pub fn authorize_page(&self, client_id: &str) -> String {
        format!(
            "{}/export?uuid={}&service={}",
            self.base_url,
            urlencoding::encode(client_id),
            EXPORT_TARGET
        )
    }

    /// Browser page for customizing recipe import options
    pub fn customize_page(&self) -> String {
        format!("{}/export/{}", self.base_url, EXPORT_TARGET)
    }
}
