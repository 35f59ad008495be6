//! HTTP transport for the Cooksync API
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic. Status codes are
//! handed back as data rather than errors, because callers need the body
//! of a failed response as the user-facing error text.

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::SyncError;

/// HTTP method used by the Cooksync API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// An outbound API request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    /// Create a GET request without headers
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a POST request with a JSON body
    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> Result<Self, SyncError> {
        let body = serde_json::to_string(body)
            .map_err(|e| SyncError::Transport(format!("Failed to encode request body: {}", e)))?;
        Ok(Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response received from the service, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The service treats every status up to and including 400 as usable
    pub fn is_success(&self) -> bool {
        self.status <= 400
    }

    /// Decode the body as JSON; an empty or `null` body decodes to `None`
    pub fn json<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        let body = self.body.trim();
        if body.is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<T>>(body)
    }
}

/// Sends requests to the Cooksync service
///
/// Implementations return `Err(SyncError::Transport)` only when no response
/// was obtained; any received status is reported through [`ApiResponse`].
pub trait Transport: Send + Sync {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, SyncError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, SyncError> {
        (**self).send(request)
    }
}

/// Blocking HTTP transport backed by a shared `ureq` agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, SyncError> {
        debug!("{:?} {}", request.method, request.url);

        let result = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            Method::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_str()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| SyncError::Transport(format!("Failed to read response body: {}", e)))?;

        debug!("{} -> {} ({} bytes)", request.url, status, body.len());
        Ok(ApiResponse { status, body })
    }
}
