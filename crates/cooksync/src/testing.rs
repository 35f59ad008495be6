//! Test doubles shared by unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::{ApiRequest, ApiResponse, Transport};
use crate::auth::Browser;
use crate::error::SyncError;

/// Transport that replays scripted responses and records every request.
///
/// Responses are consumed in order; once one is left it is repeated.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, SyncError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn sequence(responses: Vec<Result<ApiResponse, SyncError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A transport for tests that must not reach the network
    pub fn unreachable() -> Self {
        Self::sequence(Vec::new())
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, SyncError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().map(|r| match r {
                Ok(response) => Ok(response.clone()),
                Err(e) => Err(SyncError::Transport(e.to_string())),
            })
        };
        next.unwrap_or_else(|| Err(SyncError::Transport("no scripted response".to_string())))
    }
}

/// Browser that records opened URLs
#[derive(Default)]
pub struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// A browser that cannot be launched
    pub fn failing() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Browser for RecordingBrowser {
    fn open(&self, url: &str) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("No browser available");
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
