//! Browser authorization followed by token polling
//!
//! The user authorizes this client in the browser; meanwhile the client polls
//! the token endpoint with its client id until a token shows up, the endpoint
//! fails, or the attempt ceiling is reached.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use super::Browser;
use crate::api::wire::TokenResponse;
use crate::api::{ApiRequest, Transport};
use crate::config::{Endpoints, ServiceConfig};
use crate::error::SyncError;

/// One handshake run: opens the authorization page, then polls for a token
pub struct AuthHandshake<'a> {
    transport: &'a dyn Transport,
    browser: &'a dyn Browser,
    endpoints: Endpoints,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<'a> AuthHandshake<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        browser: &'a dyn Browser,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            transport,
            browser,
            endpoints: config.endpoints(),
            poll_interval: config.poll_interval,
            max_attempts: config.max_token_attempts.max(1),
        }
    }

    /// Run the handshake for `client_id` and return the bearer token.
    ///
    /// Transport failures and statuses above 400 abort immediately with
    /// [`SyncError::AuthFailed`]. A pending response waits `poll_interval`
    /// and polls again, up to `max_attempts` polls in total, after which
    /// [`SyncError::AuthTimedOut`] is returned.
    pub fn run(&self, client_id: &str) -> Result<String, SyncError> {
        for attempt in 0..self.max_attempts {
            if attempt == 0 {
                self.open_authorization_page(client_id);
            }

            if let Some(token) = self.poll(client_id)? {
                info!("Received token after {} attempt(s)", attempt + 1);
                return Ok(token);
            }

            if attempt + 1 < self.max_attempts {
                debug!(
                    "Token not ready, retrying (attempt {})",
                    attempt + 1
                );
                thread::sleep(self.poll_interval);
            }
        }

        warn!("Reached token attempt limit ({})", self.max_attempts);
        Err(SyncError::AuthTimedOut {
            attempts: self.max_attempts,
        })
    }

    fn open_authorization_page(&self, client_id: &str) {
        let url = self.endpoints.authorize_page(client_id);
        info!("Opening browser for authorization");
        if let Err(e) = self.browser.open(&url) {
            warn!("{:#}. Please open this URL manually: {}", e, url);
        }
    }

    /// Poll the token endpoint once; `Ok(None)` means authorization is pending
    fn poll(&self, client_id: &str) -> Result<Option<String>, SyncError> {
        let request = ApiRequest::get(self.endpoints.token(client_id));
        let response = self.transport.send(&request).map_err(|e| {
            warn!("Token request failed: {}", e);
            SyncError::AuthFailed(e.to_string())
        })?;

        if !response.is_success() {
            warn!("Token endpoint returned status {}", response.status);
            return Err(SyncError::AuthFailed(format!(
                "token endpoint returned status {}",
                response.status
            )));
        }

        let token = match response.json::<TokenResponse>() {
            Ok(body) => body.and_then(|b| b.token),
            Err(e) => {
                debug!("Unreadable token response, treating as pending: {}", e);
                None
            }
        };

        Ok(token.filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use crate::testing::{RecordingBrowser, ScriptedTransport};

    fn fast_config(max_attempts: u32) -> ServiceConfig {
        ServiceConfig {
            base_url: "https://cooksync.test".to_string(),
            poll_interval: Duration::ZERO,
            max_token_attempts: max_attempts,
        }
    }

    #[test]
    fn test_token_on_first_poll() {
        let transport = ScriptedTransport::sequence(vec![Ok(ApiResponse::new(
            200,
            r#"{"token":"abc"}"#,
        ))]);
        let browser = RecordingBrowser::new();
        let config = fast_config(51);

        let token = AuthHandshake::new(&transport, &browser, &config)
            .run("ab12cd")
            .unwrap();

        assert_eq!(token, "abc");
        assert_eq!(
            browser.opened(),
            vec!["https://cooksync.test/export?uuid=ab12cd&service=obsidian".to_string()]
        );
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://cooksync.test/api/clients/token?uuid=ab12cd"
        );
        assert!(requests[0].header_value("Authorization").is_none());
    }

    #[test]
    fn test_pending_then_token() {
        let transport = ScriptedTransport::sequence(vec![
            Ok(ApiResponse::new(200, "{}")),
            Ok(ApiResponse::new(200, r#"{"token":""}"#)),
            Ok(ApiResponse::new(400, r#"{"detail":"pending"}"#)),
            Ok(ApiResponse::new(200, r#"{"token":"abc"}"#)),
        ]);
        let browser = RecordingBrowser::new();
        let config = fast_config(51);

        let token = AuthHandshake::new(&transport, &browser, &config)
            .run("ab12cd")
            .unwrap();

        assert_eq!(token, "abc");
        assert_eq!(transport.requests().len(), 4);
        assert_eq!(browser.opened().len(), 1);
    }

    #[test]
    fn test_polling_stops_at_attempt_ceiling() {
        let transport = ScriptedTransport::sequence(vec![Ok(ApiResponse::new(200, "{}"))]);
        let browser = RecordingBrowser::new();
        let config = fast_config(51);

        let err = AuthHandshake::new(&transport, &browser, &config)
            .run("ab12cd")
            .unwrap_err();

        assert!(matches!(err, SyncError::AuthTimedOut { attempts: 51 }));
        assert_eq!(transport.requests().len(), 51);
        assert_eq!(browser.opened().len(), 1);
    }

    #[test]
    fn test_transport_failure_aborts_without_retry() {
        let transport = ScriptedTransport::sequence(vec![Err(SyncError::Transport(
            "connection refused".to_string(),
        ))]);
        let browser = RecordingBrowser::new();
        let config = fast_config(51);

        let err = AuthHandshake::new(&transport, &browser, &config)
            .run("ab12cd")
            .unwrap_err();

        assert!(matches!(err, SyncError::AuthFailed(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_error_status_aborts() {
        let transport = ScriptedTransport::sequence(vec![
            Ok(ApiResponse::new(200, "{}")),
            Ok(ApiResponse::new(500, "boom")),
        ]);
        let browser = RecordingBrowser::new();
        let config = fast_config(51);

        let err = AuthHandshake::new(&transport, &browser, &config)
            .run("ab12cd")
            .unwrap_err();

        assert!(matches!(err, SyncError::AuthFailed(_)));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_browser_failure_does_not_stop_polling() {
        let transport = ScriptedTransport::sequence(vec![Ok(ApiResponse::new(
            200,
            r#"{"token":"abc"}"#,
        ))]);
        let browser = RecordingBrowser::failing();
        let config = fast_config(3);

        let token = AuthHandshake::new(&transport, &browser, &config)
            .run("ab12cd")
            .unwrap();
        assert_eq!(token, "abc");
    }
}
