//! Request/response correlation over the push feed.
//!
//! Requests leave through a [`Submitter`]; responses come back on the
//! event feed and are matched to their caller by id. The pending table
//! is the single point of mutation: whichever path removes an entry
//! (inbound response or deadline) is the one that completes it.

use crate::error::McpError;
use crate::interfaces::{Submitter, ToolService};
use crate::protocol::{
    extract_tool_list, InboundResponse, InitializeParams, JsonRpcNotification, JsonRpcRequest,
    ToolDescriptor,
};
use crate::session::{AddressingMode, SessionHandle};
use crate::transport::InboundHandler;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use url::Url;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type Completion = oneshot::Sender<Result<Value, McpError>>;

/// JSON-RPC correlator.
pub struct RpcCorrelator<S: Submitter> {
    submitter: Arc<S>,
    session: SessionHandle,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, Completion>>,
    timeout: Duration,
    client_name: String,
}

impl<S: Submitter> RpcCorrelator<S> {
    pub fn new(submitter: Arc<S>, session: SessionHandle, timeout: Duration) -> Self {
        Self {
            submitter,
            session,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            timeout,
            client_name: "ferry".to_string(),
        }
    }

    /// Name announced in `clientInfo` during `initialize`.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn addressing(&self) -> Result<Option<String>, McpError> {
        match self.session.mode() {
            AddressingMode::Legacy => Ok(None),
            AddressingMode::SessionAddressed => self.session.session_id().map(Some).ok_or_else(|| {
                McpError::Transport(
                    "Server requires a session id but none has been captured".to_string(),
                )
            }),
            AddressingMode::Undetermined => Err(McpError::Transport(
                "Addressing mode not negotiated; connect first".to_string(),
            )),
        }
    }

    /// Issue one request and wait for its correlated response.
    ///
    /// # Errors
    /// `Transport` if submission fails or addressing is unavailable,
    /// `Remote` if the server answers with an error, `Timeout` if nothing
    /// arrives before the deadline.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let session_id = self.addressing()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let deadline = tokio::time::Instant::now() + self.timeout;
        let envelope = serde_json::to_value(JsonRpcRequest::new(id, method, params))?;
        debug!("RPC -> {} (id={})", method, id);

        let (tx, mut rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let exchange = async {
            self.submitter.submit(&envelope, session_id.as_deref()).await?;
            match (&mut rx).await {
                Ok(outcome) => outcome,
                Err(_) => Err(McpError::Transport(format!(
                    "Response channel for request {} closed",
                    id
                ))),
            }
        };

        let outcome = tokio::time::timeout_at(deadline, exchange).await;
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                // Only a failed submission can leave the entry behind.
                self.pending.lock().remove(&id);
                Err(e)
            }
            Err(_) => {
                let expired = self.pending.lock().remove(&id);
                if expired.is_none() {
                    // The feed already took the entry; its send is imminent.
                    if let Ok(outcome) = rx.await {
                        return outcome;
                    }
                }
                warn!("RPC timeout: {} (id={})", method, id);
                metrics::counter!("mcp_rpc_timeouts", 1);
                Err(McpError::Timeout {
                    method: method.to_string(),
                    id,
                })
            }
        }
    }

    /// Send a notification; nothing is awaited from the feed.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let session_id = self.addressing()?;
        let envelope = serde_json::to_value(JsonRpcNotification::new(method, params))?;
        self.submitter.submit(&envelope, session_id.as_deref()).await
    }

    /// Handshake with the server.
    pub async fn initialize(&self) -> Result<(), McpError> {
        let params = serde_json::to_value(InitializeParams::new(&self.client_name))?;
        self.call("initialize", params).await?;

        if let Err(e) = self.notify("notifications/initialized", None).await {
            warn!("Failed to send initialized notification: {}", e);
        }
        Ok(())
    }

    /// Route one feed payload to its waiting caller.
    pub fn handle_message(&self, payload: &str) {
        let Some(response) = InboundResponse::from_payload(payload) else {
            debug!("Ignoring uncorrelated feed event");
            return;
        };

        let Some(completion) = self.pending.lock().remove(&response.id) else {
            debug!("Dropping response for unknown or expired id {}", response.id);
            return;
        };

        let outcome = response.outcome.map_err(|error| McpError::Remote {
            message: error
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "MCP RPC error".to_string()),
            code: error.code,
        });

        let _ = completion.send(outcome);
    }
}

impl<S: Submitter> InboundHandler for RpcCorrelator<S> {
    fn on_message(&self, payload: &str) {
        self.handle_message(payload);
    }
}

#[async_trait]
impl<S: Submitter> ToolService for RpcCorrelator<S> {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let result = self.call("tools/list", json!({})).await?;
        match extract_tool_list(&result) {
            Some(tools) => Ok(tools),
            None => {
                warn!("Unrecognised tools/list response shape; assuming no tools");
                Ok(Vec::new())
            }
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        self.call("tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }
}

/// Posts envelopes to the submission endpoint over HTTP.
pub struct HttpSubmitter {
    client: reqwest::Client,
    submit_url: Url,
}

impl HttpSubmitter {
    pub fn new(submit_url: Url) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, submit_url }
    }

    /// Submission URL, with `sessionId` appended when addressed.
    pub fn target_url(&self, session_id: Option<&str>) -> Url {
        let mut url = self.submit_url.clone();
        if let Some(session_id) = session_id {
            url.query_pairs_mut().append_pair("sessionId", session_id);
        }
        url
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, body: &Value, session_id: Option<&str>) -> Result<(), McpError> {
        let url = self.target_url(session_id);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| McpError::Transport(format!("Submission failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(McpError::Transport(format!("HTTP {}: {}", status.as_u16(), text)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    use std::sync::{OnceLock, Weak};

    /// Takes the pending entry on submission, as the feed would, but only
    /// completes it after the deadline has passed.
    struct SlowDelivery {
        correlator: OnceLock<Weak<RpcCorrelator<SlowDelivery>>>,
        delay: Duration,
    }

    #[async_trait]
    impl Submitter for SlowDelivery {
        async fn submit(&self, body: &Value, _session_id: Option<&str>) -> Result<(), McpError> {
            let Some(id) = body.get("id").and_then(Value::as_u64) else {
                return Ok(());
            };
            let correlator = self.correlator.get().and_then(Weak::upgrade).unwrap();
            let completion = correlator.pending.lock().remove(&id).unwrap();
            let delay = self.delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = completion.send(Ok(json!("delivered")));
            });
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_claimed_response_wins_over_deadline() {
        let submitter = Arc::new(SlowDelivery {
            correlator: OnceLock::new(),
            delay: Duration::from_millis(500),
        });
        let session = SessionHandle::new();
        session.settle_legacy();
        let correlator = Arc::new(RpcCorrelator::new(
            submitter.clone(),
            session,
            Duration::from_millis(100),
        ));
        let _ = submitter.correlator.set(Arc::downgrade(&correlator));

        let result = correlator.call("tools/call", json!({})).await.unwrap();

        assert_eq!(result, json!("delivered"));
        assert_eq!(correlator.pending_count(), 0);
    }

    fn submitter() -> HttpSubmitter {
        HttpSubmitter::new(Url::parse("http://localhost:3000/messages").unwrap())
    }

    #[test]
    fn test_target_url_legacy_has_no_query() {
        let url = submitter().target_url(None);
        assert_eq!(url.as_str(), "http://localhost:3000/messages");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_target_url_session_query() {
        let url = submitter().target_url(Some("abc 123"));
        assert_eq!(url.as_str(), "http://localhost:3000/messages?sessionId=abc+123");
    }
}
