//! Push-stream session transport.
//!
//! Opens the server's event feed, decides how submissions are addressed
//! (session id or legacy) and republishes every inbound event to an
//! [`InboundHandler`].

use crate::error::McpError;
use crate::session::{parse_session_announcement, AddressingMode, SessionHandle};
use crate::sse::{SseDecoder, SseEvent};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Item produced by the feed reader.
pub type FeedItem = Result<SseEvent, McpError>;

/// Event names that announce the session id.
const SESSION_EVENTS: [&str; 2] = ["endpoint", "session"];

/// Feed and submission URLs derived from one base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub feed_url: Url,
    pub submit_url: Url,
}

impl Endpoints {
    /// Derive both endpoints from `base`.
    ///
    /// The base may already end with the feed path
    /// (`http://host:3000/mcp`); it is stripped before joining.
    pub fn from_base(base: &str, feed_path: &str, submit_path: &str) -> Result<Self, McpError> {
        let mut base = base.trim().trim_end_matches('/');
        let feed_suffix = feed_path.trim_end_matches('/');
        if !feed_suffix.is_empty() {
            if let Some(stripped) = base.strip_suffix(feed_suffix) {
                base = stripped.trim_end_matches('/');
            }
        }

        let feed_url = Url::parse(&format!("{}{}", base, feed_path))
            .map_err(|e| McpError::Connect(format!("Invalid feed URL: {}", e)))?;
        let submit_url = Url::parse(&format!("{}{}", base, submit_path))
            .map_err(|e| McpError::Connect(format!("Invalid submission URL: {}", e)))?;

        Ok(Self {
            feed_url,
            submit_url,
        })
    }
}

/// Receiver of raw inbound event payloads.
///
/// Called from the feed task; implementations must not block.
pub trait InboundHandler: Send + Sync {
    fn on_message(&self, payload: &str);
}

/// Decide the addressing mode from the head of the feed.
///
/// A session announcement inside the grace window selects
/// session-addressed mode; an elapsed window selects legacy mode. Other
/// events seen meanwhile are handed to `handler`.
pub async fn negotiate_addressing(
    feed: &mut mpsc::UnboundedReceiver<FeedItem>,
    grace: Duration,
    session: &SessionHandle,
    handler: &dyn InboundHandler,
) -> Result<AddressingMode, McpError> {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        match tokio::time::timeout_at(deadline, feed.recv()).await {
            Err(_) => {
                session.settle_legacy();
                info!("No session announced within {:?}; using legacy addressing", grace);
                return Ok(session.mode());
            }
            Ok(None) => {
                return Err(McpError::Connect(
                    "Event feed closed before addressing mode was determined".to_string(),
                ));
            }
            Ok(Some(Err(e))) => {
                return Err(McpError::Connect(format!(
                    "Event feed failed before addressing mode was determined: {}",
                    e
                )));
            }
            Ok(Some(Ok(event))) => {
                if SESSION_EVENTS.contains(&event.event.as_str()) {
                    if let Some(session_id) = parse_session_announcement(&event.data) {
                        session.establish(session_id);
                        info!("Session announced; using session-addressed submissions");
                        return Ok(session.mode());
                    }
                    warn!("Ignoring session announcement without an id: {:?}", event.data);
                    continue;
                }
                handler.on_message(&event.data);
            }
        }
    }
}

/// Forward the rest of the feed until it ends or fails.
async fn pump(mut feed: mpsc::UnboundedReceiver<FeedItem>, handler: Arc<dyn InboundHandler>) {
    while let Some(item) = feed.recv().await {
        match item {
            Ok(event) if SESSION_EVENTS.contains(&event.event.as_str()) => {
                debug!("Ignoring late session announcement; addressing mode is fixed");
            }
            Ok(event) => handler.on_message(&event.data),
            Err(e) => {
                warn!("Event feed error: {}", e);
                break;
            }
        }
    }
    info!("Event feed ended");
}

/// SSE connection to an MCP server.
pub struct SessionTransport {
    endpoints: Endpoints,
    client: reqwest::Client,
    session: SessionHandle,
    grace: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionTransport {
    pub fn new(endpoints: Endpoints, session: SessionHandle, grace: Duration) -> Self {
        Self {
            endpoints,
            client: reqwest::Client::new(),
            session,
            grace,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Open the feed and settle the addressing mode.
    ///
    /// # Errors
    /// Returns `McpError::Connect` if the feed cannot be opened or fails
    /// before the mode is known.
    pub async fn connect(&self, handler: Arc<dyn InboundHandler>) -> Result<(), McpError> {
        info!("Connecting event feed: {}", self.endpoints.feed_url);

        let response = self
            .client
            .get(self.endpoints.feed_url.clone())
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| McpError::Connect(format!("Failed to open event feed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::Connect(format!("HTTP {}: {}", status, body)));
        }

        let (tx, mut rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for event in decoder.feed(&chunk) {
                            if tx.send(Ok(event)).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(McpError::Transport(e.to_string())));
                        return;
                    }
                }
            }
        });

        let mode = match negotiate_addressing(&mut rx, self.grace, &self.session, handler.as_ref())
            .await
        {
            Ok(mode) => mode,
            Err(e) => {
                reader.abort();
                return Err(e);
            }
        };
        debug!("Addressing mode: {:?}", mode);

        let forwarder = tokio::spawn(pump(rx, handler));

        let mut tasks = self.tasks.lock();
        tasks.push(reader);
        tasks.push(forwarder);
        Ok(())
    }

    /// Release the feed and forget the session id. Safe to call twice.
    pub fn close(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        if !tasks.is_empty() {
            info!("Closing event feed");
        }
        for task in tasks {
            task.abort();
        }
        self.session.clear();
    }
}

impl Drop for SessionTransport {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_from_plain_base() {
        let endpoints = Endpoints::from_base("http://localhost:3000", "/mcp", "/messages").unwrap();
        assert_eq!(endpoints.feed_url.as_str(), "http://localhost:3000/mcp");
        assert_eq!(endpoints.submit_url.as_str(), "http://localhost:3000/messages");
    }

    #[test]
    fn test_endpoints_strip_feed_suffix() {
        let endpoints =
            Endpoints::from_base("http://localhost:3000/mcp/", "/mcp", "/messages").unwrap();
        assert_eq!(endpoints.feed_url.as_str(), "http://localhost:3000/mcp");
        assert_eq!(endpoints.submit_url.as_str(), "http://localhost:3000/messages");
    }

    #[test]
    fn test_endpoints_reject_garbage() {
        let result = Endpoints::from_base("not a url", "/mcp", "/messages");
        assert!(matches!(result, Err(McpError::Connect(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let endpoints = Endpoints::from_base("http://localhost:3000", "/mcp", "/messages").unwrap();
        let session = SessionHandle::new();
        session.establish("abc".to_string());
        let transport = SessionTransport::new(endpoints, session.clone(), Duration::from_secs(1));

        transport.close();
        transport.close();

        assert!(session.session_id().is_none());
        assert!(transport.tasks.lock().is_empty());
    }
}
