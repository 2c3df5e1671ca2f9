//! Connection assembly: transport, submitter and correlator wired together.

use crate::correlator::{HttpSubmitter, RpcCorrelator};
use crate::error::McpError;
use crate::session::SessionHandle;
use crate::transport::{Endpoints, InboundHandler, SessionTransport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Server connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub base_url: String,
    pub feed_path: String,
    pub submit_path: String,
    pub request_timeout_ms: u64,
    pub session_grace_ms: u64,
    pub client_name: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            feed_path: "/mcp".to_string(),
            submit_path: "/messages".to_string(),
            request_timeout_ms: 10_000,
            session_grace_ms: 3_000,
            client_name: "ferry".to_string(),
        }
    }
}

impl McpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn session_grace(&self) -> Duration {
        Duration::from_millis(self.session_grace_ms)
    }

    pub fn endpoints(&self) -> Result<Endpoints, McpError> {
        Endpoints::from_base(&self.base_url, &self.feed_path, &self.submit_path)
    }
}

/// An open, initialized MCP connection.
pub struct McpConnection {
    transport: SessionTransport,
    correlator: Arc<RpcCorrelator<HttpSubmitter>>,
}

impl McpConnection {
    /// Connect the feed, negotiate addressing and run the handshake.
    ///
    /// # Errors
    /// `Connect` when the feed cannot be opened or negotiated; whatever
    /// `initialize` returns otherwise.
    pub async fn open(config: &McpConfig) -> Result<Self, McpError> {
        let endpoints = config.endpoints()?;
        let session = SessionHandle::new();

        let submitter = Arc::new(HttpSubmitter::new(endpoints.submit_url.clone()));
        let correlator = Arc::new(
            RpcCorrelator::new(submitter, session.clone(), config.request_timeout())
                .with_client_name(config.client_name.clone()),
        );

        let transport = SessionTransport::new(endpoints, session, config.session_grace());
        let handler: Arc<dyn InboundHandler> = correlator.clone();
        transport.connect(handler).await?;

        if let Err(e) = correlator.initialize().await {
            transport.close();
            return Err(e);
        }
        info!("MCP connection ready ({:?})", transport.session().mode());

        Ok(Self {
            transport,
            correlator,
        })
    }

    pub fn correlator(&self) -> Arc<RpcCorrelator<HttpSubmitter>> {
        self.correlator.clone()
    }

    pub fn close(&self) {
        self.transport.close();
    }
}
