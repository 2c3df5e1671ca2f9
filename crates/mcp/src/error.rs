//! Error taxonomy for the MCP client layer.

use thiserror::Error;

/// Errors raised by the transport, the correlator and the tool gateway.
#[derive(Error, Debug)]
pub enum McpError {
    /// The event feed could not be opened, or failed before the
    /// addressing mode was determined.
    #[error("Connect error: {0}")]
    Connect(String),

    /// Submission failed, or the connection requires a session id that
    /// has not been captured.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC timeout: {method} (id={id})")]
    Timeout { method: String, id: u64 },

    /// The server answered with an explicit error payload.
    #[error("Remote error: {message}")]
    Remote { message: String, code: Option<i64> },

    #[error("Tool '{0}' not available in MCP")]
    UnknownTool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl McpError {
    /// Whether the failure came from the server rather than from the wire.
    pub fn is_remote(&self) -> bool {
        matches!(self, McpError::Remote { .. })
    }
}
