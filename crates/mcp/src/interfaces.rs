//! Seams between the correlator, its submission channel and tool consumers.

use crate::error::McpError;
use crate::protocol::ToolDescriptor;
use async_trait::async_trait;
use serde_json::Value;

/// Secondary channel that carries request envelopes to the server.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Post one envelope. `session_id` is set when the connection is
    /// session-addressed.
    async fn submit(&self, body: &Value, session_id: Option<&str>) -> Result<(), McpError>;
}

/// Remote tool operations as seen by the catalog and the gateway.
#[async_trait]
pub trait ToolService: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError>;

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError>;
}
