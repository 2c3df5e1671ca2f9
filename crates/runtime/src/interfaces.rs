//! Abstract interfaces for the planning loop's collaborators.

use crate::types::{AgentDecision, Message};
use async_trait::async_trait;
use ferry_mcp::{McpError, ToolDescriptor};
use serde_json::Value;
use thiserror::Error;

/// Runtime errors.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Tool error: {0}")]
    Tool(#[from] McpError),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Agent exceeded max iterations ({0})")]
    IterationLimitExceeded(usize),

    #[error("Decision error: {0}")]
    Decision(String),

    #[error("No MCP tools available. Agent cannot proceed.")]
    NoTools,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Produces the next step from the conversation so far.
#[async_trait]
pub trait DecisionMaker: Send + Sync {
    async fn decide(&self, messages: &[Message]) -> Result<AgentDecision, RuntimeError>;
}

/// Validated tool execution as seen by the planning loop.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tools the decision function may call.
    fn tools(&self) -> &[ToolDescriptor];

    async fn execute(&self, name: &str, arguments: Value) -> Result<Value, McpError>;
}
