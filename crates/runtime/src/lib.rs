//! Conversational planning runtime for MCP tool agents.

pub mod adapters;
pub mod agent_loop;
pub mod context;
pub mod interfaces;
pub mod llm_client;
pub mod metrics;
pub mod prompt;
pub mod types;

pub use agent_loop::{LoopState, LoopStatus, PlanningLoop, DEFAULT_MAX_ITERATIONS};
pub use context::{canonical_json, fingerprint, ConversationContext};
pub use interfaces::{DecisionMaker, RuntimeError, ToolExecutor};
pub use llm_client::LlmDecisionClient;
pub use prompt::AGENT_SYSTEM_PROMPT;
pub use types::{AgentDecision, Message, Role};
