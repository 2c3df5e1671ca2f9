//! Planning loop: the conversational kernel.
//!
//! Each call to [`PlanningLoop::run`] takes one user input and asks the
//! decision function for steps until it either talks to the user or
//! declares the task finished. Tool calls are executed in between and
//! their outcome is folded back into the conversation.

use crate::context::{fingerprint, ConversationContext};
use crate::interfaces::{DecisionMaker, RuntimeError, ToolExecutor};
use crate::metrics;
use crate::types::{AgentDecision, Message, Role};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default decision ceiling per user input.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

const TOOL_LIST_PREAMBLE: &str = "You can ONLY use the following MCP tools.\n";

/// Where the conversation stands between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    Active,
    AwaitingUser,
    Concluded,
}

/// Snapshot returned by [`PlanningLoop::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoopStatus {
    pub state: LoopState,
    pub messages: usize,
    pub cached_results: usize,
}

enum Turn {
    Reply(String),
    Final(String),
}

/// Drives one conversation against a decision function and a tool executor.
pub struct PlanningLoop<M, E>
where
    M: DecisionMaker,
    E: ToolExecutor,
{
    decider: Arc<M>,
    executor: Arc<E>,
    max_iterations: usize,
    context: Option<ConversationContext>,
    state: LoopState,
}

impl<M, E> PlanningLoop<M, E>
where
    M: DecisionMaker,
    E: ToolExecutor,
{
    pub fn new(decider: Arc<M>, executor: Arc<E>, max_iterations: usize) -> Self {
        Self {
            decider,
            executor,
            max_iterations,
            context: None,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Messages of the live context; empty when there is none.
    pub fn messages(&self) -> &[Message] {
        self.context
            .as_ref()
            .map(ConversationContext::messages)
            .unwrap_or(&[])
    }

    pub fn status(&self) -> LoopStatus {
        LoopStatus {
            state: self.state,
            messages: self.messages().len(),
            cached_results: self
                .context
                .as_ref()
                .map(ConversationContext::cached_results)
                .unwrap_or(0),
        }
    }

    /// Drop the live context, whatever state it is in.
    pub fn reset(&mut self) {
        info!("Resetting conversation");
        self.context = None;
        self.state = LoopState::Idle;
    }

    /// Process one user input.
    ///
    /// Returns the text to show the user. On error the context is kept so
    /// the next input continues the same conversation.
    ///
    /// # Errors
    /// `NoTools` if the catalog is empty, `IterationLimitExceeded` when
    /// the ceiling is hit, or whatever the decision function returned.
    pub async fn run(&mut self, input: &str) -> Result<String, RuntimeError> {
        let tools = self.executor.tools();
        if tools.is_empty() {
            warn!("Refusing to run without tools");
            return Err(RuntimeError::NoTools);
        }

        let mut context = match self.context.take() {
            Some(context) => context,
            None => {
                info!("Starting new conversation with {} tools", tools.len());
                let listing = serde_json::to_string_pretty(tools)?;
                let mut context = ConversationContext::new();
                context.push(Message::system(format!("{}{}", TOOL_LIST_PREAMBLE, listing)));
                context
            }
        };
        context.push(Message::user(input));
        self.state = LoopState::Active;

        let outcome = self.drive(&mut context).await;
        match outcome {
            Ok(Turn::Final(text)) => {
                info!("Conversation concluded; clearing context");
                self.state = LoopState::Concluded;
                Ok(text)
            }
            Ok(Turn::Reply(text)) => {
                self.context = Some(context);
                self.state = LoopState::AwaitingUser;
                Ok(text)
            }
            Err(e) => {
                self.context = Some(context);
                self.state = LoopState::AwaitingUser;
                Err(e)
            }
        }
    }

    async fn drive(&self, context: &mut ConversationContext) -> Result<Turn, RuntimeError> {
        for iteration in 0..self.max_iterations {
            debug!("Planning iteration {}/{}", iteration + 1, self.max_iterations);

            let decision = self
                .decider
                .decide(context.messages())
                .await
                .map_err(|e| {
                    error!("Decision failed: {}", e);
                    e
                })?;

            match decision {
                AgentDecision::ToolCall { name, arguments } => {
                    self.handle_tool_call(context, &name, arguments).await?;
                }
                AgentDecision::Message { text } => {
                    metrics::record_turn_iterations(iteration + 1);
                    context.push(Message::assistant(text.clone()));
                    return Ok(Turn::Reply(text));
                }
                AgentDecision::Final { text } => {
                    metrics::record_turn_iterations(iteration + 1);
                    context.push(Message::assistant(text.clone()));
                    return Ok(Turn::Final(text));
                }
            }
        }

        warn!("Agent exceeded max iterations ({})", self.max_iterations);
        Err(RuntimeError::IterationLimitExceeded(self.max_iterations))
    }

    async fn handle_tool_call(
        &self,
        context: &mut ConversationContext,
        name: &str,
        arguments: Value,
    ) -> Result<(), RuntimeError> {
        let key = fingerprint(name, &arguments);

        if let Some(cached) = context.cached(&key) {
            info!("Duplicate tool call '{}'; using cached result", name);
            metrics::increment_cache_hits();
            let note = json!({
                "type": "tool_call",
                "tool": name,
                "result": cached,
                "note": "Using cached result",
            });
            context.push(Message::with_metadata(
                Role::Assistant,
                serde_json::to_string(&note)?,
                json!({"cached": true}),
            ));
            return Ok(());
        }

        info!("Decision requested tool '{}'", name);
        let note = match self.executor.execute(name, arguments).await {
            Ok(result) => {
                let note = json!({"type": "tool_call", "tool": name, "result": result});
                context.remember(key, result);
                note
            }
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                json!({"type": "tool_call", "tool": name, "error": e.to_string()})
            }
        };
        context.push(Message::assistant(serde_json::to_string(&note)?));
        Ok(())
    }
}
