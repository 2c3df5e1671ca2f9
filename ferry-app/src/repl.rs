//! Line-oriented front end over the planning loop.

use ferry_runtime::{DecisionMaker, PlanningLoop, ToolExecutor};
use tracing::error;

pub const HELP_TEXT: &str = "Commands:
  /reset   Start a new conversation
  /status  Show conversation state
  /help    Show this help
  /quit    Exit

Anything else is sent to the agent.";

/// What the caller should do with one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplOutcome {
    /// Blank input.
    Ignored,
    /// Agent reply.
    Reply(String),
    /// Output of a slash command.
    Notice(String),
    /// A failed turn, already rendered.
    Error(String),
    Quit,
}

pub struct Repl<M, E>
where
    M: DecisionMaker,
    E: ToolExecutor,
{
    agent: PlanningLoop<M, E>,
}

impl<M, E> Repl<M, E>
where
    M: DecisionMaker,
    E: ToolExecutor,
{
    pub fn new(agent: PlanningLoop<M, E>) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &PlanningLoop<M, E> {
        &self.agent
    }

    pub async fn handle_line(&mut self, line: &str) -> ReplOutcome {
        let input = line.trim();
        match input {
            "" => ReplOutcome::Ignored,
            "/quit" | "/exit" => ReplOutcome::Quit,
            "/help" => ReplOutcome::Notice(HELP_TEXT.to_string()),
            "/reset" => {
                self.agent.reset();
                ReplOutcome::Notice("Conversation reset.".to_string())
            }
            "/status" => {
                let status = self.agent.status();
                ReplOutcome::Notice(format!(
                    "State: {:?}\nMessages: {}\nCached tool results: {}",
                    status.state, status.messages, status.cached_results
                ))
            }
            _ => match self.agent.run(input).await {
                Ok(reply) => ReplOutcome::Reply(reply),
                Err(e) => {
                    error!("Turn failed: {}", e);
                    ReplOutcome::Error(format!("Error: {}", e))
                }
            },
        }
    }
}
