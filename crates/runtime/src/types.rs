//! Core type definitions for the ferry runtime.

use crate::interfaces::RuntimeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message role in conversation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in the conversation.
///
/// `metadata` annotates the message locally and is never sent to the
/// decision function.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(role: Role, content: impl Into<String>, metadata: Value) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: Some(metadata),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// True when this note was served from the tool result cache.
    pub fn is_cached(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("cached"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One step chosen by the decision function.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    ToolCall { name: String, arguments: Value },
    Message { text: String },
    Final { text: String },
}

impl AgentDecision {
    /// Decode the raw text returned by the decision function.
    pub fn parse(raw: &str) -> Result<Self, RuntimeError> {
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|e| RuntimeError::Decoding(format!("Response is not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Validate the `{type, ...}` decision shape.
    ///
    /// Unknown fields are ignored. A tool call without `body` gets `{}`.
    pub fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        let object = value.as_object().ok_or_else(|| {
            RuntimeError::Decoding(format!("Expected a JSON object, got {}", value))
        })?;

        let kind = required_str(object, "type")?;
        match kind {
            "tool_call" => {
                let name = required_str(object, "name")?;
                if name.trim().is_empty() {
                    return Err(RuntimeError::Decoding("Tool call missing name".to_string()));
                }
                let arguments = match object.get("body") {
                    None | Some(Value::Null) => Value::Object(Map::new()),
                    Some(body) => body.clone(),
                };
                Ok(AgentDecision::ToolCall {
                    name: name.to_string(),
                    arguments,
                })
            }
            "message" => Ok(AgentDecision::Message {
                text: required_str(object, "content")?.to_string(),
            }),
            "final" => Ok(AgentDecision::Final {
                text: required_str(object, "content")?.to_string(),
            }),
            other => Err(RuntimeError::Decoding(format!(
                "Invalid AI response type: {}",
                other
            ))),
        }
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str, RuntimeError> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(RuntimeError::Decoding(format!(
            "Field '{}' must be a string, got {}",
            field, other
        ))),
        None => Err(RuntimeError::Decoding(format!("Missing field '{}'", field))),
    }
}
