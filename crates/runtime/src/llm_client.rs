//! Decision function backed by an OpenAI-compatible chat completion API.

use crate::interfaces::{DecisionMaker, RuntimeError};
use crate::metrics::{self, MetricTimer};
use crate::prompt::AGENT_SYSTEM_PROMPT;
use crate::types::{AgentDecision, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// OpenAI-compatible request format.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// OpenAI-compatible response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Decision client for OpenAI-compatible providers.
#[derive(Clone)]
pub struct LlmDecisionClient {
    endpoint: String,
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl LlmDecisionClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL of the provider, e.g. `https://api.openai.com/v1`
    /// * `model` - Model identifier
    /// * `max_retries` - Retries after the first failed attempt
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, max_retries: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into(),
            client,
            model: model.into(),
            api_key: None,
            max_retries,
        }
    }

    /// Attach a bearer token. Empty keys are ignored.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn build_request(&self, messages: &[Message]) -> ChatRequest {
        let mut chat = Vec::with_capacity(messages.len() + 1);
        chat.push(ChatMessage {
            role: "system",
            content: AGENT_SYSTEM_PROMPT.to_string(),
        });
        chat.extend(messages.iter().map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: msg.content.clone(),
        }));

        ChatRequest {
            model: self.model.clone(),
            messages: chat,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }

    fn retry_delay_for_error(&self, attempt: u32, err: &RuntimeError) -> Duration {
        let msg = err.to_string().to_lowercase();
        if msg.contains("rate limit") || msg.contains("429") {
            if let Some(seconds) = extract_retry_seconds(&msg) {
                return Duration::from_secs(seconds.min(90));
            }
            return Duration::from_secs((2_u64.saturating_pow(attempt + 1)).min(30));
        }
        Duration::from_millis((250_u64.saturating_mul(2_u64.saturating_pow(attempt))).min(5000))
    }

    /// Fetch the raw decision text, retrying transport and HTTP failures.
    async fn complete(&self, messages: &[Message]) -> Result<String, RuntimeError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            debug!("Decision call attempt {}/{}", attempt + 1, self.max_retries + 1);

            match self.complete_once(messages).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!("Decision call failed (attempt {}): {}", attempt + 1, e);
                    let delay = self.retry_delay_for_error(attempt, &e);
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(RuntimeError::Decision(format!(
            "Decision call failed after {} attempts: {}",
            self.max_retries + 1,
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string())
        )))
    }

    async fn complete_once(&self, messages: &[Message]) -> Result<String, RuntimeError> {
        let url = self.completions_url();
        let request = self.build_request(messages);
        debug!("decision url={} messages={}", url, request.messages.len());

        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                RuntimeError::Decision("Network connection failed".to_string())
            } else {
                RuntimeError::Decision(format!("HTTP request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(RuntimeError::Decision(describe_status(
                status.as_u16(),
                self.api_key.is_some(),
                &error_body,
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RuntimeError::Decision(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| RuntimeError::Decision("No content in response".to_string()))
    }
}

#[async_trait]
impl DecisionMaker for LlmDecisionClient {
    async fn decide(&self, messages: &[Message]) -> Result<AgentDecision, RuntimeError> {
        let _timer = MetricTimer::new(metrics::record_decision_latency);
        let raw = self.complete(messages).await?;
        debug!("Raw decision: {}", raw);
        AgentDecision::parse(&raw)
    }
}

fn describe_status(status: u16, has_key: bool, body: &str) -> String {
    match status {
        401 => {
            if has_key {
                format!("Authentication failed. Check your API key. Details: {}", body)
            } else {
                format!("Authentication required (401 Unauthorized). Details: {}", body)
            }
        }
        404 => format!("Invalid endpoint (404 Not Found). Details: {}", body),
        429 => format!("Rate limit exceeded (429 Too Many Requests). Details: {}", body),
        500..=599 => format!("Server error: HTTP {}. Details: {}", status, body),
        _ => format!("HTTP error: {}. Details: {}", status, body),
    }
}

fn extract_retry_seconds(msg: &str) -> Option<u64> {
    for token in msg.split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '.') {
        if let Some(stripped) = token.strip_suffix('s') {
            if let Ok(v) = stripped.parse::<u64>() {
                if v > 0 {
                    return Some(v);
                }
            }
        }
    }
    None
}
