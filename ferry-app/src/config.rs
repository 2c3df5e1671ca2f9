use anyhow::{bail, Context, Result};
use ferry_mcp::McpConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decision model provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub max_retries: u32,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_retries: 2,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: ferry_runtime::DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mcp: McpConfig,
    pub llm: LlmConfig,
    pub agent: AgentConfig,
}

impl AppConfig {
    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `FERRY_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("FERRY_MCP_URL") {
            self.mcp.base_url = url;
        }
        if let Some(endpoint) = get("FERRY_LLM_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = get("FERRY_LLM_MODEL") {
            self.llm.model = model;
        }
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.mcp.base_url.trim().is_empty() {
            bail!("mcp.base_url must not be empty");
        }
        if self.llm.endpoint.trim().is_empty() {
            bail!("llm.endpoint must not be empty");
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.mcp.request_timeout_ms == 0 {
            bail!("mcp.request_timeout_ms must be greater than zero");
        }
        if self.mcp.session_grace_ms == 0 {
            bail!("mcp.session_grace_ms must be greater than zero");
        }
        if self.agent.max_iterations == 0 {
            bail!("agent.max_iterations must be greater than zero");
        }
        self.mcp
            .endpoints()
            .context("mcp.base_url is not a valid URL")?;
        Ok(())
    }
}
