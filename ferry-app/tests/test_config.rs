#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use ferry_app::config::AppConfig;
use std::collections::HashMap;
use std::fs;

#[test]
fn test_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.mcp.base_url, "http://localhost:3000");
    assert_eq!(config.mcp.feed_path, "/mcp");
    assert_eq!(config.mcp.submit_path, "/messages");
    assert_eq!(config.mcp.request_timeout_ms, 10_000);
    assert_eq!(config.mcp.session_grace_ms, 3_000);
    assert_eq!(config.llm.endpoint, "https://api.openai.com/v1");
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.agent.max_iterations, 15);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_yaml_keeps_other_defaults() {
    let yaml = r#"
mcp:
  base_url: http://tools.internal:8080/mcp
  request_timeout_ms: 2500
agent:
  max_iterations: 4
"#;
    let config = AppConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.mcp.base_url, "http://tools.internal:8080/mcp");
    assert_eq!(config.mcp.request_timeout_ms, 2500);
    assert_eq!(config.mcp.session_grace_ms, 3_000);
    assert_eq!(config.agent.max_iterations, 4);
    assert_eq!(config.llm.model, "gpt-4o-mini");

    let endpoints = config.mcp.endpoints().unwrap();
    assert_eq!(endpoints.feed_url.as_str(), "http://tools.internal:8080/mcp");
    assert_eq!(endpoints.submit_url.as_str(), "http://tools.internal:8080/messages");
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ferry.yaml");
    fs::write(&path, "llm:\n  model: gpt-4o\n  max_retries: 5\n").unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.llm.max_retries, 5);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ferry.yaml");
    fs::write(&path, "mcp: [not, a, map]\n").unwrap();

    let err = AppConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("FERRY_MCP_URL", "http://override:9000"),
        ("FERRY_LLM_MODEL", "local-model"),
        ("FERRY_LLM_ENDPOINT", "  "),
    ]
    .into_iter()
    .collect();

    let mut config = AppConfig::default();
    config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.mcp.base_url, "http://override:9000");
    assert_eq!(config.llm.model, "local-model");
    // Blank values do not override.
    assert_eq!(config.llm.endpoint, "https://api.openai.com/v1");
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.mcp.base_url = String::new();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.mcp.request_timeout_ms = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.mcp.session_grace_ms = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.agent.max_iterations = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.mcp.base_url = "no scheme here".to_string();
    assert!(config.validate().is_err());
}
