//! Validated tool execution.

use crate::catalog::ToolCatalog;
use crate::error::McpError;
use crate::interfaces::ToolService;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Checks tool names against the catalog before forwarding calls.
///
/// Failures are returned as-is; nothing is retried here.
#[derive(Clone)]
pub struct ToolGateway {
    catalog: Arc<ToolCatalog>,
    service: Arc<dyn ToolService>,
}

impl ToolGateway {
    pub fn new(catalog: Arc<ToolCatalog>, service: Arc<dyn ToolService>) -> Self {
        Self { catalog, service }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        if self.catalog.lookup(name).is_none() {
            warn!("Rejected call to unknown tool '{}'", name);
            return Err(McpError::UnknownTool(name.to_string()));
        }

        info!("Executing tool '{}'", name);
        let started = Instant::now();
        let result = self.service.call_tool(name, arguments).await;
        metrics::histogram!(
            "mcp_tool_latency",
            started.elapsed().as_secs_f64() * 1000.0
        );

        match &result {
            Err(e) if e.is_remote() => warn!("Tool '{}' reported an error: {}", name, e),
            Err(e) => warn!("Tool '{}' failed: {}", name, e),
            Ok(_) => {}
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::protocol::ToolDescriptor;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingService {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ToolService for CountingService {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
            Ok(vec![])
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(McpError::Remote {
                    message: "tool crashed".to_string(),
                    code: None,
                });
            }
            Ok(json!({"tool": name, "echo": arguments}))
        }
    }

    fn gateway(fail: bool) -> (ToolGateway, Arc<CountingService>) {
        let service = Arc::new(CountingService {
            calls: AtomicUsize::new(0),
            fail,
        });
        let catalog = Arc::new(ToolCatalog::new(vec![ToolDescriptor::new("ping", json!({}))]));
        (ToolGateway::new(catalog, service.clone()), service)
    }

    #[tokio::test]
    async fn test_unknown_tool_makes_no_call() {
        let (gateway, service) = gateway(false);
        let result = gateway.execute("pong", json!({})).await;
        assert!(matches!(result, Err(McpError::UnknownTool(name)) if name == "pong"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_known_tool_is_forwarded() {
        let (gateway, service) = gateway(false);
        let result = gateway.execute("ping", json!({"n": 1})).await.unwrap();
        assert_eq!(result, json!({"tool": "ping", "echo": {"n": 1}}));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let (gateway, service) = gateway(true);
        let result = gateway.execute("ping", json!({})).await;
        assert!(matches!(result, Err(McpError::Remote { .. })));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }
}
