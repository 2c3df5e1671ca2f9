//! Bridges from the MCP layer into runtime interfaces.

use crate::interfaces::ToolExecutor;
use async_trait::async_trait;
use ferry_mcp::{McpError, ToolDescriptor, ToolGateway};
use serde_json::Value;

#[async_trait]
impl ToolExecutor for ToolGateway {
    fn tools(&self) -> &[ToolDescriptor] {
        self.catalog().all()
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        ToolGateway::execute(self, name, arguments).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use ferry_mcp::{ToolCatalog, ToolService};
    use serde_json::json;
    use std::sync::Arc;

    struct EchoService;

    #[async_trait]
    impl ToolService for EchoService {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
            Ok(vec![])
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
            Ok(json!({"tool": name, "arguments": arguments}))
        }
    }

    fn gateway() -> ToolGateway {
        let catalog = ToolCatalog::new(vec![ToolDescriptor::new("echo", json!({}))]);
        ToolGateway::new(Arc::new(catalog), Arc::new(EchoService))
    }

    #[tokio::test]
    async fn test_gateway_as_executor() {
        let gateway = gateway();
        let executor: &dyn ToolExecutor = &gateway;

        assert_eq!(executor.tools().len(), 1);
        let result = executor.execute("echo", json!({"x": 1})).await.unwrap();
        assert_eq!(result["arguments"]["x"], 1);
    }

    #[tokio::test]
    async fn test_gateway_executor_rejects_unknown() {
        let gateway = gateway();
        let executor: &dyn ToolExecutor = &gateway;

        let result = executor.execute("missing", json!({})).await;
        assert!(matches!(result, Err(McpError::UnknownTool(_))));
    }
}
