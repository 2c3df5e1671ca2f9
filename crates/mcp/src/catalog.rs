//! Snapshot of the tools a server exposes.

use crate::error::McpError;
use crate::interfaces::ToolService;
use crate::protocol::ToolDescriptor;
use tracing::{debug, info};

/// Immutable tool list fetched once per connection.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    /// Fetch the snapshot with a single `tools/list` call.
    pub async fn load(service: &dyn ToolService) -> Result<Self, McpError> {
        let tools = service.list_tools().await?;
        let catalog = Self::new(tools);
        info!("MCP tools loaded: {:?}", catalog.names());
        for tool in catalog.all() {
            debug!("  {}: {}", tool.name, tool.description().unwrap_or("-"));
        }
        Ok(catalog)
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Tools in the order the server listed them.
    pub fn all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Pretty JSON dump used as model context.
    pub fn to_prompt_json(&self) -> Result<String, McpError> {
        Ok(serde_json::to_string_pretty(&self.tools)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(vec![
            ToolDescriptor::new("listKnowledge", json!({"description": "List notes"})),
            ToolDescriptor::new("createKnowledge", json!({"inputSchema": {"type": "object"}})),
        ])
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = catalog();
        let tool = catalog.lookup("listKnowledge").unwrap();
        assert_eq!(tool.description(), Some("List notes"));
        assert!(catalog.lookup("deleteKnowledge").is_none());
    }

    #[test]
    fn test_all_keeps_server_order() {
        assert_eq!(catalog().names(), vec!["listKnowledge", "createKnowledge"]);
        assert_eq!(catalog().len(), 2);
        assert!(ToolCatalog::default().is_empty());
    }

    #[test]
    fn test_prompt_json_lists_every_tool() {
        let dump = catalog().to_prompt_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&dump).unwrap();
        assert_eq!(parsed[0]["name"], "listKnowledge");
        assert_eq!(parsed[1]["inputSchema"]["type"], "object");
    }
}
