//! MCP JSON-RPC wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version sent during the handshake.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Request envelope posted to the submission endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Id-less message; the server sends nothing back.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Error object carried by a failed response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response event correlated by id.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundResponse {
    pub id: u64,
    pub outcome: Result<Value, JsonRpcError>,
}

impl InboundResponse {
    /// Interpret a feed payload as a correlated response.
    ///
    /// Returns `None` for anything without a numeric id: notifications,
    /// server pings and non-JSON chatter.
    pub fn from_payload(payload: &str) -> Option<Self> {
        let body: Value = serde_json::from_str(payload).ok()?;
        let id = body.get("id")?.as_u64()?;

        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let error = serde_json::from_value(error.clone()).unwrap_or(JsonRpcError {
                code: None,
                message: error.as_str().map(str::to_string),
                data: None,
            });
            return Some(Self {
                id,
                outcome: Err(error),
            });
        }

        let result = body.get("result").cloned().unwrap_or(body);

        Some(Self {
            id,
            outcome: Ok(result),
        })
    }
}

/// Tool descriptor as listed by the server.
///
/// Only the name is interpreted; every other field is kept verbatim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub schema: Map<String, Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        let schema = match schema {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("inputSchema".to_string(), other);
                map
            }
        };
        Self {
            name: name.into(),
            schema,
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.schema.get("description").and_then(Value::as_str)
    }
}

/// Client identity sent in the handshake.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: Value,
    pub client_info: ClientInfo,
}

impl InitializeParams {
    pub fn new(client_name: &str) -> Self {
        Self {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: Value::Object(Map::new()),
            client_info: ClientInfo {
                name: client_name.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Pull the tool list out of a `tools/list` result.
///
/// Servers answer with a bare list, `{ "tools": [...] }`, or the same
/// nested once more under `result`.
pub fn extract_tool_list(value: &Value) -> Option<Vec<ToolDescriptor>> {
    let list = if value.is_array() {
        value
    } else if let Some(tools) = value.get("tools").filter(|t| t.is_array()) {
        tools
    } else {
        value
            .get("result")
            .and_then(|r| r.get("tools"))
            .filter(|t| t.is_array())?
    };

    serde_json::from_value(list.clone()).ok()
}
