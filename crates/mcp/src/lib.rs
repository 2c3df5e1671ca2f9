//! MCP client over a server-sent event feed with a separate submission
//! endpoint.

pub mod catalog;
pub mod client;
pub mod correlator;
pub mod error;
pub mod gateway;
pub mod interfaces;
pub mod protocol;
pub mod session;
pub mod sse;
pub mod transport;

pub use catalog::ToolCatalog;
pub use client::{McpConfig, McpConnection};
pub use correlator::{HttpSubmitter, RpcCorrelator, DEFAULT_REQUEST_TIMEOUT};
pub use error::McpError;
pub use gateway::ToolGateway;
pub use interfaces::{Submitter, ToolService};
pub use protocol::{
    extract_tool_list, InboundResponse, InitializeParams, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, ToolDescriptor, MCP_PROTOCOL_VERSION,
};
pub use session::{parse_session_announcement, AddressingMode, SessionHandle};
pub use sse::{SseDecoder, SseEvent};
pub use transport::{negotiate_addressing, Endpoints, FeedItem, InboundHandler, SessionTransport};
