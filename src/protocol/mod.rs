pub mod request;
pub mod response;

pub use request::{JsonRpcRequest, ToolCallParams};
pub use response::{JsonRpcError, JsonRpcResponse, ToolResult, ToolResultContent, SERVER_ERROR};
