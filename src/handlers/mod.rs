use std::time::Instant;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::adapters::Registry;
use crate::error::BridgeError;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolResult};

/// Protocol version declared in `initialize`. Not negotiated.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_NAME: &str = "rails-mcp-bridge";

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` when no response is owed: notifications for methods this
/// server does not implement.
pub async fn dispatch(req: &JsonRpcRequest, registry: &Registry) -> Option<JsonRpcResponse> {
    let outcome = match req.method.as_str() {
        "initialize" => Ok(initialize()),

        "tools/list" => Ok(json!({ "tools": registry.descriptors() })),

        "tools/call" => tools_call(req.params.as_ref(), registry).await,

        // Anything else, `ping` included, is acknowledged with an empty
        // result when the caller expects a reply.
        _ => {
            if req.is_notification() {
                return None;
            }
            Ok(json!({}))
        }
    };

    Some(match outcome {
        Ok(result) => JsonRpcResponse::success(req.id.clone(), result),
        Err(err) => {
            warn!(method = %req.method, error = %err, "request failed");
            JsonRpcResponse::error(req.id.clone(), JsonRpcError::from(&err))
        }
    })
}

fn initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

async fn tools_call(params: Option<&Value>, registry: &Registry) -> Result<Value, BridgeError> {
    let params: ToolCallParams = match params {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| BridgeError::InvalidParams(format!("Invalid tools/call params: {e}")))?,
        None => ToolCallParams::default(),
    };
    let arguments = match params.arguments {
        Some(Value::Null) | None => json!({}),
        Some(v) => v,
    };

    let started = Instant::now();
    let content = registry.call(&params.name, &arguments).await;
    info!(
        tool = %params.name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = content.is_ok(),
        "tool call"
    );

    Ok(json!(ToolResult::new(content?)))
}
