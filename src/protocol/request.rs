use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// JSON-RPC 2.0 request envelope.
///
/// Any JSON object decodes: `jsonrpc` is ignored and a missing or non-string
/// `method` becomes empty, which dispatches as an unknown method. `id` is
/// kept as raw JSON so it can be echoed back unchanged; an absent or `null`
/// id marks a notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_method")]
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: Option<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(Value::Null))
    }
}

fn lenient_method<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(method) => method,
        _ => String::new(),
    })
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}
