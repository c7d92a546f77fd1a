mod common;

use common::{config_with, registry, RecordingRunner};
use rails_mcp_bridge::handlers;
use rails_mcp_bridge::protocol::JsonRpcRequest;
use rails_mcp_bridge::schema::validate_json;
use serde_json::json;

#[tokio::test]
async fn error_response_matches_wire_schema() {
    let runner = RecordingRunner::new();
    runner.respond(1, "", "ActiveRecord::RecordNotFound");
    let registry = registry(&config_with(&[]), &runner);

    let req = JsonRpcRequest::new(
        Some(json!(17)),
        "tools/call",
        Some(json!({ "name": "rails_exec", "arguments": { "code": "User.find(0)" } })),
    );
    let response = handlers::dispatch(&req, &registry).await.unwrap();
    let value = serde_json::to_value(&response).unwrap();

    let schema = json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["jsonrpc", "id", "error"],
        "additionalProperties": false,
        "properties": {
            "jsonrpc": { "const": "2.0" },
            "id": { "const": 17 },
            "error": {
                "type": "object",
                "required": ["code", "message", "data"],
                "additionalProperties": false,
                "properties": {
                    "code": { "const": -32000 },
                    "message": { "type": "string", "minLength": 1 },
                    "data": {
                        "type": "array",
                        "minItems": 1,
                        "items": { "type": "string" }
                    }
                }
            }
        }
    });

    validate_json(&schema, &value).expect("error response must satisfy wire schema");
}

#[tokio::test]
async fn tool_result_matches_wire_schema() {
    let runner = RecordingRunner::new();
    runner.respond(0, "null\n", "");
    let registry = registry(&config_with(&[]), &runner);

    let req = JsonRpcRequest::new(
        Some(json!("u")),
        "tools/call",
        Some(json!({ "name": "user_last" })),
    );
    let response = handlers::dispatch(&req, &registry).await.unwrap();
    let value = serde_json::to_value(&response).unwrap();

    let schema = json!({
        "type": "object",
        "required": ["jsonrpc", "id", "result"],
        "not": { "required": ["error"] },
        "properties": {
            "result": {
                "type": "object",
                "required": ["content"],
                "properties": {
                    "content": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["type", "text"],
                            "additionalProperties": false,
                            "properties": {
                                "type": { "const": "text" },
                                "text": { "type": "string" }
                            }
                        }
                    }
                }
            }
        }
    });

    validate_json(&schema, &value).expect("tool result must satisfy wire schema");
}
