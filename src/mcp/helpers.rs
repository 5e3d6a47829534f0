//! MCP Protocol Helpers
//!
//! This module contains helper functions for JSON-RPC envelope construction.

use serde_json::{json, Value};

/// Builds a JSON-RPC 2.0 success response.
///
/// # Arguments
///
/// * `id` – The request identifier that must be echoed back.
/// * `result` – The payload representing the successful outcome.
///
/// # Returns
///
/// A `serde_json::Value` shaped as a JSON-RPC success envelope.
pub fn rpc_success(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds a JSON-RPC 2.0 error response.
///
/// # Arguments
///
/// * `id` – The request identifier (or `null` if unavailable).
/// * `code` – The JSON-RPC error code (e.g., -32601 for method not found).
/// * `message` – Human-readable description of the error.
/// * `data` – Optional extra detail; omitted from the envelope when `None`.
pub fn rpc_error(id: Value, code: i32, message: impl Into<String>, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(data) = data {
        error["data"] = data;
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error,
    })
}

/// Wraps a tool's output as MCP text content.
///
/// The output is serialized into `content[0].text`, whether it is a
/// domain payload or an `{error}` object.
pub fn text_content(output: &Value) -> Value {
    json!({
        "content": [{ "type": "text", "text": output.to_string() }]
    })
}
