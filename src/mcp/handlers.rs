//! MCP (Model Context Protocol) route handlers
//!
//! This module implements the JSON-RPC dispatcher for the Cosmos DB toolkit.
//! `dispatch` and `handle_tool_call` are public so tests can drive them
//! without going through HTTP.

use super::{helpers::*, models::*};
use crate::{
    auth::{extract_bearer, AuthError},
    error::{RpcError, PARSE_ERROR},
    tools::{AppState, SharedState, ToolArguments},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::FutureExt;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use tracing::Instrument;
use uuid::Uuid;

/// Creates routes for MCP-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/mcp", post(handle_mcp)) // Standard endpoint
        .route("/mcp/", post(handle_mcp)) // Trailing slash safety
}

/// What the HTTP layer should write back for one RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A JSON-RPC envelope with the given status.
    Reply(StatusCode, Value),
    /// Notifications: acknowledged with an empty 200.
    Silent,
    /// Authenticated caller without the required role; plain-text 403.
    Forbidden(String),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Reply(status, body) => {
                (status, [(header::CACHE_CONTROL, "no-cache")], Json(body)).into_response()
            }
            Outcome::Silent => StatusCode::OK.into_response(),
            Outcome::Forbidden(message) => (StatusCode::FORBIDDEN, message).into_response(),
        }
    }
}

/// Endpoint: POST /mcp
async fn handle_mcp(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(e) => {
            tracing::warn!(error = %e.body_text(), "rejecting unparseable rpc body");
            return Outcome::Reply(
                StatusCode::BAD_REQUEST,
                rpc_error(Value::Null, PARSE_ERROR, "Parse error", None),
            )
            .into_response();
        }
    };

    dispatch(&state, &body, extract_bearer(&headers))
        .await
        .into_response()
}

/// Runs one JSON-RPC message through auth, routing and execution.
pub async fn dispatch(state: &AppState, body: &Value, bearer: Option<&str>) -> Outcome {
    let Some(object) = body.as_object() else {
        return Outcome::Reply(
            StatusCode::BAD_REQUEST,
            rpc_error(Value::Null, PARSE_ERROR, "Parse error", Some(json!("expected a JSON object"))),
        );
    };
    let envelope = RpcEnvelope::from_object(object);

    let span = tracing::info_span!(
        "rpc",
        request_id = %Uuid::new_v4(),
        id = %envelope.reply_id(),
        method = %envelope.method.as_str().unwrap_or("<missing>"),
    );
    let outcome = AssertUnwindSafe(route(state, &envelope, bearer))
        .catch_unwind()
        .instrument(span)
        .await
        .unwrap_or_else(|panic| Err(RpcError::Internal(panic_message(panic.as_ref()))));

    if envelope.is_notification() {
        if let Err(e) = &outcome {
            tracing::debug!(error = %e, "dropping error for notification");
        }
        return Outcome::Silent;
    }

    match outcome {
        Ok(Some(result)) => Outcome::Reply(StatusCode::OK, rpc_success(envelope.reply_id(), result)),
        Ok(None) => Outcome::Silent,
        Err(RpcError::Auth(AuthError::Forbidden { role })) => {
            Outcome::Forbidden(AuthError::Forbidden { role }.to_string())
        }
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(error = %e, "rpc call failed");
            }
            Outcome::Reply(
                e.status(),
                rpc_error(envelope.reply_id(), e.code(), e.message(), e.data()),
            )
        }
    }
}

/// `Ok(None)` means the method produces no result (notifications).
async fn route(
    state: &AppState,
    envelope: &RpcEnvelope,
    bearer: Option<&str>,
) -> Result<Option<Value>, RpcError> {
    let Some(method_name) = envelope.method.as_str() else {
        return Err(RpcError::MethodNotFound(envelope.method.clone()));
    };
    let method = McpMethod::parse(method_name);

    let principal = state.auth.authorize(method.class(), bearer)?;
    tracing::info!(user = %principal.identity(), "mcp call");

    match method {
        McpMethod::Initialize => Ok(Some(handle_initialize())),
        McpMethod::ToolsList => Ok(Some(state.registry.to_json())),
        McpMethod::ToolsCall => handle_tool_call(state, method_name, &envelope.params)
            .await
            .map(Some),
        McpMethod::Notification => Ok(None),
        McpMethod::Unknown(name) => {
            tracing::warn!(method = %name, "unknown method");
            Err(RpcError::MethodNotFound(Value::String(name)))
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".into())
}

// =============================================================================
// MCP Method Handlers
// =============================================================================

/// Handles `initialize` request (Handshake).
fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

/// Handles `tools/call` request.
///
/// Operation failures are not RPC errors: the handler's `{error}` payload is
/// wrapped as text content like any other result. Without a tool name the call
/// is treated as an unroutable `method`; an unknown name is an internal error.
pub async fn handle_tool_call(
    state: &AppState,
    method: &str,
    params: &Value,
) -> Result<Value, RpcError> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| RpcError::MethodNotFound(Value::String(method.to_string())))?;
    let tool = state.registry.resolve(name)?;

    let args = ToolArguments::from_json(params.get("arguments").unwrap_or(&Value::Null));
    tracing::info!(tool = tool.contract.name, arguments = args.len(), "executing tool");

    let output = tool.invoke(&state.tools, &args).await;
    Ok(text_content(&output))
}
