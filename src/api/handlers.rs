//! REST API handlers for health and direct tool invocation
//!
//! These sit beside the JSON-RPC endpoint for smoke tests and probes. Tool
//! calls here go through the same auth gate and registry as `tools/call`.

use super::models::*;
use crate::{
    auth::{extract_bearer, AuthError, MethodClass},
    mcp::models::{SERVER_NAME, SERVER_VERSION},
    tools::{SharedState, ToolArguments},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

/// Creates routes for the REST surface
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/health/auth", get(auth_info))
        .route("/api/mcp/tools", get(list_tools))
        .route("/api/mcp/tools/:tool_name", post(call_tool))
}

fn auth_failure(err: AuthError) -> Response {
    match err {
        AuthError::Forbidden { .. } => (StatusCode::FORBIDDEN, err.to_string()).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "error": err.to_string() }))).into_response(),
    }
}

/// Endpoint: GET /api/health
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        server: SERVER_NAME,
        version: SERVER_VERSION,
    })
}

/// Endpoint: GET /api/health/auth
/// Requires a valid credential but not the tool role.
async fn auth_info(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let principal = match state.auth.authenticate(extract_bearer(&headers)) {
        Ok(principal) => principal,
        Err(err) => return auth_failure(err),
    };
    let has_required_role = principal.has_role(state.auth.required_role());

    Json(AuthInfoResponse {
        status: if has_required_role {
            "authenticated"
        } else {
            "authenticated_but_unauthorized"
        },
        timestamp: Utc::now(),
        user: UserInfo::from(&principal),
        has_required_role,
        error: (!has_required_role).then(|| {
            AuthError::Forbidden {
                role: state.auth.required_role().to_string(),
            }
            .to_string()
        }),
        authentication_enabled: state.auth.enabled(),
        dev_mode: !state.auth.enabled(),
    })
    .into_response()
}

/// Endpoint: GET /api/mcp/tools
async fn list_tools(State(state): State<SharedState>) -> impl IntoResponse {
    let tools: Vec<ToolSummary> = state
        .registry
        .list()
        .map(|contract| ToolSummary {
            name: contract.name,
            description: contract.description,
        })
        .collect();

    Json(ToolListResponse {
        count: tools.len(),
        tools,
        timestamp: Utc::now(),
    })
}

/// Endpoint: POST /api/mcp/tools/{toolName}
/// Runs one tool with `{ "parameters": {...} }` and reports its output.
async fn call_tool(
    State(state): State<SharedState>,
    Path(tool_name): Path<String>,
    headers: HeaderMap,
    body: Result<Json<ToolRequest>, JsonRejection>,
) -> Response {
    if let Err(err) = state
        .auth
        .authorize(MethodClass::Invocation, extract_bearer(&headers))
    {
        return auth_failure(err);
    }

    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.body_text() }))).into_response()
        }
    };
    let parameters = request.parameters;
    tracing::info!(tool = %tool_name, parameters = parameters.len(), "rest tool call");

    let args = ToolArguments::from_json(&Value::Object(parameters.clone()));
    // Handler failures stay inside `result` as `{error, statusCode?}`;
    // only an unresolvable tool name fails the request.
    let (status, success, result, error) = match state.registry.resolve(&tool_name) {
        Ok(tool) => (
            StatusCode::OK,
            true,
            Some(tool.invoke(&state.tools, &args).await),
            None,
        ),
        Err(err) => {
            tracing::warn!(tool = %tool_name, error = %err, "rest tool call rejected");
            (StatusCode::BAD_REQUEST, false, None, Some(err.to_string()))
        }
    };
    (
        status,
        Json(ToolResponse {
            success,
            result,
            error,
            tool_name,
            parameters,
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}
