//! Error taxonomy for the toolkit
//!
//! Two families live here. `ToolError` covers everything that can go wrong
//! inside an operation handler; those errors are folded into an ordinary
//! `{ "error": ..., "statusCode"?: ... }` payload and travel back inside a
//! successful RPC `result`. `RpcError` covers protocol-level failures that
//! become JSON-RPC `error` envelopes (or a bare 403).

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{auth::AuthError, store::StoreError};

// =============================================================================
// JSON-RPC Error Codes
// =============================================================================

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;
/// No bearer credential was presented.
pub const AUTHENTICATION_REQUIRED: i32 = -32001;
/// A bearer credential was presented but failed validation.
pub const INVALID_CREDENTIAL: i32 = -32002;

// =============================================================================
// Handler-level Errors
// =============================================================================

/// Failure raised while executing a single operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolError {
    #[error("Parameter '{0}' is required.")]
    MissingParameter(String),

    #[error("Parameter '{name}' must be {expected}.")]
    InvalidParameterType { name: String, expected: &'static str },

    #[error("Parameter '{name}' must be a whole number between {min} and {max}.")]
    OutOfRange { name: String, min: i32, max: i32 },

    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("{message}")]
    StoreFailure {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Failed to generate embedding: {0}")]
    EmbeddingFailure(String),

    #[error("Embedding service is not configured.")]
    EmbeddingUnavailable,
}

impl ToolError {
    /// Renders the error as the payload a handler hands back to its caller.
    pub fn to_payload(&self) -> Value {
        match self {
            ToolError::StoreFailure {
                status_code: Some(code),
                ..
            } => json!({ "error": self.to_string(), "statusCode": code }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        ToolError::StoreFailure {
            message: err.message,
            status_code: err.status_code,
        }
    }
}

// =============================================================================
// Protocol-level Errors
// =============================================================================

/// Failure that aborts an RPC call before (or instead of) producing a result.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Carries the offending method (or `null` when none was supplied).
    #[error("Method not found")]
    MethodNotFound(Value),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A tool failure that escapes the handler boundary (an unresolved tool name)
/// surfaces as an internal error carrying its message.
impl From<ToolError> for RpcError {
    fn from(err: ToolError) -> Self {
        RpcError::Internal(err.to_string())
    }
}

impl RpcError {
    /// JSON-RPC code carried in `error.code`.
    pub fn code(&self) -> i32 {
        match self {
            RpcError::Auth(AuthError::AuthenticationRequired) => AUTHENTICATION_REQUIRED,
            RpcError::Auth(_) => INVALID_CREDENTIAL,
            RpcError::MethodNotFound(_) => METHOD_NOT_FOUND,
            RpcError::Internal(_) => INTERNAL_ERROR,
        }
    }

    /// HTTP status used when the error is written to the wire.
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Auth(AuthError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            RpcError::Auth(_) => StatusCode::UNAUTHORIZED,
            RpcError::MethodNotFound(_) => StatusCode::BAD_REQUEST,
            RpcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short message carried in `error.message`.
    pub fn message(&self) -> String {
        match self {
            RpcError::Auth(AuthError::AuthenticationRequired) => "Authentication required".into(),
            RpcError::Auth(AuthError::InvalidCredential(_)) => "Invalid or expired token".into(),
            RpcError::Auth(err) => err.to_string(),
            RpcError::MethodNotFound(_) => "Method not found".into(),
            RpcError::Internal(_) => "Internal error".into(),
        }
    }

    /// Optional `error.data` payload.
    pub fn data(&self) -> Option<Value> {
        match self {
            RpcError::MethodNotFound(method) => Some(method.clone()),
            RpcError::Internal(detail) => Some(Value::String(detail.clone())),
            RpcError::Auth(AuthError::InvalidCredential(detail)) => {
                Some(Value::String(detail.clone()))
            }
            RpcError::Auth(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failure_payload_carries_status_code() {
        let err = ToolError::StoreFailure {
            message: "Resource Not Found".into(),
            status_code: Some(404),
        };
        let payload = err.to_payload();
        assert_eq!(payload["error"], "Resource Not Found");
        assert_eq!(payload["statusCode"], 404);
    }

    #[test]
    fn range_error_mentions_bounds() {
        let err = ToolError::OutOfRange {
            name: "n".into(),
            min: 1,
            max: 20,
        };
        assert_eq!(
            err.to_payload()["error"],
            "Parameter 'n' must be a whole number between 1 and 20."
        );
        assert!(err.to_payload().get("statusCode").is_none());
    }

    #[test]
    fn auth_errors_map_to_distinct_codes() {
        let missing = RpcError::from(AuthError::AuthenticationRequired);
        let invalid = RpcError::from(AuthError::InvalidCredential("expired".into()));
        assert_eq!(missing.code(), -32001);
        assert_eq!(invalid.code(), -32002);
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let forbidden = RpcError::from(AuthError::Forbidden {
            role: "Mcp.Tool.Executor".into(),
        });
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unknown_tool_is_an_internal_error() {
        let err = RpcError::from(ToolError::UnknownOperation("nope".into()));
        assert_eq!(err.code(), -32603);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Internal error");
        assert_eq!(err.data(), Some(json!("Unknown tool: nope")));
    }

    #[test]
    fn method_not_found_echoes_method() {
        let err = RpcError::MethodNotFound(json!("foo/bar"));
        assert_eq!(err.code(), -32601);
        assert_eq!(err.data(), Some(json!("foo/bar")));
    }
}
