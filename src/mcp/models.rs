//! MCP Protocol Models and Constants
//!
//! This module contains the data structures and constants related to the
//! Model Context Protocol envelope.

use serde_json::{Map, Value};

use crate::auth::MethodClass;

// =============================================================================
// MCP Constants
// =============================================================================

/// Server identifier
pub const SERVER_NAME: &str = "Azure Cosmos DB MCP Toolkit";
/// Server version reported during the handshake
pub const SERVER_VERSION: &str = "1.0.0";
/// Protocol version for MCP
pub const PROTOCOL_VERSION: &str = "2024-11-05";
/// Prefix shared by all notification methods
pub const NOTIFICATION_PREFIX: &str = "notifications/";

// =============================================================================
// MCP Protocol Models
// =============================================================================

/// Inbound JSON-RPC envelope.
///
/// Built from a raw JSON object rather than derived, so that `id` survives
/// even when other members are malformed, and so an absent `id` can be told
/// apart from an explicit `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcEnvelope {
    /// `None` when the member is absent (a notification).
    pub id: Option<Value>,
    /// The `method` member exactly as submitted.
    pub method: Value,
    /// `params`, or `null` when absent.
    pub params: Value,
}

impl RpcEnvelope {
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            id: obj.get("id").cloned(),
            method: obj.get("method").cloned().unwrap_or(Value::Null),
            params: obj.get("params").cloned().unwrap_or(Value::Null),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id to echo back; `null` when none was supplied.
    pub fn reply_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// Routing target for a method string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    ToolsList,
    ToolsCall,
    Notification,
    Unknown(String),
}

impl McpMethod {
    /// Matches case-insensitively; `Unknown` keeps the submitted spelling.
    pub fn parse(method: &str) -> Self {
        let normalized = method.to_lowercase();
        match normalized.as_str() {
            "initialize" => McpMethod::Initialize,
            "tools/list" => McpMethod::ToolsList,
            "tools/call" => McpMethod::ToolsCall,
            m if m.starts_with(NOTIFICATION_PREFIX) => McpMethod::Notification,
            _ => McpMethod::Unknown(method.to_string()),
        }
    }

    pub fn class(&self) -> MethodClass {
        match self {
            McpMethod::Initialize => MethodClass::Negotiation,
            McpMethod::ToolsList => MethodClass::Discovery,
            McpMethod::ToolsCall => MethodClass::Invocation,
            McpMethod::Notification => MethodClass::Notification,
            McpMethod::Unknown(_) => MethodClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distinguishes_absent_and_null_ids() {
        let absent = json!({ "method": "tools/list" });
        let null = json!({ "method": "tools/list", "id": null });
        let absent = RpcEnvelope::from_object(absent.as_object().unwrap());
        let null = RpcEnvelope::from_object(null.as_object().unwrap());

        assert!(absent.is_notification());
        assert!(!null.is_notification());
        assert_eq!(null.reply_id(), Value::Null);
    }

    #[test]
    fn parses_methods_case_insensitively() {
        assert_eq!(McpMethod::parse("Tools/Call"), McpMethod::ToolsCall);
        assert_eq!(McpMethod::parse("INITIALIZE"), McpMethod::Initialize);
        assert_eq!(
            McpMethod::parse("notifications/initialized"),
            McpMethod::Notification
        );
        assert_eq!(McpMethod::parse("Foo/Bar"), McpMethod::Unknown("Foo/Bar".into()));
    }

    #[test]
    fn only_tool_calls_are_invocations() {
        assert_eq!(McpMethod::ToolsCall.class(), MethodClass::Invocation);
        assert_eq!(McpMethod::ToolsList.class(), MethodClass::Discovery);
        assert_eq!(McpMethod::Initialize.class(), MethodClass::Negotiation);
    }
}
