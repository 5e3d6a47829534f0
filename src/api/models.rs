//! REST API Models
//!
//! Request and response bodies for the diagnostic endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::Principal;

/// Body of `POST /api/mcp/tools/{toolName}`.
#[derive(Debug, Default, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Response for a direct tool invocation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tool_name: String,
    pub parameters: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// Short tool listing for `GET /api/mcp/tools`.
#[derive(Debug, Serialize)]
pub struct ToolSummary {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolSummary>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub server: &'static str,
    pub version: &'static str,
}

/// Who the caller is, as seen by the auth gate.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfoResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub user: UserInfo,
    pub has_required_role: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub authentication_enabled: bool,
    pub dev_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<String>,
}

impl From<&Principal> for UserInfo {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.subject.clone(),
            email: principal.email.clone(),
            name: principal.name.clone(),
            roles: principal.roles.iter().cloned().collect(),
        }
    }
}
