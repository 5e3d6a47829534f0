//! Tool Registry
//!
//! The fixed set of operations: each entry pairs its contract (what
//! `tools/list` advertises) with the function that executes it. Built once;
//! lookups are case-insensitive.

use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::{args::ToolArguments, handlers, state::ToolContext};
use crate::error::ToolError;

// =============================================================================
// Tool Names
// =============================================================================

pub const LIST_DATABASES: &str = "list_databases";
pub const LIST_COLLECTIONS: &str = "list_collections";
pub const GET_RECENT_DOCUMENTS: &str = "get_recent_documents";
pub const TEXT_SEARCH: &str = "text_search";
pub const FIND_DOCUMENT_BY_ID: &str = "find_document_by_id";
pub const GET_APPROXIMATE_SCHEMA: &str = "get_approximate_schema";
pub const VECTOR_SEARCH: &str = "vector_search";

// =============================================================================
// Contracts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
}

impl ParamType {
    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
}

const fn required(name: &'static str, ty: ParamType, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        ty,
        required: true,
        description,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolContract {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolContract {
    /// JSON schema for the tool's arguments object.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({ "type": p.ty.as_str(), "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Signature shared by every operation handler.
pub type HandlerFn =
    for<'a> fn(&'a ToolContext, &'a ToolArguments) -> BoxFuture<'a, Result<Value, ToolError>>;

pub struct RegisteredTool {
    pub contract: ToolContract,
    handler: HandlerFn,
}

impl RegisteredTool {
    /// Runs the handler. Handler failures come back as an `{error, statusCode?}`
    /// payload, never as an `Err`.
    pub async fn invoke(&self, ctx: &ToolContext, args: &ToolArguments) -> Value {
        self.call(ctx, args)
            .await
            .unwrap_or_else(|err| err.to_payload())
    }

    /// Runs the handler and keeps the failure typed.
    pub async fn call(&self, ctx: &ToolContext, args: &ToolArguments) -> Result<Value, ToolError> {
        let result = (self.handler)(ctx, args).await;
        if let Err(err) = &result {
            match err {
                ToolError::StoreFailure { status_code, .. } => tracing::error!(
                    tool = self.contract.name,
                    status_code = ?status_code,
                    error = %err,
                    "store failure"
                ),
                _ => tracing::warn!(tool = self.contract.name, error = %err, "tool call rejected"),
            }
        }
        result
    }
}

pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<String, usize>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        let tools = builtin_tools();
        let by_name = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.contract.name.to_lowercase(), i))
            .collect();
        Self { tools, by_name }
    }

    /// Contracts in advertised order.
    pub fn list(&self) -> impl Iterator<Item = &ToolContract> {
        self.tools.iter().map(|t| &t.contract)
    }

    pub fn resolve(&self, name: &str) -> Result<&RegisteredTool, ToolError> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolError::UnknownOperation(name.to_string()))
    }

    /// Payload for `tools/list`.
    pub fn to_json(&self) -> Value {
        json!({ "tools": self.list().map(ToolContract::to_json).collect::<Vec<_>>() })
    }
}

fn builtin_tools() -> Vec<RegisteredTool> {
    use ParamType::{Integer, String as Text};

    const DATABASE_ID: ParamSpec = required("databaseId", Text, "Database id containing the container");
    const CONTAINER_ID: ParamSpec = required("containerId", Text, "Container id to query");

    vec![
        RegisteredTool {
            contract: ToolContract {
                name: LIST_DATABASES,
                description: "Lists databases available in the Cosmos DB account.",
                params: vec![],
            },
            handler: |ctx, args| Box::pin(handlers::list_databases(ctx, args)),
        },
        RegisteredTool {
            contract: ToolContract {
                name: LIST_COLLECTIONS,
                description: "Lists containers (collections) for the specified database.",
                params: vec![required("databaseId", Text, "Database id to list containers from")],
            },
            handler: |ctx, args| Box::pin(handlers::list_collections(ctx, args)),
        },
        RegisteredTool {
            contract: ToolContract {
                name: GET_RECENT_DOCUMENTS,
                description: "Gets the most recent N documents ordered by timestamp (_ts DESC) from the specified database/container. N must be between 1 and 20.",
                params: vec![
                    DATABASE_ID,
                    CONTAINER_ID,
                    required("n", Integer, "Number of documents to return (1-20)"),
                ],
            },
            handler: |ctx, args| Box::pin(handlers::get_recent_documents(ctx, args)),
        },
        RegisteredTool {
            contract: ToolContract {
                name: TEXT_SEARCH,
                description: "Select TOP N documents where a given property contains the provided search string. N must be between 1 and 20.",
                params: vec![
                    DATABASE_ID,
                    CONTAINER_ID,
                    required("property", Text, "Document property to search, e.g. name or profile.name"),
                    required("searchPhrase", Text, "Search term to look for within the property"),
                    required("n", Integer, "Number of documents to return (1-20)"),
                ],
            },
            handler: |ctx, args| Box::pin(handlers::text_search(ctx, args)),
        },
        RegisteredTool {
            contract: ToolContract {
                name: FIND_DOCUMENT_BY_ID,
                description: "Find a document by its id in the specified database/container.",
                params: vec![
                    DATABASE_ID,
                    CONTAINER_ID,
                    required("id", Text, "The id of the document to find"),
                ],
            },
            handler: |ctx, args| Box::pin(handlers::find_document_by_id(ctx, args)),
        },
        RegisteredTool {
            contract: ToolContract {
                name: GET_APPROXIMATE_SCHEMA,
                description: "Approximates a container schema by sampling up to 10 documents and returning a union of top-level properties with inferred types and brief descriptions.",
                params: vec![
                    DATABASE_ID,
                    required("containerId", Text, "Container id to inspect"),
                ],
            },
            handler: |ctx, args| Box::pin(handlers::get_approximate_schema(ctx, args)),
        },
        RegisteredTool {
            contract: ToolContract {
                name: VECTOR_SEARCH,
                description: "Performs vector search on Cosmos DB using Azure OpenAI embeddings. Searches for semantically similar documents based on text input.",
                params: vec![
                    DATABASE_ID,
                    CONTAINER_ID,
                    required("searchText", Text, "Text to search for semantically similar content"),
                    required("vectorProperty", Text, "Property name where vector embeddings are stored, e.g. 'vector' or 'embeddings'"),
                    required("selectProperties", Text, "Comma-separated list of specific properties to project in results, e.g. 'id,title,content'. Cannot use '*' wildcard."),
                    required("topN", Integer, "Number of documents to return (1-50)"),
                ],
            },
            handler: |ctx, args| Box::pin(handlers::vector_search(ctx, args)),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_tools_in_fixed_order() {
        let registry = ToolRegistry::new();
        let names: Vec<_> = registry.list().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                LIST_DATABASES,
                LIST_COLLECTIONS,
                GET_RECENT_DOCUMENTS,
                TEXT_SEARCH,
                FIND_DOCUMENT_BY_ID,
                GET_APPROXIMATE_SCHEMA,
                VECTOR_SEARCH,
            ]
        );
    }

    #[test]
    fn names_are_unique() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.by_name.len(), registry.tools.len());
    }

    #[test]
    fn resolves_case_insensitively() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.resolve("List_Databases").unwrap().contract.name, LIST_DATABASES);
        assert_eq!(
            registry.resolve("drop_database").err(),
            Some(ToolError::UnknownOperation("drop_database".into()))
        );
    }

    #[test]
    fn input_schema_lists_required_params() {
        let registry = ToolRegistry::new();
        let schema = registry.resolve(TEXT_SEARCH).unwrap().contract.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["n"]["type"], "integer");
        assert_eq!(schema["properties"]["property"]["type"], "string");
        assert_eq!(
            schema["required"],
            json!(["databaseId", "containerId", "property", "searchPhrase", "n"])
        );

        let empty = registry.resolve(LIST_DATABASES).unwrap().contract.input_schema();
        assert_eq!(empty["properties"], json!({}));
        assert_eq!(empty["required"], json!([]));
    }
}
