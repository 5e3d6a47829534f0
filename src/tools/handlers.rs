//! Operation handlers
//!
//! One async function per tool. Each validates its arguments, asks the store
//! for pages until it has enough results, and shapes the output. Errors are
//! returned as `ToolError` and folded into a payload by the registry.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

use super::{args::ToolArguments, schema, state::ToolContext};
use crate::{
    error::ToolError,
    store::{DocumentFilter, Query},
};

/// Page size used when a handler wants every result.
const LIST_PAGE_SIZE: usize = 100;
const MAX_DOCUMENTS: i32 = 20;
const MAX_VECTOR_RESULTS: i32 = 50;

/// Letters, digits and underscores, in dot-separated segments.
static PROPERTY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid pattern")
});

pub fn is_valid_property_path(path: &str) -> bool {
    PROPERTY_PATH.is_match(path)
}

fn check_range(name: &str, value: i32, min: i32, max: i32) -> Result<usize, ToolError> {
    if value < min || value > max {
        return Err(ToolError::OutOfRange {
            name: name.to_string(),
            min,
            max,
        });
    }
    Ok(value as usize)
}

/// Drains pages until `limit` documents are collected (or the store runs dry).
async fn collect(ctx: &ToolContext, query: Query, limit: Option<usize>) -> Result<Vec<Value>, ToolError> {
    let mut pages = ctx.store.open(query, limit.unwrap_or(LIST_PAGE_SIZE));
    let mut docs = Vec::new();
    let full = |docs: &Vec<Value>| limit.is_some_and(|n| docs.len() >= n);

    while pages.has_more() && !full(&docs) {
        for doc in pages.next_page().await? {
            docs.push(doc);
            if full(&docs) {
                break;
            }
        }
    }
    Ok(docs)
}

fn ids(docs: Vec<Value>) -> Value {
    docs.into_iter()
        .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(str::to_string))
        .collect::<Vec<_>>()
        .into()
}

pub async fn list_databases(ctx: &ToolContext, _args: &ToolArguments) -> Result<Value, ToolError> {
    tracing::info!("listing databases");
    let databases = collect(ctx, Query::Databases, None).await?;
    tracing::info!(count = databases.len(), "retrieved databases");
    Ok(ids(databases))
}

pub async fn list_collections(ctx: &ToolContext, args: &ToolArguments) -> Result<Value, ToolError> {
    let database_id = args.require_str("databaseId")?;
    tracing::info!(%database_id, "listing collections");

    let containers = collect(ctx, Query::Containers { database_id }, None).await?;
    Ok(ids(containers))
}

pub async fn get_recent_documents(ctx: &ToolContext, args: &ToolArguments) -> Result<Value, ToolError> {
    let database_id = args.require_str("databaseId")?;
    let container_id = args.require_str("containerId")?;
    let n = check_range("n", args.require_int("n")?, 1, MAX_DOCUMENTS)?;
    tracing::info!(%database_id, %container_id, n, "getting recent documents");

    let docs = collect(
        ctx,
        Query::documents(database_id, container_id, DocumentFilter::Recent { top: n }),
        Some(n),
    )
    .await?;
    Ok(Value::Array(docs))
}

pub async fn text_search(ctx: &ToolContext, args: &ToolArguments) -> Result<Value, ToolError> {
    let database_id = args.require_str("databaseId")?;
    let container_id = args.require_str("containerId")?;
    let property = args.require_str("property")?;
    let phrase = args.require_str("searchPhrase")?;
    let n = check_range("n", args.require_int("n")?, 1, MAX_DOCUMENTS)?;

    if !is_valid_property_path(&property) {
        return Err(ToolError::InvalidIdentifier(
            "Invalid property name. Use dot notation with letters, digits, and underscores only (e.g., name or profile.name).".into(),
        ));
    }
    tracing::info!(%database_id, %container_id, %property, n, "text search");

    let filter = DocumentFilter::TextContains {
        property,
        phrase,
        top: n,
    };
    let docs = collect(ctx, Query::documents(database_id, container_id, filter), Some(n)).await?;
    Ok(Value::Array(docs))
}

pub async fn find_document_by_id(ctx: &ToolContext, args: &ToolArguments) -> Result<Value, ToolError> {
    let database_id = args.require_str("databaseId")?;
    let container_id = args.require_str("containerId")?;
    let id = args.require_str("id")?;
    tracing::info!(%database_id, %container_id, %id, "finding document by id");

    let docs = collect(
        ctx,
        Query::documents(database_id, container_id, DocumentFilter::ById { id }),
        Some(1),
    )
    .await?;

    Ok(docs
        .into_iter()
        .next()
        .unwrap_or_else(|| json!({ "message": "No document found with the specified id." })))
}

pub async fn get_approximate_schema(ctx: &ToolContext, args: &ToolArguments) -> Result<Value, ToolError> {
    let database_id = args.require_str("databaseId")?;
    let container_id = args.require_str("containerId")?;
    tracing::info!(%database_id, %container_id, "approximating schema");

    let sample = collect(
        ctx,
        Query::documents(
            database_id,
            container_id,
            DocumentFilter::Sample {
                top: schema::SCHEMA_SAMPLE_SIZE,
            },
        ),
        Some(schema::SCHEMA_SAMPLE_SIZE),
    )
    .await?;
    Ok(schema::approximate(&sample))
}

/// Splits `selectProperties` and validates every entry.
fn select_list(raw: &str) -> Result<Vec<String>, ToolError> {
    if raw.contains('*') {
        return Err(ToolError::InvalidIdentifier(
            "Parameter 'selectProperties' cannot contain '*' wildcard. Please specify explicit property names separated by commas.".into(),
        ));
    }

    let properties: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if properties.is_empty() {
        return Err(ToolError::MissingParameter("selectProperties".into()));
    }

    if let Some(bad) = properties.iter().find(|p| !is_valid_property_path(p)) {
        return Err(ToolError::InvalidIdentifier(format!(
            "Invalid property name '{}' in selectProperties. Use dot notation with letters, digits, and underscores only (e.g., 'id', 'title', 'metadata.author').",
            bad
        )));
    }
    Ok(properties)
}

pub async fn vector_search(ctx: &ToolContext, args: &ToolArguments) -> Result<Value, ToolError> {
    let database_id = args.require_str("databaseId")?;
    let container_id = args.require_str("containerId")?;
    let search_text = args.require_str("searchText")?;
    let vector_property = args.require_str("vectorProperty")?;
    let raw_select = args.require_str("selectProperties")?;
    let top_n = check_range("topN", args.require_int("topN")?, 1, MAX_VECTOR_RESULTS)?;

    let select = select_list(&raw_select)?;
    if !is_valid_property_path(&vector_property) {
        return Err(ToolError::InvalidIdentifier(
            "Invalid vectorProperty name. Use dot notation with letters, digits, and underscores only (e.g., 'vector' or 'embeddings').".into(),
        ));
    }

    // Embed first: a failed embedding never opens a store query.
    let embedder = ctx
        .embedder
        .as_ref()
        .ok_or(ToolError::EmbeddingUnavailable)?;
    let embedding = embedder
        .embed(&search_text, ctx.embedding_dimensions)
        .await
        .map_err(|e| ToolError::EmbeddingFailure(e.to_string()))?;
    tracing::info!(
        %database_id,
        %container_id,
        %vector_property,
        top_n,
        dimensions = embedding.len(),
        "vector search"
    );

    let filter = DocumentFilter::Vector {
        select,
        vector_property,
        embedding,
        top: top_n,
    };
    let docs = collect(ctx, Query::documents(database_id, container_id, filter), Some(top_n)).await?;
    Ok(Value::Array(docs))
}
