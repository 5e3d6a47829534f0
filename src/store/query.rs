//! Structured queries and their SQL rendering
//!
//! Handlers describe what they want as a `Query`. A store may evaluate it
//! structurally (see `MemoryStore`) or send the rendered `SqlQuery` to a
//! real account. Search values always travel as parameters; only property
//! paths that passed identifier validation are spliced into the text.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Every database in the account.
    Databases,
    /// Every container in a database.
    Containers { database_id: String },
    /// Documents from a single container.
    Documents {
        database_id: String,
        container_id: String,
        filter: DocumentFilter,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentFilter {
    /// Newest first by ingestion timestamp (`_ts`).
    Recent { top: usize },
    /// Full-text containment on a property path.
    TextContains {
        property: String,
        phrase: String,
        top: usize,
    },
    /// Exact match on `id`.
    ById { id: String },
    /// Unordered sample of documents.
    Sample { top: usize },
    /// Similarity-ordered projection with a `_score` column.
    Vector {
        select: Vec<String>,
        vector_property: String,
        embedding: Vec<f32>,
        top: usize,
    },
}

/// Query text plus named parameters, in the account's SQL dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub text: String,
    pub parameters: Vec<(String, Value)>,
}

impl SqlQuery {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    fn with(mut self, name: &str, value: Value) -> Self {
        self.parameters.push((name.to_string(), value));
        self
    }
}

impl Query {
    pub fn documents(
        database_id: impl Into<String>,
        container_id: impl Into<String>,
        filter: DocumentFilter,
    ) -> Self {
        Query::Documents {
            database_id: database_id.into(),
            container_id: container_id.into(),
            filter,
        }
    }

    pub fn to_sql(&self) -> SqlQuery {
        match self {
            Query::Databases | Query::Containers { .. } => SqlQuery::plain("SELECT * FROM root r"),
            Query::Documents { filter, .. } => filter.to_sql(),
        }
    }
}

impl DocumentFilter {
    pub fn to_sql(&self) -> SqlQuery {
        match self {
            DocumentFilter::Recent { top } => {
                SqlQuery::plain(format!("SELECT TOP {} * FROM c ORDER BY c._ts DESC", top))
            }
            DocumentFilter::TextContains {
                property,
                phrase,
                top,
            } => SqlQuery::plain(format!(
                "SELECT TOP {} * FROM c WHERE FullTextContains(c.{}, @searchPhrase)",
                top, property
            ))
            .with("@searchPhrase", json!(phrase)),
            DocumentFilter::ById { id } => {
                SqlQuery::plain("SELECT * FROM c WHERE c.id = @id").with("@id", json!(id))
            }
            DocumentFilter::Sample { top } => SqlQuery::plain(format!("SELECT TOP {} * FROM c", top)),
            DocumentFilter::Vector {
                select,
                vector_property,
                embedding,
                top,
            } => {
                let columns = select
                    .iter()
                    .map(|p| format!("c.{}", p))
                    .collect::<Vec<_>>()
                    .join(", ");
                SqlQuery::plain(format!(
                    "SELECT TOP @topN {}, VectorDistance(c.{vec}, @embedding) AS _score \
                     FROM c ORDER BY VectorDistance(c.{vec}, @embedding)",
                    columns,
                    vec = vector_property
                ))
                .with("@topN", json!(top))
                .with("@embedding", json!(embedding))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_search_passes_phrase_as_parameter() {
        let sql = DocumentFilter::TextContains {
            property: "profile.name".into(),
            phrase: "x') OR 1=1 --".into(),
            top: 5,
        }
        .to_sql();

        assert_eq!(
            sql.text,
            "SELECT TOP 5 * FROM c WHERE FullTextContains(c.profile.name, @searchPhrase)"
        );
        assert!(!sql.text.contains("OR 1=1"));
        assert_eq!(sql.parameters, vec![("@searchPhrase".into(), json!("x') OR 1=1 --"))]);
    }

    #[test]
    fn vector_query_projects_selected_columns_and_score() {
        let sql = DocumentFilter::Vector {
            select: vec!["id".into(), "metadata.author".into()],
            vector_property: "embedding".into(),
            embedding: vec![0.5, 0.25],
            top: 3,
        }
        .to_sql();

        assert!(sql
            .text
            .starts_with("SELECT TOP @topN c.id, c.metadata.author, VectorDistance(c.embedding, @embedding) AS _score"));
        assert!(sql.text.ends_with("ORDER BY VectorDistance(c.embedding, @embedding)"));
        assert_eq!(sql.parameters[0], ("@topN".into(), json!(3)));
        assert_eq!(sql.parameters[1], ("@embedding".into(), json!([0.5, 0.25])));
    }

    #[test]
    fn recent_orders_by_timestamp() {
        let q = Query::documents("db", "c1", DocumentFilter::Recent { top: 7 });
        assert_eq!(q.to_sql().text, "SELECT TOP 7 * FROM c ORDER BY c._ts DESC");
    }
}
