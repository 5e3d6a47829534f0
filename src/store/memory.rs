//! In-memory document store
//!
//! Evaluates `Query` values structurally against documents held in memory.
//! Used for local runs (seeded from a JSON file) and as the fake behind the
//! integration tests. The data is fixed at construction.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, path::Path};

use super::{DocumentFilter, DocumentStore, PageIterator, Query, StoreError};

type Containers = BTreeMap<String, Vec<Value>>;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    databases: BTreeMap<String, Containers>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `{ "<db>": { "<container>": [docs...] } }`.
    pub fn from_json(seed: Value) -> Result<Self, StoreError> {
        let Value::Object(dbs) = seed else {
            return Err(StoreError::new("seed must be a JSON object of databases", None));
        };

        let mut store = Self::new();
        for (db, containers) in dbs {
            store = store.with_database(&db);
            let Value::Object(containers) = containers else {
                return Err(StoreError::new(
                    format!("database '{}' must map container ids to arrays", db),
                    None,
                ));
            };
            for (container, docs) in containers {
                let Value::Array(docs) = docs else {
                    return Err(StoreError::new(
                        format!("container '{}/{}' must be an array", db, container),
                        None,
                    ));
                };
                store = store.with_documents(&db, &container, docs);
            }
        }
        Ok(store)
    }

    /// Loads a seed file from disk.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::new(format!("reading {}: {}", path.display(), e), None))?;
        let seed: Value = serde_json::from_str(&raw)
            .map_err(|e| StoreError::new(format!("parsing {}: {}", path.display(), e), None))?;
        Self::from_json(seed)
    }

    pub fn with_database(mut self, database_id: &str) -> Self {
        self.databases.entry(database_id.to_string()).or_default();
        self
    }

    pub fn with_documents(mut self, database_id: &str, container_id: &str, docs: Vec<Value>) -> Self {
        self.databases
            .entry(database_id.to_string())
            .or_default()
            .entry(container_id.to_string())
            .or_default()
            .extend(docs);
        self
    }

    fn container(&self, database_id: &str, container_id: &str) -> Result<&[Value], StoreError> {
        let db = self
            .databases
            .get(database_id)
            .ok_or_else(|| StoreError::not_found(format!("database '{}'", database_id)))?;
        db.get(container_id)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::not_found(format!("container '{}/{}'", database_id, container_id)))
    }

    fn evaluate(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        match query {
            Query::Databases => Ok(self.databases.keys().map(|id| id_document(id)).collect()),
            Query::Containers { database_id } => self
                .databases
                .get(database_id)
                .map(|db| db.keys().map(|id| id_document(id)).collect())
                .ok_or_else(|| StoreError::not_found(format!("database '{}'", database_id))),
            Query::Documents {
                database_id,
                container_id,
                filter,
            } => {
                let docs = self.container(database_id, container_id)?;
                Ok(apply_filter(docs, filter))
            }
        }
    }
}

impl DocumentStore for MemoryStore {
    fn open(&self, query: Query, max_page_size: usize) -> Box<dyn PageIterator> {
        let sql = query.to_sql();
        tracing::debug!(sql = %sql.text, parameters = sql.parameters.len(), "evaluating query");
        Box::new(MemoryPages {
            results: self.evaluate(&query),
            page_size: max_page_size.max(1),
            cursor: 0,
        })
    }
}

fn id_document(id: &str) -> Value {
    let mut doc = Map::new();
    doc.insert("id".into(), Value::String(id.to_string()));
    Value::Object(doc)
}

fn apply_filter(docs: &[Value], filter: &DocumentFilter) -> Vec<Value> {
    match filter {
        DocumentFilter::Recent { top } => {
            let mut sorted = docs.to_vec();
            sorted.sort_by(|a, b| timestamp(b).total_cmp(&timestamp(a)));
            sorted.truncate(*top);
            sorted
        }
        DocumentFilter::TextContains {
            property,
            phrase,
            top,
        } => {
            let needle = phrase.to_lowercase();
            docs.iter()
                .filter(|doc| {
                    lookup(doc, property)
                        .and_then(Value::as_str)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
                .take(*top)
                .cloned()
                .collect()
        }
        DocumentFilter::ById { id } => docs
            .iter()
            .filter(|doc| doc.get("id").and_then(Value::as_str) == Some(id.as_str()))
            .cloned()
            .collect(),
        DocumentFilter::Sample { top } => docs.iter().take(*top).cloned().collect(),
        DocumentFilter::Vector {
            select,
            vector_property,
            embedding,
            top,
        } => {
            let mut scored: Vec<(f64, &Value)> = docs
                .iter()
                .filter_map(|doc| {
                    let vector = lookup(doc, vector_property)?.as_array()?;
                    Some((cosine_similarity(embedding, vector)?, doc))
                })
                .collect();
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            scored
                .into_iter()
                .take(*top)
                .map(|(score, doc)| project(doc, select, score))
                .collect()
        }
    }
}

fn timestamp(doc: &Value) -> f64 {
    doc.get("_ts").and_then(Value::as_f64).unwrap_or(f64::MIN)
}

/// Resolves a dotted property path such as `profile.name`.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, segment| node.get(segment))
}

/// Projects `c.a.b` as key `b`, the way the account names projected columns.
fn project(doc: &Value, select: &[String], score: f64) -> Value {
    let mut row = Map::new();
    for path in select {
        if let Some(value) = lookup(doc, path) {
            let key = path.rsplit('.').next().unwrap_or(path);
            row.insert(key.to_string(), value.clone());
        }
    }
    row.insert("_score".into(), Value::from(score));
    Value::Object(row)
}

fn cosine_similarity(query: &[f32], stored: &[Value]) -> Option<f64> {
    if query.len() != stored.len() || query.is_empty() {
        return None;
    }
    let mut dot = 0.0;
    let mut norm_q = 0.0;
    let mut norm_s = 0.0;
    for (q, s) in query.iter().zip(stored) {
        let q = f64::from(*q);
        let s = s.as_f64()?;
        dot += q * s;
        norm_q += q * q;
        norm_s += s * s;
    }
    if norm_q == 0.0 || norm_s == 0.0 {
        return None;
    }
    Some(dot / (norm_q.sqrt() * norm_s.sqrt()))
}

struct MemoryPages {
    results: Result<Vec<Value>, StoreError>,
    page_size: usize,
    cursor: usize,
}

#[async_trait]
impl PageIterator for MemoryPages {
    fn has_more(&self) -> bool {
        match &self.results {
            Ok(docs) => self.cursor < docs.len(),
            // Surface the failure on the first fetch.
            Err(_) => self.cursor == 0,
        }
    }

    async fn next_page(&mut self) -> Result<Vec<Value>, StoreError> {
        match &self.results {
            Ok(docs) => {
                let end = (self.cursor + self.page_size).min(docs.len());
                let page = docs[self.cursor..end].to_vec();
                self.cursor = end;
                Ok(page)
            }
            Err(err) => {
                self.cursor = 1;
                Err(err.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn drain(store: &MemoryStore, query: Query, page: usize) -> Result<Vec<Value>, StoreError> {
        let mut pages = store.open(query, page);
        let mut out = Vec::new();
        while pages.has_more() {
            out.extend(pages.next_page().await?);
        }
        Ok(out)
    }

    fn store() -> MemoryStore {
        MemoryStore::from_json(json!({
            "shop": {
                "orders": [
                    { "id": "1", "_ts": 10, "customer": { "name": "Ada Lovelace" }, "v": [1.0, 0.0] },
                    { "id": "2", "_ts": 30, "customer": { "name": "Alan Turing" }, "v": [0.0, 1.0] },
                    { "id": "3", "_ts": 20, "customer": { "name": "Grace Hopper" }, "v": [0.7, 0.7] }
                ],
                "empty": []
            },
            "archive": {}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn lists_databases_across_pages() {
        let ids = drain(&store(), Query::Databases, 1).await.unwrap();
        assert_eq!(ids, vec![json!({"id": "archive"}), json!({"id": "shop"})]);
    }

    #[tokio::test]
    async fn unknown_database_is_a_404() {
        let err = drain(
            &store(),
            Query::Containers {
                database_id: "missing".into(),
            },
            10,
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code, Some(404));
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let docs = drain(
            &store(),
            Query::documents("shop", "orders", DocumentFilter::Recent { top: 2 }),
            10,
        )
        .await
        .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn text_contains_follows_nested_path() {
        let docs = drain(
            &store(),
            Query::documents(
                "shop",
                "orders",
                DocumentFilter::TextContains {
                    property: "customer.name".into(),
                    phrase: "turing".into(),
                    top: 5,
                },
            ),
            10,
        )
        .await
        .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], "2");
    }

    #[tokio::test]
    async fn vector_ranks_by_similarity_and_projects() {
        let docs = drain(
            &store(),
            Query::documents(
                "shop",
                "orders",
                DocumentFilter::Vector {
                    select: vec!["id".into(), "customer.name".into()],
                    vector_property: "v".into(),
                    embedding: vec![1.0, 0.1],
                    top: 2,
                },
            ),
            10,
        )
        .await
        .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["id"], "1");
        assert_eq!(docs[0]["name"], "Ada Lovelace");
        assert!(docs[0]["_score"].as_f64().unwrap() > docs[1]["_score"].as_f64().unwrap());
        assert!(docs[0].get("v").is_none());
    }

    #[test]
    fn rejects_malformed_seed() {
        assert!(MemoryStore::from_json(json!([1, 2])).is_err());
        assert!(MemoryStore::from_json(json!({"db": {"c": {}}})).is_err());
    }
}
