//! Approximate container schema from a document sample

use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Upper bound on documents inspected per schema request.
pub const SCHEMA_SAMPLE_SIZE: usize = 10;

#[derive(Default)]
struct PropertyStats {
    name: String,
    kinds: BTreeSet<&'static str>,
    appearances: usize,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::Null => "null",
    }
}

/// Unions the top-level properties of the sampled documents.
///
/// Non-object rows are skipped and do not count towards the sample size.
/// Property names are merged case-insensitively; the first spelling seen wins.
pub fn approximate(docs: &[Value]) -> Value {
    let mut stats: BTreeMap<String, PropertyStats> = BTreeMap::new();
    let mut sample_size = 0;

    for doc in docs.iter().filter_map(Value::as_object).take(SCHEMA_SAMPLE_SIZE) {
        sample_size += 1;
        let mut seen = HashSet::new();
        for (name, value) in doc {
            let key = name.to_lowercase();
            let entry = stats.entry(key.clone()).or_insert_with(|| PropertyStats {
                name: name.clone(),
                ..PropertyStats::default()
            });
            entry.kinds.insert(kind_of(value));
            if seen.insert(key) {
                entry.appearances += 1;
            }
        }
    }

    if sample_size == 0 {
        return json!({ "message": "No documents found to infer schema." });
    }

    let properties: Vec<Value> = stats
        .into_values()
        .map(|p| {
            json!({
                "name": p.name,
                "type": p.kinds.into_iter().collect::<Vec<_>>().join(" | "),
                "description": format!("Appears in {}/{} sampled documents.", p.appearances, sample_size),
            })
        })
        .collect();

    json!({ "sampleSize": sample_size, "properties": properties })
}
