//! Tool argument coercion
//!
//! Raw `params.arguments` objects are tagged once, at the protocol boundary,
//! into `ArgValue`s. Handlers then pull typed values out through the strict
//! accessors below; nothing downstream inspects JSON types again.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::ToolError;

/// A single dynamically typed argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Int(i32),
    /// Anything else, kept as its JSON text.
    Raw(String),
}

impl From<&Value> for ArgValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => ArgValue::Text(s.clone()),
            Value::Number(n) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(ArgValue::Int)
                .unwrap_or_else(|| ArgValue::Raw(n.to_string())),
            other => ArgValue::Raw(other.to_string()),
        }
    }
}

/// Arguments for one invocation, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: HashMap<String, ArgValue>,
}

impl ToolArguments {
    /// Tags every member of a JSON object. Anything that is not an object
    /// yields an empty argument set.
    pub fn from_json(raw: &Value) -> Self {
        let values = raw
            .as_object()
            .map(|obj| {
                obj.iter()
                    .map(|(k, v)| (k.clone(), ArgValue::from(v)))
                    .collect()
            })
            .unwrap_or_default();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A required, non-blank string. Integers are accepted in their decimal form.
    pub fn require_str(&self, name: &str) -> Result<String, ToolError> {
        match self.values.get(name) {
            None => Err(ToolError::MissingParameter(name.to_string())),
            Some(ArgValue::Text(s)) if s.trim().is_empty() => {
                Err(ToolError::MissingParameter(name.to_string()))
            }
            Some(ArgValue::Text(s)) => Ok(s.clone()),
            Some(ArgValue::Int(i)) => Ok(i.to_string()),
            Some(ArgValue::Raw(_)) => Err(ToolError::InvalidParameterType {
                name: name.to_string(),
                expected: "a string",
            }),
        }
    }

    /// A required 32-bit integer, given natively or as a numeric string.
    pub fn require_int(&self, name: &str) -> Result<i32, ToolError> {
        match self.values.get(name) {
            None => Err(ToolError::MissingParameter(name.to_string())),
            Some(value) => int_value(name, value),
        }
    }

    /// An optional 32-bit integer falling back to `default` when absent.
    pub fn optional_int(&self, name: &str, default: i32) -> Result<i32, ToolError> {
        match self.values.get(name) {
            None => Ok(default),
            Some(value) => int_value(name, value),
        }
    }
}

fn int_value(name: &str, value: &ArgValue) -> Result<i32, ToolError> {
    match value {
        ArgValue::Int(i) => Ok(*i),
        ArgValue::Text(s) => s.trim().parse().map_err(|_| ToolError::InvalidParameterType {
            name: name.to_string(),
            expected: "an integer",
        }),
        ArgValue::Raw(_) => Err(ToolError::InvalidParameterType {
            name: name.to_string(),
            expected: "an integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_values_once() {
        let args = ToolArguments::from_json(&json!({
            "s": "text",
            "i": 7,
            "big": 9_999_999_999_i64,
            "f": 1.5,
            "b": true,
            "o": { "k": 1 }
        }));

        assert_eq!(args.get("s"), Some(&ArgValue::Text("text".into())));
        assert_eq!(args.get("i"), Some(&ArgValue::Int(7)));
        assert_eq!(args.get("big"), Some(&ArgValue::Raw("9999999999".into())));
        assert_eq!(args.get("f"), Some(&ArgValue::Raw("1.5".into())));
        assert_eq!(args.get("b"), Some(&ArgValue::Raw("true".into())));
        assert_eq!(args.len(), 6);
    }

    #[test]
    fn non_object_arguments_are_empty() {
        assert!(ToolArguments::from_json(&Value::Null).is_empty());
        assert!(ToolArguments::from_json(&json!([1, 2])).is_empty());
    }

    #[test]
    fn strict_strings() {
        let args = ToolArguments::from_json(&json!({ "a": "db", "blank": "  ", "n": 3, "o": {} }));
        assert_eq!(args.require_str("a").unwrap(), "db");
        assert_eq!(args.require_str("n").unwrap(), "3");
        assert_eq!(
            args.require_str("missing"),
            Err(ToolError::MissingParameter("missing".into()))
        );
        assert_eq!(
            args.require_str("blank"),
            Err(ToolError::MissingParameter("blank".into()))
        );
        assert!(matches!(
            args.require_str("o"),
            Err(ToolError::InvalidParameterType { .. })
        ));
    }

    #[test]
    fn integers_from_numbers_and_strings() {
        let args = ToolArguments::from_json(&json!({ "a": 5, "b": " 12 ", "c": "x", "d": 2.5 }));
        assert_eq!(args.require_int("a").unwrap(), 5);
        assert_eq!(args.require_int("b").unwrap(), 12);
        assert!(matches!(
            args.require_int("c"),
            Err(ToolError::InvalidParameterType { .. })
        ));
        assert!(matches!(
            args.require_int("d"),
            Err(ToolError::InvalidParameterType { .. })
        ));
        assert_eq!(
            args.require_int("e"),
            Err(ToolError::MissingParameter("e".into()))
        );
    }

    #[test]
    fn optional_integers_default_only_when_absent() {
        let args = ToolArguments::from_json(&json!({ "n": "4", "bad": "four" }));
        assert_eq!(args.optional_int("n", 10).unwrap(), 4);
        assert_eq!(args.optional_int("absent", 10).unwrap(), 10);
        assert!(args.optional_int("bad", 10).is_err());
    }
}
