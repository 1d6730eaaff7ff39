//! Scalar values and records moved by a transfer

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A scalar value read from either endpoint kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit unsigned integer (values above `i64::MAX`)
    UInt64(u64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Render the value as a flat-file field; NULL becomes an empty field
    pub fn to_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Convert a decoded JSON value; nested arrays and objects are kept as JSON text
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else if let Some(f) = n.as_f64() {
                    Value::Float64(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// One transferred row, keyed by column name in projection order
pub type Record = IndexMap<String, Value>;

/// Build a record from `(column, value)` pairs
pub fn record<K, V, I>(pairs: I) -> Record
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from_json(serde_json::json!(42)), Value::Int64(42));
        assert_eq!(
            Value::from_json(serde_json::json!(u64::MAX)),
            Value::UInt64(u64::MAX)
        );
        assert_eq!(Value::from_json(serde_json::json!(1.5)), Value::Float64(1.5));
    }

    #[test]
    fn test_from_json_nested_becomes_text() {
        let v = Value::from_json(serde_json::json!([1, 2]));
        assert_eq!(v, Value::String("[1,2]".to_string()));
    }

    #[test]
    fn test_to_field() {
        assert_eq!(Value::Null.to_field(), "");
        assert_eq!(Value::Bool(true).to_field(), "true");
        assert_eq!(Value::from("x").to_field(), "x");
    }

    #[test]
    fn test_record_keeps_order_and_serializes_plain() {
        let r = record([("b", Value::Int64(1)), ("a", Value::Null)]);
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"b":1,"a":null}"#);
    }
}
