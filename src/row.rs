//! Result rows
//!
//! Rows are dynamically shaped JSON documents. The cursor never looks inside
//! them; these accessors exist for callers.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// A single row of a result set.
///
/// # Example
///
/// ```rust
/// use reql_cursor::Row;
/// use serde_json::json;
///
/// let row = Row::new(json!({"id": 1, "name": "Alice"}));
/// assert_eq!(row.get_i64("id"), Some(1));
/// assert_eq!(row.get_str("name"), Some("Alice"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Row(Value);

impl Row {
    /// Wrap a decoded value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Get a field of an object row
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a string field
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Get an integer field
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Get a float field
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Get a boolean field
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Borrow the underlying value
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the underlying value
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Deserialize the row into a typed value
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.0.clone()).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

impl From<Value> for Row {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Row> for Value {
    fn from(row: Row) -> Self {
        row.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        let row = Row::new(json!({"id": 3, "score": 1.5, "active": true, "name": "x"}));
        assert_eq!(row.get_i64("id"), Some(3));
        assert_eq!(row.get_f64("score"), Some(1.5));
        assert_eq!(row.get_bool("active"), Some(true));
        assert_eq!(row.get_str("name"), Some("x"));
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_scalar_row() {
        let row = Row::from(json!(42));
        assert!(row.get("id").is_none());
        assert_eq!(row.as_value(), &json!(42));
        assert_eq!(Value::from(row), json!(42));
    }

    #[test]
    fn test_deserialize() {
        let row = Row::new(json!([1, "a"]));
        let pair: (i64, String) = row.deserialize().unwrap();
        assert_eq!(pair, (1, "a".to_string()));
        assert!(row.deserialize::<bool>().is_err());
    }
}
