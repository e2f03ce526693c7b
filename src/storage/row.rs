//! Result rows returned by the query primitives.
//!
//! A [`Row`] is a detached copy of one result row: column names plus the
//! values the engine produced. Rows never hold a borrow on the engine, so
//! they can outlive the statement and the lock that produced them.
//!
//! A statement may yield the same column name twice (`SELECT a.id, b.id`).
//! Lookups by name always resolve to the first such column; later ones are
//! reachable only by position through [`Row::values`].

use crate::error::{Error, Result};
use rusqlite::types::{FromSql, Value, ValueRef};
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// One result row, columns in statement order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Column names in statement order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw values in statement order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a column by name. The first column with that name wins.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Typed value of a column by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the column is missing or the value does
    /// not convert to `T`.
    pub fn get<T: FromSql>(&self, column: &str) -> Result<T> {
        let value = self.value(column).ok_or_else(|| Error::Decode {
            column: column.to_string(),
            message: "no such column in result".to_string(),
        })?;

        T::column_result(ValueRef::from(value)).map_err(|e| Error::Decode {
            column: column.to_string(),
            message: e.to_string(),
        })
    }

    /// Convert to a JSON object keyed by column name.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.named()
            .map(|(c, v)| (c.clone(), value_to_json(v)))
            .collect()
    }

    /// Columns addressable by name, skipping repeated names.
    fn named(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.columns
            .iter()
            .zip(&self.values)
            .enumerate()
            .filter(move |(idx, (column, _))| !self.columns[..*idx].contains(*column))
            .map(|(_, entry)| entry)
    }

    /// Decode the row into any serde-deserializable type, matching fields
    /// by column name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the row shape does not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(serde_json::Value::Object(self.to_json())).map_err(|e| {
            Error::Decode {
                column: self.columns.join(","),
                message: e.to_string(),
            }
        })
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (column, value) in self.named() {
            map.serialize_entry(column, &value_to_json(value))?;
        }
        map.end()
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        // NaN and infinities have no JSON form
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}

/// Outcome of a mutation issued through `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RunResult {
    /// Rows inserted, updated or deleted by the statement.
    pub changes: usize,
    /// Rowid of the most recent successful insert on the engine.
    pub last_insert_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn sample() -> Row {
        Row::new(
            Arc::from(vec!["id".to_string(), "name".to_string(), "budget".to_string()]),
            vec![
                Value::Integer(3),
                Value::Text("Bridge Audit".to_string()),
                Value::Null,
            ],
        )
    }

    #[test]
    fn test_typed_get() {
        let row = sample();
        assert_eq!(row.get::<i64>("id").unwrap(), 3);
        assert_eq!(row.get::<String>("name").unwrap(), "Bridge Audit");
        assert_eq!(row.get::<Option<f64>>("budget").unwrap(), None);
    }

    #[test]
    fn test_get_missing_column_is_decode_error() {
        let err = sample().get::<i64>("owner").unwrap_err();
        assert!(matches!(err, Error::Decode { ref column, .. } if column == "owner"));
    }

    #[test]
    fn test_get_wrong_type_is_decode_error() {
        assert!(sample().get::<i64>("name").is_err());
    }

    #[test]
    fn test_decode_into_struct() {
        #[derive(Deserialize)]
        struct Partial {
            id: i64,
            name: String,
            budget: Option<f64>,
        }

        let p: Partial = sample().decode().unwrap();
        assert_eq!(p.id, 3);
        assert_eq!(p.name, "Bridge Audit");
        assert!(p.budget.is_none());
    }

    #[test]
    fn test_repeated_column_name_resolves_to_first() {
        #[derive(Deserialize)]
        struct Joined {
            id: i64,
        }

        let row = Row::new(
            Arc::from(vec!["id".to_string(), "id".to_string()]),
            vec![Value::Integer(1), Value::Integer(2)],
        );

        assert_eq!(row.value("id"), Some(&Value::Integer(1)));
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
        assert_eq!(row.to_json()["id"], 1);
        assert_eq!(row.decode::<Joined>().unwrap().id, 1);
        assert_eq!(serde_json::to_value(&row).unwrap(), serde_json::json!({ "id": 1 }));
        assert_eq!(row.values()[1], Value::Integer(2));
    }

    #[test]
    fn test_serialize_keeps_column_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["name"], "Bridge Audit");
        assert!(json["budget"].is_null());
    }
}
