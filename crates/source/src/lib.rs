//! Tabular data sources for report processing.
//!
//! ## Available Sources
//!
//! - `JsonTableModel`: rows given as JSON objects
//! - `TableDataFactory`: resolves named queries to in-memory tables
//!
//! ## Example
//!
//! ```ignore
//! use quire_source::{JsonTableModel, TableDataFactory};
//! use serde_json::json;
//!
//! let orders = JsonTableModel::from_rows(vec![
//!     json!({"Region": "A", "Amount": 10}),
//!     json!({"Region": "B", "Amount": 20}),
//! ])?;
//! let factory = TableDataFactory::new().with_table("orders", orders);
//! ```

use quire_traits::{DataError, DataFactory, TableModel};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A table backed by a vector of JSON objects.
///
/// The column set is the union of all keys, in first-seen order. A row that
/// lacks a known column reads as `null`.
#[derive(Debug, Clone)]
pub struct JsonTableModel {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl JsonTableModel {
    /// Creates a table from row objects.
    ///
    /// # Errors
    ///
    /// Returns `DataError::ReadFailed` if any row is not a JSON object.
    pub fn from_rows(rows: Vec<Value>) -> Result<Self, DataError> {
        let mut columns: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            match row {
                Value::Object(map) => {
                    for key in map.keys() {
                        if !columns.iter().any(|c| c == key) {
                            columns.push(key.clone());
                        }
                    }
                    objects.push(map);
                }
                other => {
                    return Err(DataError::ReadFailed {
                        source_name: "json".to_string(),
                        message: format!("row {index} is not an object: {other}"),
                    });
                }
            }
        }
        Ok(Self {
            columns,
            rows: objects,
        })
    }

    /// Creates a table from a JSON array of row objects.
    ///
    /// # Errors
    ///
    /// Returns `DataError::ReadFailed` if `value` is not an array of objects.
    pub fn from_value(value: Value) -> Result<Self, DataError> {
        match value {
            Value::Array(rows) => Self::from_rows(rows),
            other => Err(DataError::ReadFailed {
                source_name: "json".to_string(),
                message: format!("expected an array of rows, got {other}"),
            }),
        }
    }

    /// Creates a table with a fixed column set and no rows.
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }
}

impl TableModel for JsonTableModel {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn value_at(&self, row: usize, column: &str) -> Result<Value, DataError> {
        let object = self.rows.get(row).ok_or(DataError::RowOutOfRange {
            row,
            row_count: self.rows.len(),
        })?;
        match object.get(column) {
            Some(value) => Ok(value.clone()),
            None if self.has_column(column) => Ok(Value::Null),
            None => Err(DataError::FieldNotFound(column.to_string())),
        }
    }
}

/// A data factory holding named in-memory tables.
#[derive(Debug, Default, Clone)]
pub struct TableDataFactory {
    tables: HashMap<String, Arc<dyn TableModel>>,
}

impl TableDataFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under the query name `name`.
    pub fn with_table(mut self, name: impl Into<String>, table: impl TableModel + 'static) -> Self {
        self.insert(name, Arc::new(table));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, table: Arc<dyn TableModel>) {
        let name = name.into();
        log::debug!("Registering query '{}' ({} rows)", name, table.row_count());
        self.tables.insert(name, table);
    }

    /// Builds a factory from a JSON object mapping query names to row arrays.
    ///
    /// # Errors
    ///
    /// Returns `DataError::ReadFailed` if `value` is not an object of row arrays.
    pub fn from_json(value: Value) -> Result<Self, DataError> {
        let Value::Object(queries) = value else {
            return Err(DataError::ReadFailed {
                source_name: "json".to_string(),
                message: "expected an object mapping query names to rows".to_string(),
            });
        };
        let mut factory = Self::new();
        for (name, rows) in queries {
            let table = JsonTableModel::from_value(rows).map_err(|e| DataError::ReadFailed {
                source_name: name.clone(),
                message: e.to_string(),
            })?;
            factory.insert(name, Arc::new(table));
        }
        Ok(factory)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl DataFactory for TableDataFactory {
    fn query(&self, name: &str) -> Result<Arc<dyn TableModel>, DataError> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::QueryNotFound(name.to_string()))
    }

    fn name(&self) -> &'static str {
        "TableDataFactory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_table_model() {
        let table = JsonTableModel::from_rows(vec![
            json!({"Region": "A", "Amount": 1}),
            json!({"Region": "B", "Amount": 2, "Note": "late"}),
        ])
        .unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), &["Region", "Amount", "Note"]);
        assert_eq!(table.value_at(1, "Amount").unwrap(), json!(2));
        assert_eq!(table.value_at(0, "Note").unwrap(), Value::Null);
        assert_eq!(
            table.value_at(0, "Missing"),
            Err(DataError::FieldNotFound("Missing".to_string()))
        );
        assert_eq!(
            table.value_at(2, "Region"),
            Err(DataError::RowOutOfRange { row: 2, row_count: 2 })
        );
    }

    #[test]
    fn test_rejects_non_object_rows() {
        assert!(JsonTableModel::from_rows(vec![json!(1)]).is_err());
        assert!(JsonTableModel::from_value(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = JsonTableModel::empty(vec!["Region".to_string()]);
        assert!(table.is_empty());
        assert!(table.has_column("Region"));
    }

    #[test]
    fn test_factory_from_json() {
        let factory = TableDataFactory::from_json(json!({
            "orders": [{"id": 1}, {"id": 2}],
            "lines": []
        }))
        .unwrap();

        assert_eq!(factory.len(), 2);
        assert_eq!(factory.query("orders").unwrap().row_count(), 2);
        assert!(factory.query("lines").unwrap().is_empty());
        assert_eq!(
            factory.query("nope").unwrap_err(),
            DataError::QueryNotFound("nope".to_string())
        );
    }
}
