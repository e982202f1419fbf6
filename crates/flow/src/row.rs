use indexmap::IndexMap;
use quire_traits::{DataError, DataRow, TableModel};
use serde_json::Value;
use std::sync::Arc;

/// An ordered set of named values.
///
/// Used for parameters, function results and expression results: every value
/// that is computed rather than read from the source table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticDataRow {
    values: IndexMap<String, Value>,
}

impl StaticDataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Sets `name`, keeping its original position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_values(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl From<IndexMap<String, Value>> for StaticDataRow {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

impl DataRow for StaticDataRow {
    fn lookup(&self, name: &str) -> Result<Option<Value>, DataError> {
        Ok(self.values.get(name).cloned())
    }

    fn field_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// One row of a table model, or no row at all for an empty table.
#[derive(Debug, Clone)]
pub struct TableDataRow {
    table: Arc<dyn TableModel>,
    cursor: Option<usize>,
}

impl TableDataRow {
    pub fn new(table: Arc<dyn TableModel>, cursor: Option<usize>) -> Self {
        Self { table, cursor }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }
}

impl DataRow for TableDataRow {
    fn lookup(&self, name: &str) -> Result<Option<Value>, DataError> {
        if !self.table.has_column(name) {
            return Ok(None);
        }
        match self.cursor {
            Some(row) => self.table.value_at(row, name).map(Some),
            None => Ok(Some(Value::Null)),
        }
    }

    fn field_names(&self) -> Vec<String> {
        self.table.column_names().to_vec()
    }
}

/// An override row stacked in front of a wrapped row.
///
/// Lookups consult the overrides first and fall through to the base row, so
/// computed columns can shadow source columns without touching the source.
#[derive(Debug, Clone)]
pub struct CompoundDataRow<O, B> {
    overrides: O,
    base: B,
}

impl<O: DataRow, B: DataRow> CompoundDataRow<O, B> {
    pub fn new(overrides: O, base: B) -> Self {
        Self { overrides, base }
    }

    pub fn overrides(&self) -> &O {
        &self.overrides
    }

    pub fn base(&self) -> &B {
        &self.base
    }
}

impl<O: DataRow, B: DataRow> DataRow for CompoundDataRow<O, B> {
    fn lookup(&self, name: &str) -> Result<Option<Value>, DataError> {
        match self.overrides.lookup(name)? {
            Some(value) => Ok(Some(value)),
            None => self.base.lookup(name),
        }
    }

    fn field_names(&self) -> Vec<String> {
        let mut names = self.overrides.field_names();
        for name in self.base.field_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_source::JsonTableModel;
    use serde_json::json;

    fn table() -> Arc<dyn TableModel> {
        Arc::new(
            JsonTableModel::from_rows(vec![
                json!({"Region": "A", "Amount": 10}),
                json!({"Region": "B", "Amount": 20}),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_static_row_keeps_insertion_order() {
        let mut row = StaticDataRow::from_pairs([("b", json!(1)), ("a", json!(2))]);
        row.set("b", json!(3));
        assert_eq!(row.field_names(), vec!["b", "a"]);
        assert_eq!(row.get("b").unwrap(), json!(3));
        assert_eq!(
            row.get("c"),
            Err(DataError::FieldNotFound("c".to_string()))
        );
    }

    #[test]
    fn test_table_row_reads_cursor() {
        let row = TableDataRow::new(table(), Some(1));
        assert_eq!(row.get("Region").unwrap(), json!("B"));
        assert_eq!(row.lookup("Other").unwrap(), None);
    }

    #[test]
    fn test_table_row_without_cursor_reads_null() {
        let row = TableDataRow::new(table(), None);
        assert_eq!(row.get("Amount").unwrap(), Value::Null);
    }

    #[test]
    fn test_compound_row_prefers_overrides() {
        let overrides = StaticDataRow::from_pairs([("Amount", json!(99)), ("total", json!(30))]);
        let row = CompoundDataRow::new(overrides, TableDataRow::new(table(), Some(0)));

        assert_eq!(row.get("Amount").unwrap(), json!(99));
        assert_eq!(row.get("total").unwrap(), json!(30));
        assert_eq!(row.get("Region").unwrap(), json!("A"));
        assert_eq!(row.field_names(), vec!["Amount", "total", "Region"]);
        assert!(matches!(row.get("nope"), Err(DataError::FieldNotFound(_))));
    }

    #[test]
    fn test_compound_rows_nest_by_reference() {
        let functions = StaticDataRow::from_pairs([("count", json!(1))]);
        let params = StaticDataRow::from_pairs([("Region", json!("override"))]);
        let base = TableDataRow::new(table(), Some(0));
        let inner = CompoundDataRow::new(&params, &base);
        let outer = CompoundDataRow::new(&functions, &inner);

        assert_eq!(outer.get("count").unwrap(), json!(1));
        assert_eq!(outer.get("Region").unwrap(), json!("override"));
        assert_eq!(outer.get("Amount").unwrap(), json!(10));
    }
}
