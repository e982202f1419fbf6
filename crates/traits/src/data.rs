//! Tabular data contracts.
//!
//! The engine only ever reads rows forward, one at a time. Sources are
//! read-only from its point of view.

use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Error type for data access.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Field not found: '{0}'")]
    FieldNotFound(String),

    #[error("Row {row} is out of range for a table of {row_count} rows")]
    RowOutOfRange { row: usize, row_count: usize },

    #[error("Query not found: '{0}'")]
    QueryNotFound(String),

    #[error("Failed to read data from '{source_name}': {message}")]
    ReadFailed { source_name: String, message: String },
}

/// A table of rows addressed by index and columns addressed by name.
pub trait TableModel: Send + Sync + Debug {
    /// Number of rows in the table.
    fn row_count(&self) -> usize;

    /// Column names, in declaration order.
    fn column_names(&self) -> &[String];

    /// Reads one cell.
    ///
    /// # Errors
    ///
    /// `DataError::RowOutOfRange` for an invalid row, `DataError::FieldNotFound`
    /// for an unknown column, or any source-specific read failure.
    fn value_at(&self, row: usize, column: &str) -> Result<Value, DataError>;

    fn has_column(&self, name: &str) -> bool {
        self.column_names().iter().any(|c| c == name)
    }

    fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}

/// Resolves named queries into tables.
///
/// The top-level report and every sub-report name the query they read; the
/// factory is the only place where those names meet actual data.
pub trait DataFactory: Send + Sync + Debug {
    /// # Errors
    ///
    /// `DataError::QueryNotFound` when the factory does not know `name`.
    fn query(&self, name: &str) -> Result<Arc<dyn TableModel>, DataError>;

    /// Returns a human-readable name for this factory (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// A named-field view over the current logical row.
pub trait DataRow: Debug {
    /// Looks up a field, returning `Ok(None)` when no layer defines it.
    ///
    /// # Errors
    ///
    /// Propagates read failures of the underlying source.
    fn lookup(&self, name: &str) -> Result<Option<Value>, DataError>;

    /// All visible field names. Shadowed names appear once.
    fn field_names(&self) -> Vec<String>;

    /// Looks up a field that must exist.
    ///
    /// # Errors
    ///
    /// `DataError::FieldNotFound` when no layer defines `name`.
    fn get(&self, name: &str) -> Result<Value, DataError> {
        self.lookup(name)?
            .ok_or_else(|| DataError::FieldNotFound(name.to_string()))
    }
}

impl<T: DataRow + ?Sized> DataRow for &T {
    fn lookup(&self, name: &str) -> Result<Option<Value>, DataError> {
        (**self).lookup(name)
    }

    fn field_names(&self) -> Vec<String> {
        (**self).field_names()
    }
}

impl<T: DataRow + ?Sized> DataRow for Arc<T> {
    fn lookup(&self, name: &str) -> Result<Option<Value>, DataError> {
        (**self).lookup(name)
    }

    fn field_names(&self) -> Vec<String> {
        (**self).field_names()
    }
}
