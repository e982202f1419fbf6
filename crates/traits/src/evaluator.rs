use crate::data::{DataError, DataRow};
use serde_json::Value;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Expression '{expression}' failed: {message}")]
    Failed { expression: String, message: String },

    #[error("Expression '{expression}' could not read its input: {source}")]
    Data {
        expression: String,
        #[source]
        source: DataError,
    },
}

/// Computes one named value from the current data row.
///
/// The driver evaluates every registered expression between traversal steps
/// and stacks the results as virtual columns over the row.
pub trait ExpressionEvaluator: Send + Sync + Debug {
    /// The column name the result is published under.
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Any failure is surfaced to the driver unchanged; rows are never skipped.
    fn evaluate(&self, row: &dyn DataRow) -> Result<Value, EvaluationError>;
}
