//! Expression evaluators usable from code and configuration.

use quire_traits::{DataRow, EvaluationError, ExpressionEvaluator};
use serde_json::Value;
use std::fmt;

type EvalFn = dyn Fn(&dyn DataRow) -> Result<Value, EvaluationError> + Send + Sync;

/// An expression backed by a closure.
pub struct FnExpression {
    name: String,
    eval: Box<EvalFn>,
}

impl FnExpression {
    pub fn new<F>(name: impl Into<String>, eval: F) -> Self
    where
        F: Fn(&dyn DataRow) -> Result<Value, EvaluationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            eval: Box::new(eval),
        }
    }
}

impl fmt::Debug for FnExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExpression").field("name", &self.name).finish_non_exhaustive()
    }
}

impl ExpressionEvaluator for FnExpression {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, row: &dyn DataRow) -> Result<Value, EvaluationError> {
        (self.eval)(row)
    }
}

/// Copies a field of the row under another name.
#[derive(Debug, Clone)]
pub struct FieldExpression {
    name: String,
    field: String,
}

impl FieldExpression {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }
}

impl ExpressionEvaluator for FieldExpression {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, row: &dyn DataRow) -> Result<Value, EvaluationError> {
        row.get(&self.field).map_err(|source| EvaluationError::Data {
            expression: self.name.clone(),
            source,
        })
    }
}
