use quire_definition::DefinitionError;
use quire_flow::FlowError;
use quire_traits::{DataError, EvaluationError};
use thiserror::Error;

/// Errors raised while advancing or committing a process state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportProcessingError {
    #[error("Invalid report structure: {0}")]
    InvalidStructure(#[from] DefinitionError),
    #[error("Data access failed: {0}")]
    Data(#[from] FlowError),
    #[error("No data source for query '{query}': {source}")]
    MissingDataSource {
        query: String,
        #[source]
        source: DataError,
    },
    #[error("Expression evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("Invalid processing state: {0}")]
    InvalidState(String),
    #[error("Report listener failed: {0}")]
    Listener(String),
}

impl ReportProcessingError {
    /// Fatal errors abort the whole traversal. The others concern a single
    /// row or a single consumer and leave the decision to the driver.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReportProcessingError::InvalidStructure(_)
                | ReportProcessingError::MissingDataSource { .. }
                | ReportProcessingError::InvalidState(_)
        )
    }
}

impl From<DataError> for ReportProcessingError {
    fn from(e: DataError) -> Self {
        ReportProcessingError::Data(FlowError::Data(e))
    }
}
