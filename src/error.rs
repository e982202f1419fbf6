// src/error.rs
use quire_definition::DefinitionError;
use quire_engine::ReportProcessingError;
use quire_traits::{DataError, EvaluationError, StorageError};
use thiserror::Error;

/// The error type of the processor, the passes and the CLI.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Report processing failed: {0}")]
    Report(#[from] ReportProcessingError),

    #[error("Invalid report definition: {0}")]
    Definition(#[from] DefinitionError),

    #[error("Data source error: {0}")]
    Data(#[from] DataError),

    #[error("Function storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EvaluationError> for ProcessingError {
    fn from(e: EvaluationError) -> Self {
        ProcessingError::Report(ReportProcessingError::Evaluation(e))
    }
}

impl ProcessingError {
    /// `true` unless the failure is confined to a single row or consumer.
    pub fn is_fatal(&self) -> bool {
        match self {
            ProcessingError::Report(e) => e.is_fatal(),
            ProcessingError::Data(_) => false,
            _ => true,
        }
    }
}
