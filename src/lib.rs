//! # quire
//!
//! A report traversal engine. A report definition (header, nested groups,
//! crosstab axes, item band, sub-reports) is walked against tabular data as
//! a sequence of immutable states, producing an ordered stream of report
//! events for layout and output consumers.
//!
//! ```ignore
//! use quire::{ReportProcessor, CollectingListener, ItemSum};
//!
//! let processor = ReportProcessor::builder(report)
//!     .with_data_factory(factory)
//!     .with_function(ItemSum::new("total", "Amount"))
//!     .build()?;
//! let mut listener = CollectingListener::new();
//! processor.process(&mut listener)?;
//! ```

pub mod config;
pub mod error;
pub mod expressions;
pub mod functions;
pub mod paginator;
pub mod processor;
pub mod traversal;

pub use config::ProcessingConfig;
pub use error::ProcessingError;
pub use expressions::{FieldExpression, FnExpression};
pub use functions::{
    FunctionRegistry, FunctionScopes, FunctionSpec, GroupCount, ItemCount, ItemSum, PREPARED_PREFIX,
    ReportFunction,
};
pub use paginator::{Page, PaginationSummary, Paginator, PlacedBand};
pub use processor::{PassSummary, ProcessingSummary, ReportProcessor, ReportProcessorBuilder};
pub use traversal::{Checkpoint, ProcessingPass, Step, Traversal};

// Re-export the building blocks so that callers need a single dependency.
pub use quire_definition::{
    Band, BandAddress, DefinitionError, Group, GroupKind, ParameterMapping, ReportDefinition, SubReport,
};
pub use quire_engine::{
    AdvanceHandler, CollectingListener, ProcessState, ReportEvent, ReportListener, ReportProcessingError,
};
pub use quire_flow::{FlowController, StaticDataRow};
pub use quire_source::{JsonTableModel, TableDataFactory};
pub use quire_traits::{
    DataError, DataFactory, DataRow, EvaluationError, ExpressionEvaluator, FunctionStorage,
    InMemoryFunctionStorage, TableModel,
};
pub use quire_types::{EventCode, FunctionStorageKey, InstanceId, ReportStateKey, geometry};
