pub mod data;
pub mod evaluator;
pub mod storage;

pub use data::{DataError, DataFactory, DataRow, TableModel};
pub use evaluator::{EvaluationError, ExpressionEvaluator};
pub use storage::{FunctionStorage, InMemoryFunctionStorage, StorageError, StoredValues};
