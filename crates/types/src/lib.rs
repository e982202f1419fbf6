pub mod event;
pub mod geometry;
pub mod ids;

pub use event::EventCode;
pub use geometry::{StrictBounds, StrictDimension, StrictPoint};
pub use ids::{FunctionStorageKey, InstanceId, ReportStateKey};
