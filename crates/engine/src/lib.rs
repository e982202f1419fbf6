//! Report traversal engine.
//!
//! A traversal is a sequence of immutable [`ProcessState`]s. Each step asks
//! the current state for a candidate (`advance`), describes the step as a
//! [`ReportEvent`], and publishes the candidate once its handler has chosen a
//! successor (`commit`). Events are delivered only after the commit succeeded,
//! together with the row of the candidate. Because published states are never
//! changed, any of them can be kept and resumed later.
//!
//! ```ignore
//! let mut state = ProcessState::initial(report, factory)?;
//! while !state.is_finish() {
//!     let candidate = state.advance()?;
//!     let step = candidate.clone();
//!     state = candidate.commit()?;
//!     listener.report_event(&step.create_event(), &step.data_row())?;
//! }
//! ```

pub mod error;
pub mod event;
pub mod handlers;
pub mod listener;
pub mod state;

pub use error::ReportProcessingError;
pub use event::ReportEvent;
pub use handlers::AdvanceHandler;
pub use listener::{CollectingListener, ReportListener};
pub use state::{BEFORE_FIRST_GROUP, ProcessState};
