use super::{AdvanceHandler, transition};
use crate::error::ReportProcessingError;
use crate::state::ProcessState;

pub(super) fn begin_subreport(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    Ok(transition(next, AdvanceHandler::BeginReport))
}

/// Publishes the suspended parent. Its own handler has not run yet, so the
/// next advance continues the parent exactly where the sub-report cut in.
pub(super) fn end_subreport(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    next.into_parent()
}
