use super::{AdvanceHandler, begin_handler_for, group_at, transition};
use crate::error::ReportProcessingError;
use crate::state::ProcessState;

/// The report header is done: open the outermost group, or go straight to the
/// items of a report without groups.
pub(super) fn begin_report(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let handler = match group_at(&next, 0) {
        Some((kind, _)) => begin_handler_for(kind),
        None => AdvanceHandler::BeginItems,
    };
    Ok(transition(next, handler))
}

pub(super) fn end_report(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let handler = if next.is_subreport() {
        AdvanceHandler::EndSubReport
    } else {
        log::debug!("Report '{}' finished", next.report().name);
        AdvanceHandler::Finish
    };
    Ok(transition(next, handler))
}
