use super::{AdvanceHandler, transition};
use crate::error::ReportProcessingError;
use crate::state::ProcessState;

pub(super) fn begin_items(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let handler = if !next.flow_controller().master_row().is_empty() {
        AdvanceHandler::ProcessItems
    } else if next.report().no_data_band.is_some() {
        AdvanceHandler::NoData
    } else {
        AdvanceHandler::EndItems
    };
    Ok(transition(next, handler))
}

/// Stays on the item band while the next row belongs to the same innermost
/// group. The look-ahead is only kept when it does.
pub(super) fn process_items(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    advance_row(next, AdvanceHandler::ProcessItems, AdvanceHandler::EndItems)
}

pub(super) fn no_data(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    Ok(transition(next, AdvanceHandler::EndItems))
}

pub(super) fn end_items(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let handler = if next.is_before_first_group() {
        AdvanceHandler::EndReport
    } else {
        AdvanceHandler::EndGroup
    };
    Ok(transition(next, handler))
}

/// Shared by the relational item band and crosstab cells.
pub(super) fn advance_row(
    mut next: ProcessState,
    stay: AdvanceHandler,
    finish: AdvanceHandler,
) -> Result<ProcessState, ReportProcessingError> {
    let flow = next.flow_controller();
    if !flow.is_advanceable() {
        return Ok(transition(next, finish));
    }
    let advanced = flow.perform_commit()?;
    if next.is_last_item_in_group(next.current_group_index(), &advanced)? {
        return Ok(transition(next, finish));
    }
    next.set_flow_controller(advanced);
    Ok(transition(next, stay))
}
