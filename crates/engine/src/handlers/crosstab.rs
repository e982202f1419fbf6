//! Crosstab axes: row axes nest inside a relational group or another row
//! axis, column axes nest inside the innermost row axis or another column
//! axis, and the cells sit below the innermost column axis.

use super::items::advance_row;
use super::{AdvanceHandler, group_at, transition};
use crate::error::ReportProcessingError;
use crate::state::ProcessState;
use quire_definition::{DefinitionError, GroupKind};

/// The entered axis group, rejected if it is the outermost group.
fn entered_axis(next: &ProcessState) -> Result<String, ReportProcessingError> {
    let index = next.current_group_index();
    let (_, name) = group_at(next, index).ok_or_else(|| {
        ReportProcessingError::InvalidState(format!("no group at index {index}"))
    })?;
    if index == 0 {
        return Err(DefinitionError::AxisAsRootGroup(name).into());
    }
    Ok(name)
}

pub(super) fn begin_row_axis(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let name = entered_axis(&next)?;
    let index = next.current_group_index();
    if let Some((GroupKind::CrosstabColumn, _)) = group_at(&next, index - 1) {
        return Err(DefinitionError::ColumnAxisOutsideRowAxis(name).into());
    }
    let handler = match group_at(&next, index + 1) {
        Some((GroupKind::CrosstabRow, _)) => AdvanceHandler::BeginCrosstabRowAxis,
        Some((GroupKind::CrosstabColumn, _)) => AdvanceHandler::BeginCrosstabColumnAxis,
        Some((GroupKind::Relational, inner)) => {
            return Err(DefinitionError::RelationalInsideCrosstab(inner).into());
        }
        None => return Err(DefinitionError::UnpairedRowAxis(name).into()),
    };
    Ok(transition(next, handler))
}

pub(super) fn begin_column_axis(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let name = entered_axis(&next)?;
    let index = next.current_group_index();
    if let Some((GroupKind::Relational, _)) = group_at(&next, index - 1) {
        return Err(DefinitionError::ColumnAxisOutsideRowAxis(name).into());
    }
    let handler = match group_at(&next, index + 1) {
        Some((GroupKind::CrosstabColumn, _)) => AdvanceHandler::BeginCrosstabColumnAxis,
        Some((GroupKind::CrosstabRow, inner)) => {
            return Err(DefinitionError::ColumnAxisOutsideRowAxis(inner).into());
        }
        Some((GroupKind::Relational, inner)) => {
            return Err(DefinitionError::RelationalInsideCrosstab(inner).into());
        }
        None if next.flow_controller().master_row().is_empty() => {
            AdvanceHandler::EndCrosstabColumnAxis
        }
        None => AdvanceHandler::ProcessCrosstabCell,
    };
    Ok(transition(next, handler))
}

pub(super) fn process_cell(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    advance_row(
        next,
        AdvanceHandler::ProcessCrosstabCell,
        AdvanceHandler::EndCrosstabColumnAxis,
    )
}

/// Joins a finished column axis back into its parent: either the parent
/// breaks and its body finishes, or the next row reopens this axis.
pub(super) fn join_end_column_axis(mut next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let ended = group_at(&next, next.current_group_index()).map(|(_, name)| name);
    next.leave_group()?;
    let parent = next.current_group_index();
    let Some((parent_kind, _)) = group_at(&next, parent) else {
        return Err(DefinitionError::AxisAsRootGroup(ended.unwrap_or_default()).into());
    };
    let finished = match parent_kind {
        GroupKind::CrosstabRow => AdvanceHandler::EndCrosstabRowBody,
        GroupKind::CrosstabColumn => AdvanceHandler::EndCrosstabColumnBody,
        GroupKind::Relational => {
            return Err(DefinitionError::ColumnAxisOutsideRowAxis(ended.unwrap_or_default()).into());
        }
    };
    reopen_or_finish(next, parent, AdvanceHandler::BeginCrosstabColumnAxis, finished)
}

/// Joins a finished row axis back into its parent, which is either another
/// row axis or the relational group hosting the crosstab.
pub(super) fn join_end_row_axis(mut next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let ended = group_at(&next, next.current_group_index()).map(|(_, name)| name);
    next.leave_group()?;
    let parent = next.current_group_index();
    let Some((parent_kind, _)) = group_at(&next, parent) else {
        return Err(DefinitionError::AxisAsRootGroup(ended.unwrap_or_default()).into());
    };
    let finished = match parent_kind {
        GroupKind::CrosstabRow => AdvanceHandler::EndCrosstabRowBody,
        GroupKind::Relational => AdvanceHandler::EndGroup,
        GroupKind::CrosstabColumn => {
            return Err(DefinitionError::ColumnAxisOutsideRowAxis(ended.unwrap_or_default()).into());
        }
    };
    reopen_or_finish(next, parent, AdvanceHandler::BeginCrosstabRowAxis, finished)
}

fn reopen_or_finish(
    mut next: ProcessState,
    parent: i32,
    reopen: AdvanceHandler,
    finished: AdvanceHandler,
) -> Result<ProcessState, ReportProcessingError> {
    let flow = next.flow_controller();
    if !flow.is_advanceable() {
        return Ok(transition(next, finished));
    }
    let advanced = flow.perform_commit()?;
    if next.is_last_item_in_group(parent, &advanced)? {
        return Ok(transition(next, finished));
    }
    next.set_flow_controller(advanced);
    Ok(transition(next, reopen))
}
