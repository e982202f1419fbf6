use super::{AdvanceHandler, begin_handler_for, group_at, transition};
use crate::error::ReportProcessingError;
use crate::state::ProcessState;
use quire_definition::{DefinitionError, GroupKind};

/// A relational group header is done: open the next nested group, or the
/// items if this was the innermost group.
pub(super) fn begin_group(next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    let handler = match group_at(&next, next.current_group_index() + 1) {
        None => AdvanceHandler::BeginItems,
        Some((GroupKind::CrosstabColumn, name)) => {
            return Err(DefinitionError::ColumnAxisOutsideRowAxis(name).into());
        }
        Some((kind, _)) => begin_handler_for(kind),
    };
    Ok(transition(next, handler))
}

/// A relational group footer is done. Either the parent breaks too and
/// finishes, or the next row opens a fresh instance of this group.
pub(super) fn end_group(mut next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
    next.leave_group()?;
    let flow = next.flow_controller().clone();

    if next.is_before_first_group() {
        if !flow.is_advanceable() {
            return Ok(transition(next, AdvanceHandler::EndReport));
        }
        next.set_flow_controller(flow.perform_commit()?);
        let handler = match group_at(&next, 0) {
            Some((kind, _)) => begin_handler_for(kind),
            None => AdvanceHandler::BeginItems,
        };
        return Ok(transition(next, handler));
    }

    let parent = next.current_group_index();
    if let Some((kind, _)) = group_at(&next, parent)
        && kind.is_crosstab()
    {
        let name = group_at(&next, parent + 1).map(|(_, name)| name).unwrap_or_default();
        return Err(DefinitionError::RelationalInsideCrosstab(name).into());
    }

    if !flow.is_advanceable() {
        return Ok(transition(next, AdvanceHandler::EndGroup));
    }
    let advanced = flow.perform_commit()?;
    if next.is_last_item_in_group(parent, &advanced)? {
        return Ok(transition(next, AdvanceHandler::EndGroup));
    }
    next.set_flow_controller(advanced);
    Ok(transition(next, AdvanceHandler::BeginGroup))
}
