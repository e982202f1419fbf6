//! The advance handler graph.
//!
//! Each handler knows how to derive the candidate for its step (`advance`) and
//! which handler follows once the step is committed (`commit`). Handlers hold
//! no data of their own; everything lives in the [`ProcessState`].

mod crosstab;
mod group;
mod items;
mod report;
mod subreport;

use crate::error::ReportProcessingError;
use crate::state::ProcessState;
use quire_definition::{BandAddress, GroupKind};
use quire_types::EventCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvanceHandler {
    BeginReport,
    BeginGroup,
    BeginItems,
    ProcessItems,
    NoData,
    EndItems,
    EndGroup,
    EndReport,
    BeginCrosstabRowAxis,
    BeginCrosstabColumnAxis,
    ProcessCrosstabCell,
    EndCrosstabColumnAxis,
    JoinEndCrosstabColumnAxis,
    EndCrosstabColumnBody,
    EndCrosstabRowAxis,
    JoinEndCrosstabRowAxis,
    EndCrosstabRowBody,
    BeginSubReport,
    EndSubReport,
    Finish,
}

impl AdvanceHandler {
    /// Derives the candidate for this handler's step.
    ///
    /// # Errors
    ///
    /// `InvalidState` for the finish handler or a group that does not exist.
    pub fn advance(self, state: &ProcessState) -> Result<ProcessState, ReportProcessingError> {
        let mut next = state.derive_for_advance();
        match self {
            AdvanceHandler::BeginGroup
            | AdvanceHandler::BeginCrosstabRowAxis
            | AdvanceHandler::BeginCrosstabColumnAxis => next.enter_group()?,
            AdvanceHandler::Finish => {
                return Err(ReportProcessingError::InvalidState(
                    "the finish handler cannot advance".to_string(),
                ));
            }
            _ => {}
        }
        Ok(next)
    }

    /// Installs the successor of this handler on the candidate `next`.
    ///
    /// # Errors
    ///
    /// Structural violations are raised when the offending group is reached;
    /// data errors come from the look-ahead used to detect group breaks.
    pub fn commit(self, next: ProcessState) -> Result<ProcessState, ReportProcessingError> {
        match self {
            AdvanceHandler::BeginReport => report::begin_report(next),
            AdvanceHandler::EndReport => report::end_report(next),
            AdvanceHandler::Finish => Err(ReportProcessingError::InvalidState(
                "the finish handler cannot commit".to_string(),
            )),
            AdvanceHandler::BeginGroup => group::begin_group(next),
            AdvanceHandler::EndGroup => group::end_group(next),
            AdvanceHandler::BeginItems => items::begin_items(next),
            AdvanceHandler::ProcessItems => items::process_items(next),
            AdvanceHandler::NoData => items::no_data(next),
            AdvanceHandler::EndItems => items::end_items(next),
            AdvanceHandler::BeginCrosstabRowAxis => crosstab::begin_row_axis(next),
            AdvanceHandler::BeginCrosstabColumnAxis => crosstab::begin_column_axis(next),
            AdvanceHandler::ProcessCrosstabCell => crosstab::process_cell(next),
            AdvanceHandler::EndCrosstabColumnAxis => {
                Ok(transition(next, AdvanceHandler::JoinEndCrosstabColumnAxis))
            }
            AdvanceHandler::JoinEndCrosstabColumnAxis => crosstab::join_end_column_axis(next),
            AdvanceHandler::EndCrosstabColumnBody => {
                Ok(transition(next, AdvanceHandler::EndCrosstabColumnAxis))
            }
            AdvanceHandler::EndCrosstabRowAxis => {
                Ok(transition(next, AdvanceHandler::JoinEndCrosstabRowAxis))
            }
            AdvanceHandler::JoinEndCrosstabRowAxis => crosstab::join_end_row_axis(next),
            AdvanceHandler::EndCrosstabRowBody => {
                Ok(transition(next, AdvanceHandler::EndCrosstabRowAxis))
            }
            AdvanceHandler::BeginSubReport => subreport::begin_subreport(next),
            AdvanceHandler::EndSubReport => subreport::end_subreport(next),
        }
    }

    pub fn event_code(self) -> EventCode {
        const CROSSTAB: EventCode = EventCode::CROSSTABBING;
        match self {
            AdvanceHandler::BeginReport => EventCode::REPORT_STARTED,
            AdvanceHandler::BeginGroup => EventCode::GROUP_STARTED,
            AdvanceHandler::BeginItems => EventCode::ITEMS_STARTED,
            AdvanceHandler::ProcessItems => EventCode::ITEMS_ADVANCED,
            AdvanceHandler::NoData => EventCode::NO_DATA,
            AdvanceHandler::EndItems => EventCode::ITEMS_FINISHED,
            AdvanceHandler::EndGroup => EventCode::GROUP_FINISHED,
            AdvanceHandler::EndReport => EventCode::REPORT_FINISHED,
            AdvanceHandler::BeginCrosstabRowAxis | AdvanceHandler::BeginCrosstabColumnAxis => {
                EventCode::GROUP_STARTED.union(CROSSTAB)
            }
            AdvanceHandler::ProcessCrosstabCell => EventCode::ITEMS_ADVANCED.union(CROSSTAB),
            AdvanceHandler::EndCrosstabColumnAxis | AdvanceHandler::EndCrosstabRowAxis => {
                EventCode::GROUP_FINISHED.union(CROSSTAB)
            }
            AdvanceHandler::JoinEndCrosstabColumnAxis | AdvanceHandler::JoinEndCrosstabRowAxis => {
                EventCode::GROUP_FINISHED
                    .union(EventCode::ARTIFICIAL)
                    .union(CROSSTAB)
            }
            AdvanceHandler::EndCrosstabColumnBody | AdvanceHandler::EndCrosstabRowBody => {
                EventCode::GROUP_BODY_FINISHED.union(CROSSTAB)
            }
            AdvanceHandler::BeginSubReport => EventCode::SUBREPORT_ENTERED,
            AdvanceHandler::EndSubReport => EventCode::SUBREPORT_EXITED,
            AdvanceHandler::Finish => EventCode::empty(),
        }
    }

    /// The band produced by this handler's step when the innermost entered
    /// group is `group_index`.
    pub fn band_address(self, group_index: i32) -> Option<BandAddress> {
        let group = usize::try_from(group_index).ok();
        match self {
            AdvanceHandler::BeginReport => Some(BandAddress::ReportHeader),
            AdvanceHandler::EndReport => Some(BandAddress::ReportFooter),
            AdvanceHandler::BeginGroup
            | AdvanceHandler::BeginCrosstabRowAxis
            | AdvanceHandler::BeginCrosstabColumnAxis => group.map(BandAddress::GroupHeader),
            AdvanceHandler::EndGroup
            | AdvanceHandler::EndCrosstabColumnAxis
            | AdvanceHandler::EndCrosstabRowAxis => group.map(BandAddress::GroupFooter),
            AdvanceHandler::ProcessItems | AdvanceHandler::ProcessCrosstabCell => {
                Some(BandAddress::ItemBand)
            }
            AdvanceHandler::NoData => Some(BandAddress::NoDataBand),
            _ => None,
        }
    }

    pub fn is_finish(self) -> bool {
        self == AdvanceHandler::Finish
    }

    /// `true` for the handler that hands control back to a suspended parent.
    pub fn is_restore_handler(self) -> bool {
        self == AdvanceHandler::EndSubReport
    }
}

/// The handler that opens a group of `kind`.
fn begin_handler_for(kind: GroupKind) -> AdvanceHandler {
    match kind {
        GroupKind::Relational => AdvanceHandler::BeginGroup,
        GroupKind::CrosstabRow => AdvanceHandler::BeginCrosstabRowAxis,
        GroupKind::CrosstabColumn => AdvanceHandler::BeginCrosstabColumnAxis,
    }
}

fn transition(mut next: ProcessState, handler: AdvanceHandler) -> ProcessState {
    next.set_advance_handler(handler);
    next
}

/// Kind and name of the group at `index`, if the report has one there.
fn group_at(state: &ProcessState, index: i32) -> Option<(GroupKind, String)> {
    usize::try_from(index)
        .ok()
        .and_then(|i| state.report().group(i))
        .map(|g| (g.kind, g.name.clone()))
}
