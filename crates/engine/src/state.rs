//! The immutable-once-published traversal position.

use crate::error::ReportProcessingError;
use crate::event::ReportEvent;
use crate::handlers::AdvanceHandler;
use quire_definition::{Band, ReportDefinition, SubReport};
use quire_flow::{FlowController, MasterDataRow, StaticDataRow};
use quire_traits::{DataFactory, DataRow, TableModel};
use quire_types::{FunctionStorageKey, ReportStateKey};
use std::sync::Arc;

/// Group index of a state that has not entered any group.
pub const BEFORE_FIRST_GROUP: i32 = -1;

/// Sub-reports hosted by the band of the last committed step, with their
/// parameters already bound to the row that band was produced for.
#[derive(Debug)]
struct PendingSubReports {
    invocations: Vec<(SubReport, StaticDataRow)>,
}

/// One position of a report traversal.
///
/// A state is only mutated between [`ProcessState::advance`] and
/// [`ProcessState::commit`], while the candidate is exclusively owned by the
/// driver. Once published it is read-only and can be kept as a rollback point;
/// all shared parts sit behind `Arc`, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct ProcessState {
    report: Arc<ReportDefinition>,
    data_factory: Arc<dyn DataFactory>,
    handler: AdvanceHandler,
    group_index: i32,
    flow_controller: FlowController,
    storage_key: FunctionStorageKey,
    /// The state to resume once this sub-report finishes.
    parent: Option<Arc<ProcessState>>,
    pending: Option<Arc<PendingSubReports>>,
    subreport_cursor: usize,
    sequence: u64,
    depth: usize,
}

impl ProcessState {
    /// Creates the initial state of a top-level report.
    ///
    /// # Errors
    ///
    /// `MissingDataSource` if the factory cannot resolve the report's query.
    pub fn initial(
        report: Arc<ReportDefinition>,
        data_factory: Arc<dyn DataFactory>,
    ) -> Result<Self, ReportProcessingError> {
        let table = query_table(data_factory.as_ref(), &report.query)?;
        let storage_key = FunctionStorageKey::for_report(report.id(), report.name.as_str());
        log::debug!(
            "Initial state for report '{}' over {} rows",
            report.name,
            table.row_count()
        );
        Ok(Self {
            report,
            data_factory,
            handler: AdvanceHandler::BeginReport,
            group_index: BEFORE_FIRST_GROUP,
            flow_controller: FlowController::new(table),
            storage_key,
            parent: None,
            pending: None,
            subreport_cursor: 0,
            sequence: 0,
            depth: 0,
        })
    }

    /// Derives the candidate for the next step. `self` is never changed.
    ///
    /// Sub-reports hosted by the band of the last step run before the handler
    /// moves on.
    ///
    /// # Errors
    ///
    /// `InvalidState` on a finished state, or whatever the handler or the
    /// sub-report's data source raise.
    pub fn advance(&self) -> Result<ProcessState, ReportProcessingError> {
        if let Some(pending) = &self.pending
            && let Some((subreport, parameters)) = pending.invocations.get(self.subreport_cursor)
        {
            return self.derive_for_subreport(subreport, parameters.clone());
        }
        if self.handler.is_finish() {
            return Err(ReportProcessingError::InvalidState(format!(
                "report '{}' is already finished",
                self.report.name
            )));
        }
        self.handler.advance(self)
    }

    /// Finishes the step this candidate was derived for and returns the state
    /// to publish.
    ///
    /// # Errors
    ///
    /// Structural violations, data errors while binding sub-report parameters
    /// or looking ahead, and `InvalidState` for impossible transitions.
    pub fn commit(self) -> Result<ProcessState, ReportProcessingError> {
        let handler = self.handler;
        let pending = self.bind_subreports()?;
        let mut next = handler.commit(self)?;
        if let Some(pending) = pending {
            next.pending = Some(Arc::new(pending));
            next.subreport_cursor = 0;
        }
        Ok(next)
    }

    /// The event describing the step of this candidate.
    pub fn create_event(&self) -> ReportEvent {
        ReportEvent::new(self.handler.event_code(), self)
    }

    /// A copy with a fresh sequence number and no pending sub-reports.
    pub fn derive_for_advance(&self) -> ProcessState {
        let mut next = self.clone();
        next.sequence += 1;
        next.pending = None;
        next.subreport_cursor = 0;
        next
    }

    /// # Errors
    ///
    /// `InvalidState` when the innermost group is already entered.
    pub fn enter_group(&mut self) -> Result<(), ReportProcessingError> {
        let next = self.group_index + 1;
        if usize::try_from(next).map_or(true, |i| i >= self.report.group_count()) {
            return Err(ReportProcessingError::InvalidState(format!(
                "cannot enter group {next} of report '{}' with {} groups",
                self.report.name,
                self.report.group_count()
            )));
        }
        self.group_index = next;
        Ok(())
    }

    /// # Errors
    ///
    /// `InvalidState` when no group is entered.
    pub fn leave_group(&mut self) -> Result<(), ReportProcessingError> {
        if self.is_before_first_group() {
            return Err(ReportProcessingError::InvalidState(format!(
                "cannot leave a group of report '{}' before the first group",
                self.report.name
            )));
        }
        self.group_index -= 1;
        Ok(())
    }

    pub fn set_advance_handler(&mut self, handler: AdvanceHandler) {
        self.handler = handler;
    }

    pub fn set_flow_controller(&mut self, flow_controller: FlowController) {
        self.flow_controller = flow_controller;
    }

    pub fn is_before_first_group(&self) -> bool {
        self.group_index == BEFORE_FIRST_GROUP
    }

    /// Returns `true` if moving from this state's row to `next` breaks any of
    /// the groups `0..=group_index`. A group with no fields never breaks.
    ///
    /// # Errors
    ///
    /// Data errors reading a break field, including a field that does not exist.
    pub fn is_last_item_in_group(
        &self,
        group_index: i32,
        next: &FlowController,
    ) -> Result<bool, ReportProcessingError> {
        let Ok(innermost) = usize::try_from(group_index) else {
            return Ok(false);
        };
        let current = self.flow_controller.master_row();
        for group in self.report.groups.iter().take(innermost + 1) {
            if current.differs_in(next.master_row(), &group.fields)? {
                log::trace!("Group '{}' breaks after row {:?}", group.name, current.cursor());
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn report(&self) -> &Arc<ReportDefinition> {
        &self.report
    }

    pub fn data_factory(&self) -> &Arc<dyn DataFactory> {
        &self.data_factory
    }

    pub fn advance_handler(&self) -> AdvanceHandler {
        self.handler
    }

    pub fn current_group_index(&self) -> i32 {
        self.group_index
    }

    pub fn flow_controller(&self) -> &FlowController {
        &self.flow_controller
    }

    pub fn data_row(&self) -> impl DataRow + '_ {
        self.flow_controller.data_row()
    }

    pub fn storage_key(&self) -> &FunctionStorageKey {
        &self.storage_key
    }

    pub fn parent(&self) -> Option<&ProcessState> {
        self.parent.as_deref()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_subreport(&self) -> bool {
        self.parent.is_some()
    }

    /// `true` once the finish handler is installed and every sub-report of
    /// the report footer has run.
    pub fn is_finish(&self) -> bool {
        self.handler.is_finish() && !self.has_pending_subreports()
    }

    pub fn has_pending_subreports(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| self.subreport_cursor < pending.invocations.len())
    }

    /// The band rendered by this candidate's step, if any.
    pub fn current_band(&self) -> Option<&Band> {
        self.handler
            .band_address(self.group_index)
            .and_then(|address| self.report.band(address))
    }

    /// The identity of this position.
    pub fn state_key(&self) -> ReportStateKey {
        ReportStateKey::new(
            self.storage_key.shared_parent().cloned(),
            self.report.id(),
            self.flow_controller.cursor(),
            self.handler.event_code(),
            self.group_index,
            self.sequence,
        )
        .with_invocation(self.subreport_cursor)
    }

    /// Hands control back to the report that invoked this sub-report.
    pub(crate) fn into_parent(self) -> Result<ProcessState, ReportProcessingError> {
        match self.parent {
            Some(parent) => {
                log::debug!("Leaving sub-report '{}'", self.report.name);
                Ok(Arc::unwrap_or_clone(parent))
            }
            None => Err(ReportProcessingError::InvalidState(format!(
                "report '{}' is not a sub-report",
                self.report.name
            ))),
        }
    }

    fn derive_for_subreport(
        &self,
        subreport: &SubReport,
        parameters: StaticDataRow,
    ) -> Result<ProcessState, ReportProcessingError> {
        let report = Arc::clone(&subreport.report);
        let table = query_table(self.data_factory.as_ref(), &report.query)?;
        log::debug!(
            "Entering sub-report '{}' from '{}' at row {:?}",
            report.name,
            self.report.name,
            self.flow_controller.cursor()
        );

        let mut resume = self.clone();
        resume.subreport_cursor += 1;
        let storage_key = FunctionStorageKey::for_subreport(
            Arc::new(self.state_key()),
            report.id(),
            report.name.as_str(),
        );
        let master = MasterDataRow::new(table).with_parameters(parameters);
        Ok(ProcessState {
            report,
            data_factory: Arc::clone(&self.data_factory),
            handler: AdvanceHandler::BeginSubReport,
            group_index: BEFORE_FIRST_GROUP,
            flow_controller: FlowController::from_master(master),
            storage_key,
            parent: Some(Arc::new(resume)),
            pending: None,
            subreport_cursor: 0,
            sequence: 0,
            depth: self.depth + 1,
        })
    }

    /// Binds the parameters of every sub-report hosted by this step's band.
    fn bind_subreports(&self) -> Result<Option<PendingSubReports>, ReportProcessingError> {
        let Some(band) = self.current_band() else {
            return Ok(None);
        };
        if band.subreports.is_empty() {
            return Ok(None);
        }
        let row = self.flow_controller.data_row();
        let mut invocations = Vec::with_capacity(band.subreports.len());
        for subreport in &band.subreports {
            let mut parameters = StaticDataRow::new();
            for mapping in &subreport.parameters {
                parameters.set(mapping.inner.clone(), row.get(&mapping.outer)?);
            }
            invocations.push((subreport.clone(), parameters));
        }
        Ok(Some(PendingSubReports { invocations }))
    }
}

impl PartialEq for ProcessState {
    fn eq(&self, other: &Self) -> bool {
        let pending_eq = match (&self.pending, &other.pending) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        Arc::ptr_eq(&self.report, &other.report)
            && self.handler == other.handler
            && self.group_index == other.group_index
            && self.flow_controller == other.flow_controller
            && self.storage_key == other.storage_key
            && self.subreport_cursor == other.subreport_cursor
            && self.sequence == other.sequence
            && self.depth == other.depth
            && pending_eq
            && self.parent.as_ref().map(|p| p.state_key()) == other.parent.as_ref().map(|p| p.state_key())
    }
}

fn query_table(
    factory: &dyn DataFactory,
    query: &str,
) -> Result<Arc<dyn TableModel>, ReportProcessingError> {
    factory
        .query(query)
        .map_err(|source| ReportProcessingError::MissingDataSource {
            query: query.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_definition::Group;
    use quire_source::{JsonTableModel, TableDataFactory};
    use quire_types::EventCode;
    use serde_json::json;

    fn factory() -> Arc<dyn DataFactory> {
        let rows = JsonTableModel::from_rows(vec![
            json!({"Region": "A", "Amount": 1}),
            json!({"Region": "A", "Amount": 2}),
            json!({"Region": "B", "Amount": 3}),
        ])
        .unwrap();
        Arc::new(TableDataFactory::new().with_table("orders", rows))
    }

    fn initial(report: ReportDefinition) -> ProcessState {
        ProcessState::initial(Arc::new(report), factory()).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = initial(ReportDefinition::new("sales", "orders"));
        assert_eq!(state.advance_handler(), AdvanceHandler::BeginReport);
        assert!(state.is_before_first_group());
        assert_eq!(state.flow_controller().cursor(), Some(0));
        assert_eq!(state.depth(), 0);
        assert_eq!(state.storage_key().report_name(), "sales");
        assert_eq!(state.create_event().code, EventCode::REPORT_STARTED);
    }

    #[test]
    fn test_missing_query_is_fatal() {
        let err = ProcessState::initial(Arc::new(ReportDefinition::new("r", "nope")), factory())
            .unwrap_err();
        assert!(matches!(err, ReportProcessingError::MissingDataSource { ref query, .. } if query == "nope"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_advance_does_not_touch_published_state() {
        let state = initial(ReportDefinition::new("sales", "orders"));
        let snapshot = state.clone();
        let candidate = state.advance().unwrap();
        let _ = candidate.commit().unwrap();
        assert_eq!(state, snapshot);
        assert_eq!(state.sequence(), 0);
    }

    #[test]
    fn test_group_index_bounds() {
        let mut state = initial(
            ReportDefinition::new("sales", "orders").with_group(Group::relational("region", ["Region"])),
        );
        assert!(state.leave_group().is_err());
        state.enter_group().unwrap();
        assert_eq!(state.current_group_index(), 0);
        assert!(state.enter_group().is_err());
        state.leave_group().unwrap();
        assert!(state.is_before_first_group());
    }

    #[test]
    fn test_last_item_in_group() {
        let state = initial(
            ReportDefinition::new("sales", "orders").with_group(Group::relational("region", ["Region"])),
        );
        let second = state.flow_controller().perform_commit().unwrap();
        let third = second.perform_commit().unwrap();

        assert!(!state.is_last_item_in_group(0, &second).unwrap());
        assert!(!state.is_last_item_in_group(BEFORE_FIRST_GROUP, &third).unwrap());

        let mut at_second = state.derive_for_advance();
        at_second.set_flow_controller(second);
        assert!(at_second.is_last_item_in_group(0, &third).unwrap());
    }

    #[test]
    fn test_state_keys_differ_by_sequence() {
        let state = initial(ReportDefinition::new("sales", "orders"));
        let next = state.derive_for_advance();
        assert_ne!(state.state_key(), next.state_key());
        assert_eq!(state.state_key(), state.clone().state_key());
    }
}
