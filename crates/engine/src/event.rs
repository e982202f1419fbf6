use crate::state::ProcessState;
use quire_types::{EventCode, FunctionStorageKey, ReportStateKey};
use std::fmt;

/// A notification emitted for one committed traversal step.
///
/// Events are owned snapshots: a listener may keep them after the state that
/// produced them has been replaced or rolled back.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEvent {
    pub code: EventCode,
    pub report_name: String,
    /// Innermost entered group, `-1` before the first group.
    pub group_index: i32,
    pub group_name: Option<String>,
    pub cursor: Option<usize>,
    /// Sub-report nesting depth, `0` for the top-level report.
    pub depth: usize,
    pub storage_key: FunctionStorageKey,
    pub state_key: ReportStateKey,
}

impl ReportEvent {
    /// Captures `state` under `code`.
    pub fn new(code: EventCode, state: &ProcessState) -> Self {
        let group_name = usize::try_from(state.current_group_index())
            .ok()
            .and_then(|i| state.report().group(i))
            .map(|g| g.name.clone());
        Self {
            code,
            report_name: state.report().name.clone(),
            group_index: state.current_group_index(),
            group_name,
            cursor: state.flow_controller().cursor(),
            depth: state.depth(),
            storage_key: state.storage_key().clone(),
            state_key: state.state_key(),
        }
    }

    pub fn is_subreport_event(&self) -> bool {
        self.depth > 0
    }
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.code, indent = self.depth * 2)?;
        if let Some(name) = &self.group_name {
            write!(f, " [{name}]")?;
        }
        if let Some(cursor) = self.cursor {
            write!(f, " @{cursor}")?;
        }
        Ok(())
    }
}
