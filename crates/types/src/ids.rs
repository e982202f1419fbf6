//! Identity keys for report instances and traversal positions.
//!
//! These types are compared and hashed but never ordered. They address
//! function-value storage across the prepare and print passes.

use crate::event::EventCode;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque, process-wide unique identifier of a report or sub-report definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocates a fresh identifier.
    pub fn generate() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Addresses one published traversal position.
///
/// Two passes over the same report produce equal keys for equal positions,
/// which is what allows a sub-report invoked during the print pass to find
/// the values its twin stored during the prepare pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportStateKey {
    parent: Option<Arc<ReportStateKey>>,
    report_id: InstanceId,
    cursor: Option<usize>,
    event_code: EventCode,
    group_index: i32,
    sequence: u64,
    /// Index of the next sub-report of the hosting band to run.
    invocation: usize,
}

impl ReportStateKey {
    pub fn new(
        parent: Option<Arc<ReportStateKey>>,
        report_id: InstanceId,
        cursor: Option<usize>,
        event_code: EventCode,
        group_index: i32,
        sequence: u64,
    ) -> Self {
        Self {
            parent,
            report_id,
            cursor,
            event_code,
            group_index,
            sequence,
            invocation: 0,
        }
    }

    /// Distinguishes sub-reports hosted by the same band at one position.
    pub fn with_invocation(mut self, invocation: usize) -> Self {
        self.invocation = invocation;
        self
    }

    pub fn parent(&self) -> Option<&ReportStateKey> {
        self.parent.as_deref()
    }

    pub fn report_id(&self) -> InstanceId {
        self.report_id
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn event_code(&self) -> EventCode {
        self.event_code
    }

    pub fn group_index(&self) -> i32 {
        self.group_index
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn invocation(&self) -> usize {
        self.invocation
    }
}

/// The storage scope of one report or sub-report instantiation.
///
/// Equality covers the parent chain and the report id. The report name is
/// carried for diagnostics only.
#[derive(Debug, Clone)]
pub struct FunctionStorageKey {
    parent: Option<Arc<ReportStateKey>>,
    report_id: InstanceId,
    report_name: Arc<str>,
}

impl FunctionStorageKey {
    /// Key of a top-level report.
    pub fn for_report(report_id: InstanceId, report_name: impl Into<Arc<str>>) -> Self {
        Self {
            parent: None,
            report_id,
            report_name: report_name.into(),
        }
    }

    /// Key of a sub-report entered at the parent position `parent`.
    pub fn for_subreport(
        parent: Arc<ReportStateKey>,
        report_id: InstanceId,
        report_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            parent: Some(parent),
            report_id,
            report_name: report_name.into(),
        }
    }

    pub fn parent(&self) -> Option<&ReportStateKey> {
        self.parent.as_deref()
    }

    /// The parent position, shared with every state key of this scope.
    pub fn shared_parent(&self) -> Option<&Arc<ReportStateKey>> {
        self.parent.as_ref()
    }

    pub fn report_id(&self) -> InstanceId {
        self.report_id
    }

    pub fn report_name(&self) -> &str {
        &self.report_name
    }
}

impl PartialEq for FunctionStorageKey {
    fn eq(&self, other: &Self) -> bool {
        self.report_id == other.report_id && self.parent == other.parent
    }
}

impl Eq for FunctionStorageKey {}

impl Hash for FunctionStorageKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.report_id.hash(state);
    }
}

impl fmt::Display for FunctionStorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.report_name, self.report_id)?;
        if let Some(parent) = &self.parent {
            write!(
                f,
                " at {}:{:?}#{}",
                parent.report_id(),
                parent.cursor(),
                parent.invocation()
            )?;
        }
        Ok(())
    }
}
