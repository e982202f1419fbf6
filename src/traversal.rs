// src/traversal.rs
//! One pass over a report, step by step.

use crate::error::ProcessingError;
use crate::functions::{FunctionRegistry, FunctionScopes};
use quire_definition::ReportDefinition;
use quire_engine::{ProcessState, ReportEvent, ReportProcessingError};
use quire_traits::{DataFactory, DataRow, FunctionStorage, StoredValues};
use quire_types::{EventCode, FunctionStorageKey};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingPass {
    /// Computes function values and stores them. Nothing is printed.
    Prepare,
    /// Produces output; prepared values are visible as `prepared.<name>`.
    Print,
}

/// A committed step: its event and the candidate state it was produced from.
#[derive(Debug, Clone)]
pub struct Step {
    pub event: ReportEvent,
    state: ProcessState,
}

impl Step {
    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    /// The row the event describes, including function and expression columns.
    pub fn row(&self) -> impl DataRow + '_ {
        self.state.data_row()
    }

    /// Height of the band this step produces, in micro-points.
    pub fn band_height(&self) -> i64 {
        self.state.current_band().map_or(0, |band| band.height_internal())
    }
}

/// A position a [`Traversal`] can return to.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    state: ProcessState,
    scopes: FunctionScopes,
    completed: usize,
    steps: usize,
}

impl Checkpoint {
    pub fn state(&self) -> &ProcessState {
        &self.state
    }
}

/// Drives a report through one pass.
///
/// Every step derives the candidate, feeds its event to the report
/// functions, layers their values over the candidate's row, and commits. If
/// any of that fails, the traversal stays on the last published state.
#[derive(Debug)]
pub struct Traversal {
    state: ProcessState,
    scopes: FunctionScopes,
    registry: Arc<FunctionRegistry>,
    storage: Arc<dyn FunctionStorage>,
    pass: ProcessingPass,
    completed: Vec<(FunctionStorageKey, StoredValues)>,
    steps: usize,
    max_steps: usize,
}

impl Traversal {
    pub fn new(
        report: Arc<ReportDefinition>,
        data_factory: Arc<dyn DataFactory>,
        registry: Arc<FunctionRegistry>,
        storage: Arc<dyn FunctionStorage>,
        pass: ProcessingPass,
        max_steps: usize,
    ) -> Result<Self, ProcessingError> {
        let state = ProcessState::initial(report, data_factory)?;
        let key = state.storage_key().clone();
        let prepared = match pass {
            ProcessingPass::Prepare => None,
            ProcessingPass::Print => storage.get(&key),
        };
        log::info!("Starting {:?} pass over report '{}'", pass, state.report().name);
        Ok(Self {
            scopes: FunctionScopes::new(key, &registry, prepared),
            state,
            registry,
            storage,
            pass,
            completed: Vec::new(),
            steps: 0,
            max_steps,
        })
    }

    pub fn pass(&self) -> ProcessingPass {
        self.pass
    }

    /// The last published state.
    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finish()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Performs one step. Returns `None` once the report is finished.
    ///
    /// # Errors
    ///
    /// Engine, function and expression errors, and an invalid-state error once
    /// the step limit is exceeded.
    pub fn step(&mut self) -> Result<Option<Step>, ProcessingError> {
        if self.state.is_finish() {
            return Ok(None);
        }
        if self.steps >= self.max_steps {
            return Err(ReportProcessingError::InvalidState(format!(
                "traversal of '{}' exceeded {} steps",
                self.state.report().name,
                self.max_steps
            ))
            .into());
        }

        let mut candidate = self.state.advance()?;
        let event = candidate.create_event();
        let mut scopes = self.scopes.clone();
        if event.code.is(EventCode::SUBREPORT_ENTERED) {
            let prepared = self.prepared_values(&event.storage_key);
            scopes.enter(event.storage_key.clone(), event.depth, &self.registry, prepared);
        }

        let overrides = scopes.update(&self.registry, &event, &candidate.data_row())?;
        let flow = candidate.flow_controller().derive_with_overrides(overrides);
        candidate.set_flow_controller(flow);
        let step = Step {
            event,
            state: candidate.clone(),
        };
        let next = candidate.commit()?;

        if step.event.code.is(EventCode::REPORT_FINISHED) {
            self.completed
                .push((step.event.storage_key.clone(), scopes.current_values()));
        }
        if step.event.code.is(EventCode::SUBREPORT_EXITED) {
            scopes.leave();
        }
        log::debug!(
            "{} -> {:?} (group {}, row {:?})",
            step.event,
            next.advance_handler(),
            next.current_group_index(),
            next.flow_controller().cursor()
        );

        self.state = next;
        self.scopes = scopes;
        self.steps += 1;
        Ok(Some(step))
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.state.clone(),
            scopes: self.scopes.clone(),
            completed: self.completed.len(),
            steps: self.steps,
        }
    }

    /// Returns to `checkpoint`. The next step re-derives from there.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        log::warn!(
            "Rolling back '{}' from step {} to step {}",
            self.state.report().name,
            self.steps,
            checkpoint.steps
        );
        self.state = checkpoint.state;
        self.scopes = checkpoint.scopes;
        self.completed.truncate(checkpoint.completed);
        self.steps = checkpoint.steps;
    }

    /// Final function values of every report instance finished so far.
    pub fn completed_scopes(&self) -> &[(FunctionStorageKey, StoredValues)] {
        &self.completed
    }

    /// Stores the values of every finished report instance.
    pub fn store_completed(&self) -> Result<usize, ProcessingError> {
        for (key, values) in &self.completed {
            log::debug!("Storing {} function values for {}", values.len(), key);
            self.storage.put(key.clone(), values.clone())?;
        }
        Ok(self.completed.len())
    }

    fn prepared_values(&self, key: &FunctionStorageKey) -> Option<StoredValues> {
        match self.pass {
            ProcessingPass::Prepare => None,
            ProcessingPass::Print => self.storage.get(key),
        }
    }
}
