// src/processor.rs
use crate::config::ProcessingConfig;
use crate::error::ProcessingError;
use crate::functions::{FunctionRegistry, ReportFunction};
use crate::paginator::{PaginationSummary, Paginator};
use crate::traversal::{ProcessingPass, Traversal};
use quire_definition::ReportDefinition;
use quire_engine::ReportListener;
use quire_traits::{DataFactory, ExpressionEvaluator, FunctionStorage, InMemoryFunctionStorage};
use std::sync::Arc;

/// Counters of one finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub steps: usize,
    pub events: usize,
    /// Report instances whose function values were stored.
    pub stored_scopes: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingSummary {
    pub prepare: Option<PassSummary>,
    pub print: Vec<PassSummary>,
    pub pagination: Vec<PaginationSummary>,
}

/// Runs prepare and print passes over one report definition.
#[derive(Debug, Clone)]
pub struct ReportProcessor {
    report: Arc<ReportDefinition>,
    data_factory: Arc<dyn DataFactory>,
    registry: Arc<FunctionRegistry>,
    storage: Arc<dyn FunctionStorage>,
    config: ProcessingConfig,
}

impl ReportProcessor {
    pub fn builder(report: ReportDefinition) -> ReportProcessorBuilder {
        ReportProcessorBuilder::new(report)
    }

    pub fn report(&self) -> &Arc<ReportDefinition> {
        &self.report
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn function_storage(&self) -> &Arc<dyn FunctionStorage> {
        &self.storage
    }

    /// Starts a traversal of `pass` without running it.
    pub fn traversal(&self, pass: ProcessingPass) -> Result<Traversal, ProcessingError> {
        Traversal::new(
            Arc::clone(&self.report),
            Arc::clone(&self.data_factory),
            Arc::clone(&self.registry),
            Arc::clone(&self.storage),
            pass,
            self.config.max_steps,
        )
    }

    /// Runs the prepare pass and stores the final function values.
    pub fn prepare(&self) -> Result<PassSummary, ProcessingError> {
        let mut traversal = self.traversal(ProcessingPass::Prepare)?;
        let mut events = 0;
        while traversal.step()?.is_some() {
            events += 1;
        }
        let stored_scopes = traversal.store_completed()?;
        log::info!(
            "Prepare pass of '{}' finished: {} steps, {} scopes stored",
            self.report.name,
            traversal.steps(),
            stored_scopes
        );
        Ok(PassSummary {
            steps: traversal.steps(),
            events,
            stored_scopes,
        })
    }

    /// Runs one print pass, delivering every event to `listener`.
    pub fn print(&self, listener: &mut dyn ReportListener) -> Result<PassSummary, ProcessingError> {
        let mut traversal = self.traversal(ProcessingPass::Print)?;
        let mut events = 0;
        while let Some(step) = traversal.step()? {
            listener.report_event(&step.event, &step.row())?;
            events += 1;
        }
        log::info!(
            "Print pass of '{}' finished: {} events",
            self.report.name,
            events
        );
        Ok(PassSummary {
            steps: traversal.steps(),
            events,
            stored_scopes: 0,
        })
    }

    /// Runs one print pass through the paginator.
    pub fn paginate(&self, listener: &mut dyn ReportListener) -> Result<PaginationSummary, ProcessingError> {
        let mut traversal = self.traversal(ProcessingPass::Print)?;
        let paginator = Paginator::new(self.config.content_width(), self.config.content_height());
        let summary = paginator.run(&mut traversal, listener)?;
        log::info!(
            "Paginated '{}' onto {} pages ({} rollbacks)",
            self.report.name,
            summary.page_count(),
            summary.rollbacks
        );
        Ok(summary)
    }

    /// Runs every pass the configuration asks for.
    pub fn process(&self, listener: &mut dyn ReportListener) -> Result<ProcessingSummary, ProcessingError> {
        let mut summary = ProcessingSummary::default();
        if self.config.prepare_pass {
            summary.prepare = Some(self.prepare()?);
        }
        for _ in 0..self.config.print_passes {
            if self.config.paginate {
                summary.pagination.push(self.paginate(listener)?);
            } else {
                summary.print.push(self.print(listener)?);
            }
        }
        Ok(summary)
    }
}

/// A builder for creating a `ReportProcessor`.
#[derive(Debug)]
pub struct ReportProcessorBuilder {
    report: ReportDefinition,
    data_factory: Option<Arc<dyn DataFactory>>,
    registry: FunctionRegistry,
    storage: Option<Arc<dyn FunctionStorage>>,
    config: ProcessingConfig,
}

impl ReportProcessorBuilder {
    pub fn new(report: ReportDefinition) -> Self {
        Self {
            report,
            data_factory: None,
            registry: FunctionRegistry::new(),
            storage: None,
            config: ProcessingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProcessingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_data_factory(mut self, factory: impl DataFactory + 'static) -> Self {
        self.data_factory = Some(Arc::new(factory));
        self
    }

    pub fn with_shared_data_factory(mut self, factory: Arc<dyn DataFactory>) -> Self {
        self.data_factory = Some(factory);
        self
    }

    /// Adds a function of the top-level report.
    pub fn with_function(mut self, function: impl ReportFunction + 'static) -> Self {
        self.registry.add_function(Arc::new(function));
        self
    }

    /// Adds a function of every sub-report named `report`.
    pub fn with_subreport_function(mut self, report: &str, function: impl ReportFunction + 'static) -> Self {
        self.registry.add_subreport_function(report, Arc::new(function));
        self
    }

    pub fn with_expression(mut self, expression: impl ExpressionEvaluator + 'static) -> Self {
        self.registry.add_expression(Arc::new(expression));
        self
    }

    pub fn with_subreport_expression(mut self, report: &str, expression: impl ExpressionEvaluator + 'static) -> Self {
        self.registry.add_subreport_expression(report, Arc::new(expression));
        self
    }

    /// Shares `storage` between processors. Defaults to a private in-memory store.
    pub fn with_function_storage(mut self, storage: Arc<dyn FunctionStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Consumes the builder and creates the `ReportProcessor`.
    pub fn build(mut self) -> Result<ReportProcessor, ProcessingError> {
        self.config.validate()?;
        let data_factory = self.data_factory.ok_or_else(|| {
            ProcessingError::Config(
                "No data factory has been configured. Use `with_data_factory`.".to_string(),
            )
        })?;
        for spec in &self.config.functions {
            self.registry.add_function(spec.build());
        }
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryFunctionStorage::new()));
        Ok(ReportProcessor {
            report: Arc::new(self.report),
            data_factory,
            registry: Arc::new(self.registry),
            storage,
            config: self.config,
        })
    }
}
