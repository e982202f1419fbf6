#![allow(dead_code)]

pub mod fixtures;

use quire::{
    CollectingListener, EventCode, ProcessingConfig, ProcessingError, ReportDefinition, ReportEvent,
    ReportProcessor, TableDataFactory,
};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A processor over `data` with the prepare pass disabled.
pub fn processor(report: ReportDefinition, data: Value) -> Result<ReportProcessor, ProcessingError> {
    let config = ProcessingConfig {
        prepare_pass: false,
        ..ProcessingConfig::default()
    };
    ReportProcessor::builder(report)
        .with_data_factory(TableDataFactory::from_json(data)?)
        .with_config(config)
        .build()
}

/// Runs one print pass and returns the events.
pub fn print_events(report: ReportDefinition, data: Value) -> Result<Vec<ReportEvent>, ProcessingError> {
    let mut listener = CollectingListener::new();
    processor(report, data)?.print(&mut listener)?;
    Ok(listener.into_events())
}

pub fn codes(events: &[ReportEvent]) -> Vec<EventCode> {
    events.iter().map(|e| e.code).collect()
}

pub fn count(events: &[ReportEvent], code: EventCode) -> usize {
    events.iter().filter(|e| e.code == code).count()
}

/// Asserts that every started group is finished, ignoring artificial joins.
pub fn assert_balanced(events: &[ReportEvent]) {
    let started = events
        .iter()
        .filter(|e| e.code.is(EventCode::GROUP_STARTED))
        .count();
    let finished = events
        .iter()
        .filter(|e| e.code.is(EventCode::GROUP_FINISHED) && !e.code.is_artificial())
        .count();
    assert_eq!(started, finished, "unbalanced group events: {:?}", codes(events));
    assert_eq!(
        events.iter().filter(|e| e.code.is(EventCode::REPORT_STARTED)).count(),
        events.iter().filter(|e| e.code.is(EventCode::REPORT_FINISHED)).count()
    );
}
