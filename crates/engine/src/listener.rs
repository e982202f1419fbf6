use crate::error::ReportProcessingError;
use crate::event::ReportEvent;
use quire_traits::DataRow;

/// Receives the events of a traversal in order.
///
/// `row` is the data row of the state the event was created from: the
/// position before the step committed.
pub trait ReportListener {
    /// # Errors
    ///
    /// A listener error stops the traversal unless the driver chooses to
    /// continue; it is reported as [`ReportProcessingError::Listener`].
    fn report_event(&mut self, event: &ReportEvent, row: &dyn DataRow) -> Result<(), ReportProcessingError>;
}

/// Collects every event it receives.
#[derive(Debug, Default, Clone)]
pub struct CollectingListener {
    events: Vec<ReportEvent>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ReportEvent> {
        self.events
    }

    /// Drops every event recorded after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }
}

impl ReportListener for CollectingListener {
    fn report_event(&mut self, event: &ReportEvent, _row: &dyn DataRow) -> Result<(), ReportProcessingError> {
        self.events.push(event.clone());
        Ok(())
    }
}

impl<F> ReportListener for F
where
    F: FnMut(&ReportEvent, &dyn DataRow) -> Result<(), ReportProcessingError>,
{
    fn report_event(&mut self, event: &ReportEvent, row: &dyn DataRow) -> Result<(), ReportProcessingError> {
        self(event, row)
    }
}
