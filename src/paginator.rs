// src/paginator.rs
//! Places the bands of a print pass on pages.
//!
//! The paginator is a consumer of the traversal: it takes a checkpoint before
//! every step, and when the band produced by a step does not fit on the
//! current page it rolls back, closes the page and derives the same step
//! again on a fresh one.

use crate::error::ProcessingError;
use crate::traversal::Traversal;
use quire_engine::{ReportEvent, ReportListener};
use quire_types::{EventCode, StrictBounds, geometry};

/// A band placed on a page, in micro-points relative to the content area.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBand {
    pub code: EventCode,
    pub report_name: String,
    pub bounds: StrictBounds,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub number: usize,
    pub bands: Vec<PlacedBand>,
}

impl Page {
    /// Used height in micro-points.
    pub fn used_height(&self) -> i64 {
        self.bands.last().map_or(0, |band| band.bounds.bottom())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginationSummary {
    pub pages: Vec<Page>,
    pub events: usize,
    pub rollbacks: usize,
}

impl PaginationSummary {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    content_width: i64,
    content_height: i64,
}

impl Paginator {
    /// Both dimensions in micro-points.
    pub fn new(content_width: i64, content_height: i64) -> Self {
        Self {
            content_width,
            content_height,
        }
    }

    /// Runs `traversal` to completion, delivering page and band events to
    /// `listener` in output order.
    pub fn run(
        &self,
        traversal: &mut Traversal,
        listener: &mut dyn ReportListener,
    ) -> Result<PaginationSummary, ProcessingError> {
        let mut summary = PaginationSummary::default();
        let mut page = Page {
            number: 1,
            bands: Vec::new(),
        };
        self.page_event(EventCode::PAGE_STARTED, traversal, listener, &mut summary)?;

        loop {
            let checkpoint = traversal.checkpoint();
            let Some(step) = traversal.step()? else {
                break;
            };
            let height = step.band_height();
            let used = page.used_height();

            if used > 0 && used + height > self.content_height {
                traversal.rollback(checkpoint);
                summary.rollbacks += 1;
                self.page_event(EventCode::PAGE_FINISHED, traversal, listener, &mut summary)?;
                log::info!(
                    "Page {} full at {:.2}pt, starting page {}",
                    page.number,
                    geometry::to_external(used),
                    page.number + 1
                );
                let number = page.number + 1;
                summary.pages.push(std::mem::replace(
                    &mut page,
                    Page {
                        number,
                        bands: Vec::new(),
                    },
                ));
                self.page_event(EventCode::PAGE_STARTED, traversal, listener, &mut summary)?;
                continue;
            }

            if height > self.content_height {
                log::warn!(
                    "Band of {} ({:.2}pt) is taller than the page content area",
                    step.event.code,
                    geometry::to_external(height)
                );
            }
            if step.state().current_band().is_some() && height > 0 {
                page.bands.push(PlacedBand {
                    code: step.event.code,
                    report_name: step.event.report_name.clone(),
                    bounds: StrictBounds::new(0, used, self.content_width, height),
                });
            }
            listener.report_event(&step.event, &step.row())?;
            summary.events += 1;
        }

        self.page_event(EventCode::PAGE_FINISHED, traversal, listener, &mut summary)?;
        summary.pages.push(page);
        Ok(summary)
    }

    fn page_event(
        &self,
        code: EventCode,
        traversal: &Traversal,
        listener: &mut dyn ReportListener,
        summary: &mut PaginationSummary,
    ) -> Result<(), ProcessingError> {
        let state = traversal.state();
        let event = ReportEvent::new(code, state);
        listener.report_event(&event, &state.data_row())?;
        summary.events += 1;
        Ok(())
    }
}
