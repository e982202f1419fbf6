mod common;

use common::fixtures::{by_region, two_regions};
use common::{TestResult, count, init_logger};
use quire::{
    CollectingListener, EventCode, ProcessingConfig, ProcessingPass, ReportProcessor, TableDataFactory, geometry,
};

fn paginating(page_height: f64) -> Result<ReportProcessor, Box<dyn std::error::Error>> {
    let config = ProcessingConfig {
        page_height,
        margin_top: 0.0,
        margin_bottom: 0.0,
        prepare_pass: false,
        paginate: true,
        ..ProcessingConfig::default()
    };
    Ok(ReportProcessor::builder(by_region())
        .with_data_factory(TableDataFactory::from_json(two_regions())?)
        .with_config(config)
        .build()?)
}

#[test]
fn test_single_page_when_everything_fits() -> TestResult {
    init_logger();
    let processor = paginating(842.0)?;
    let mut listener = CollectingListener::new();
    let summary = processor.paginate(&mut listener)?;

    assert_eq!(summary.page_count(), 1);
    assert_eq!(summary.rollbacks, 0);
    let events = listener.events();
    assert_eq!(events.first().map(|e| e.code), Some(EventCode::PAGE_STARTED));
    assert_eq!(events.last().map(|e| e.code), Some(EventCode::PAGE_FINISHED));
    assert_eq!(events.len(), 18);
    // title 40 + 2 * (header 20 + 3 * 12 + footer 20) + summary 30
    assert_eq!(summary.pages[0].used_height(), geometry::to_internal(222.0));
    Ok(())
}

#[test]
fn test_overflow_rolls_back_onto_a_new_page() -> TestResult {
    init_logger();
    let processor = paginating(100.0)?;
    let mut listener = CollectingListener::new();
    let summary = processor.paginate(&mut listener)?;
    let events = listener.events();

    assert_eq!(summary.page_count(), 3);
    assert_eq!(summary.rollbacks, 2);
    assert_eq!(summary.events, events.len());
    assert_eq!(count(events, EventCode::ITEMS_ADVANCED), 6);
    assert_eq!(count(events, EventCode::PAGE_STARTED), 3);
    assert_eq!(count(events, EventCode::PAGE_FINISHED), 3);

    // The first region's footer does not fit below its three items.
    let first_break = events
        .iter()
        .position(|e| e.code == EventCode::PAGE_FINISHED)
        .ok_or("no page break")?;
    assert_eq!(events[first_break - 1].code, EventCode::ITEMS_FINISHED);
    assert_eq!(events[first_break + 1].code, EventCode::PAGE_STARTED);
    assert_eq!(events[first_break + 2].code, EventCode::GROUP_FINISHED);

    // The report footer sits alone on the last page.
    let last = summary.pages.last().ok_or("no pages")?;
    assert_eq!(last.bands.len(), 1);
    assert_eq!(last.bands[0].code, EventCode::REPORT_FINISHED);

    let content = geometry::to_internal(100.0);
    for (i, page) in summary.pages.iter().enumerate() {
        assert_eq!(page.number, i + 1);
        assert!(page.used_height() <= content);
        assert!(page.bands.windows(2).all(|w| w[0].bounds.bottom() == w[1].bounds.origin().y));
    }
    Ok(())
}

#[test]
fn test_oversized_bands_still_terminate() -> TestResult {
    init_logger();
    let processor = paginating(25.0)?;
    let mut listener = CollectingListener::new();
    let summary = processor.paginate(&mut listener)?;

    assert_eq!(summary.rollbacks, summary.page_count() - 1);
    assert_eq!(count(listener.events(), EventCode::ITEMS_ADVANCED), 6);
    assert_eq!(count(listener.events(), EventCode::REPORT_FINISHED), 1);
    // The 40pt title is placed on an empty page even though it overflows.
    assert_eq!(summary.pages[0].bands.len(), 1);
    Ok(())
}

#[test]
fn test_page_events_describe_the_resumed_position() -> TestResult {
    init_logger();
    let processor = paginating(100.0)?;
    let mut listener = CollectingListener::new();
    processor.paginate(&mut listener)?;

    let events = listener.events();
    for (i, event) in events.iter().enumerate().skip(1) {
        if event.code == EventCode::PAGE_STARTED {
            let resumed = &events[i + 1];
            assert_eq!(event.cursor, resumed.cursor);
            assert_eq!(event.report_name, resumed.report_name);
        }
    }
    Ok(())
}

#[test]
fn test_process_routes_print_passes_through_paginator() -> TestResult {
    init_logger();
    let processor = paginating(100.0)?;
    let mut listener = CollectingListener::new();
    let summary = processor.process(&mut listener)?;

    assert!(summary.print.is_empty());
    assert_eq!(summary.pagination.len(), 1);
    assert_eq!(summary.pagination[0].page_count(), 3);

    // A plain traversal of the same processor sees no page events.
    let mut traversal = processor.traversal(ProcessingPass::Print)?;
    let mut plain = 0;
    while let Some(step) = traversal.step()? {
        assert!(!step.event.code.is(EventCode::PAGE_STARTED));
        plain += 1;
    }
    assert_eq!(plain, 16);
    Ok(())
}
