//! Coordinator behaviour over a scripted session serving fixture pages.

mod common;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::fixtures::{default_layout, instant_settings, load_fixture};
use common::scripted_session::{ScriptedSession, INDUSTRY_CONTROL, REGION_CONTROL};
use memberfinder::crawler::{Crawler, SkipReason};
use memberfinder::logger::{skip_trace, CrawlLogger, VerbosityLevel};
use memberfinder::record::MISSING;

/// North has listings for both industries, central only for textiles.
fn directory_session() -> ScriptedSession {
    ScriptedSession::new(load_fixture("landing.html"))
        .with_page("1", "7", load_fixture("listing_north_textile.html"))
        .with_page("1", "8", load_fixture("listing_north_electronics.html"))
        .with_page("2", "7", load_fixture("listing_central_textile.html"))
}

fn selection(control: &str, value: &str) -> (String, String) {
    (control.to_string(), value.to_string())
}

fn identifiers(records: &[memberfinder::MemberRecord]) -> Vec<&str> {
    records.iter().map(|r| r.identifier.as_str()).collect()
}

#[test]
fn test_visits_every_combination_regions_outer() {
    let layout = default_layout();
    let session = directory_session();
    let log = session.log();

    let report = Crawler::new(session, &layout, instant_settings()).run();

    assert!(report.is_complete(), "unexpected abort: {:?}", report.aborted);
    assert_eq!(report.regions, 2);
    assert_eq!(report.industries, 2);
    assert_eq!(report.visited, 4);

    let log = log.borrow();
    assert_eq!(
        log.selections,
        vec![
            selection(REGION_CONTROL, "1"),
            selection(INDUSTRY_CONTROL, "7"),
            selection(INDUSTRY_CONTROL, "8"),
            selection(REGION_CONTROL, "2"),
            selection(INDUSTRY_CONTROL, "7"),
            selection(INDUSTRY_CONTROL, "8"),
        ],
        "placeholder options must never be selected"
    );
    assert_eq!(log.navigations, vec!["https://btbvn.vn/".to_string()]);
    assert_eq!(log.closed, 1);
}

#[test]
fn test_no_content_combination_is_skipped_and_crawl_continues() {
    let layout = default_layout();
    let report = Crawler::new(directory_session(), &layout, instant_settings()).run();

    assert!(report.is_complete());
    assert_eq!(report.skipped.len(), 1);
    let skipped = &report.skipped[0];
    assert_eq!(skipped.region, "中部");
    assert_eq!(skipped.industry, "電子");
    assert_eq!(skipped.reason, SkipReason::NoContent);
}

#[test]
fn test_cross_listed_member_keeps_first_occurrence() {
    let layout = default_layout();
    let report = Crawler::new(directory_session(), &layout, instant_settings()).run();

    assert_eq!(
        identifiers(&report.records),
        vec!["NIA01476", "NIA01502", MISSING, "NIA03001", "NIA04000"]
    );
    assert_eq!(report.inserted, 5);
    assert_eq!(report.duplicates, 1);

    let first = &report.records[0];
    assert_eq!(first.industry_label, "紡織");
    assert_eq!(first.field("電話"), Some("02-1234567"));

    let eastern = &report.records[3];
    assert_eq!(eastern.region_label, "北部");
    assert_eq!(eastern.industry_label, "電子");
    assert_eq!(eastern.field("WeChat"), Some("weixin://dl/chat?eastern"));
}

#[test]
fn test_rejected_region_skips_all_its_industries() {
    let layout = default_layout();
    let session = directory_session().rejecting(REGION_CONTROL, "1");
    let log = session.log();

    let report = Crawler::new(session, &layout, instant_settings()).run();

    assert!(report.is_complete());
    assert_eq!(report.visited, 2);
    assert_eq!(identifiers(&report.records), vec!["NIA04000"]);

    let region_skips: Vec<_> = report
        .skipped
        .iter()
        .filter(|s| matches!(s.reason, SkipReason::RegionRejected(_)))
        .map(|s| (s.region.as_str(), s.industry.as_str()))
        .collect();
    assert_eq!(region_skips, vec![("北部", "紡織"), ("北部", "電子")]);

    // No industry is selected under the rejected region
    assert_eq!(
        log.borrow().selections,
        vec![
            selection(REGION_CONTROL, "1"),
            selection(REGION_CONTROL, "2"),
            selection(INDUSTRY_CONTROL, "7"),
            selection(INDUSTRY_CONTROL, "8"),
        ]
    );
}

#[test]
fn test_rejected_industry_is_skipped_per_combination() {
    let layout = default_layout();
    let session = directory_session().rejecting(INDUSTRY_CONTROL, "8");

    let report = Crawler::new(session, &layout, instant_settings()).run();

    assert!(report.is_complete());
    assert_eq!(report.visited, 4);
    assert_eq!(identifiers(&report.records), vec!["NIA01476", "NIA01502", MISSING, "NIA04000"]);
    let rejected: Vec<_> = report
        .skipped
        .iter()
        .filter(|s| matches!(s.reason, SkipReason::IndustryRejected(_)))
        .map(|s| s.region.as_str())
        .collect();
    assert_eq!(rejected, vec!["北部", "中部"]);
}

#[test]
fn test_missing_industry_control_skips_instead_of_aborting() {
    let layout = default_layout();
    let session = directory_session().without_control(INDUSTRY_CONTROL);

    let report = Crawler::new(session, &layout, instant_settings()).run();

    assert!(report.is_complete());
    assert!(report.records.is_empty());
    assert_eq!(report.skipped.len(), 4);
}

#[test]
fn test_missing_region_control_aborts() {
    let layout = default_layout();
    let session = directory_session().without_control(REGION_CONTROL);
    let log = session.log();

    let report = Crawler::new(session, &layout, instant_settings()).run();

    let reason = report.aborted.as_deref().expect("crawl should abort");
    assert!(reason.contains("select-brand-list"), "got: {}", reason);
    assert_eq!(report.visited, 0);
    assert_eq!(log.borrow().closed, 1);
}

#[test]
fn test_landing_without_region_control_aborts_before_catalog() {
    let layout = default_layout();
    let landing = load_fixture("landing.html").replace("select-brand-list", "select-elsewhere");
    let session = ScriptedSession::new(landing);
    let log = session.log();

    let report = Crawler::new(session, &layout, instant_settings()).run();

    let reason = report.aborted.as_deref().expect("crawl should abort");
    assert!(reason.contains("not found"), "got: {}", reason);
    assert_eq!(report.regions, 0);
    assert_eq!(log.borrow().snapshots, 0);
    assert_eq!(log.borrow().closed, 1);
}

#[test]
fn test_session_fault_aborts_with_partial_results() {
    let layout = default_layout();
    let session = directory_session().failing_on(REGION_CONTROL, "2");
    let log = session.log();

    let report = Crawler::new(session, &layout, instant_settings()).run();

    let reason = report.aborted.as_deref().expect("crawl should abort");
    assert!(reason.contains("browser session error"), "got: {}", reason);
    assert!(reason.contains("Target closed"), "got: {}", reason);
    assert_eq!(
        identifiers(&report.records),
        vec!["NIA01476", "NIA01502", MISSING, "NIA03001"]
    );
    assert_eq!(log.borrow().closed, 1);
}

#[test]
fn test_interrupt_stops_between_combinations() {
    let layout = default_layout();
    let flag = Arc::new(AtomicBool::new(false));
    let session = directory_session().interrupting_on(INDUSTRY_CONTROL, "8", Arc::clone(&flag));
    let log = session.log();

    let report = Crawler::new(session, &layout, instant_settings())
        .with_interrupt(&flag)
        .run();

    assert_eq!(report.aborted.as_deref(), Some("crawl interrupted"));
    // The combination in flight when the flag was raised still completes
    assert_eq!(report.visited, 2);
    assert_eq!(report.records.len(), 4);
    assert!(!log.borrow().selections.contains(&selection(REGION_CONTROL, "2")));
    assert_eq!(log.borrow().closed, 1);
}

#[test]
fn test_logger_records_skips() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("crawl.log");
    let logger = Arc::new(CrawlLogger::with_log_file(VerbosityLevel::Debug, &log_path));
    let layout = default_layout();

    let report = Crawler::new(directory_session(), &layout, instant_settings())
        .with_logger(Arc::clone(&logger))
        .run();
    assert!(report.is_complete());

    logger.export_logs().unwrap();
    let written = std::fs::read_to_string(&log_path).unwrap();
    assert!(written.contains("Facet catalog loaded: 2 regions x 2 industries"));
    assert!(written.contains("Skipping 所在區域='中部', 所屬行業='電子': no members listed"));
}

#[test]
fn test_default_verbosity_logs_skip_reasons() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("crawl.log");
    let logger = Arc::new(CrawlLogger::with_log_file(VerbosityLevel::from_verbose_count(0), &log_path));
    let layout = default_layout();
    let session = directory_session().rejecting(REGION_CONTROL, "1");

    let report = Crawler::new(session, &layout, instant_settings())
        .with_logger(Arc::clone(&logger))
        .run();
    assert_eq!(report.skipped.len(), 3);

    logger.export_logs().unwrap();
    let written = std::fs::read_to_string(&log_path).unwrap();
    assert!(written.contains("Skipping region '北部'"), "got: {}", written);
    assert!(written.contains("Skipping 所在區域='中部', 所屬行業='電子': no members listed"), "got: {}", written);

    let trace = skip_trace(&report);
    assert_eq!(trace.len(), 3);
    assert_eq!(trace[2], "中部 / 電子: no members listed");
}

#[test]
fn test_detail_links_resolve_against_base_url() {
    let layout = default_layout();
    let mut settings = instant_settings();
    settings.base_url = url::Url::parse("https://members.example/directory/").unwrap();
    let session = directory_session();
    let log = session.log();

    let report = Crawler::new(session, &layout, settings).run();

    assert_eq!(log.borrow().navigations, vec!["https://btbvn.vn/".to_string()]);
    assert_eq!(report.records[0].detail_url, "https://members.example/directory/member/NIA01476");
    assert_eq!(report.records[1].detail_url, "https://members.example/member/NIA01502");
}

#[test]
fn test_skipped_combinations_are_not_paced() {
    let layout = default_layout();
    let mut settings = instant_settings();
    settings.industry_delay = Duration::from_secs(5);
    let session = directory_session().without_control(INDUSTRY_CONTROL);

    let started = Instant::now();
    let report = Crawler::new(session, &layout, settings).run();

    assert_eq!(report.skipped.len(), 4);
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
}

#[test]
fn test_extracted_combinations_are_paced() {
    let layout = default_layout();
    let mut settings = instant_settings();
    settings.industry_delay = Duration::from_millis(100);

    let started = Instant::now();
    let report = Crawler::new(directory_session(), &layout, settings).run();

    // Three listings were read, the empty one was skipped
    assert_eq!(report.skipped.len(), 1);
    assert!(started.elapsed() >= Duration::from_millis(300), "took {:?}", started.elapsed());
}
