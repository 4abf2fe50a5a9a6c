//! Crawl Coordinator.
//!
//! Walks the full region x industry cross-product of the facet catalog in one
//! live session. The coordinator is the only place that decides whether a leaf
//! error skips the current combination or ends the run; either way the session
//! is closed and whatever was collected is handed back in the report.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::BrowserSession;
use crate::catalog::{load_catalog, FacetCatalog};
use crate::config::{AppConfig, ConfigError};
use crate::correlate::correlate;
use crate::error::CrawlError;
use crate::extract::extract_members;
use crate::facets::select_facet;
use crate::layout::PageLayout;
use crate::logger::CrawlLogger;
use crate::record::{FacetOption, FacetPair, MemberRecord};
use crate::store::AggregationStore;
use crate::waiter::{wait_for_content, wait_for_element, ContentState, WaitPolicy};

/// Timing and addressing for one crawl, resolved from configuration.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub page_url: Url,
    /// Relative detail links are resolved against this
    pub base_url: Url,
    /// Bound on the landing page showing its region control
    pub catalog_wait: WaitPolicy,
    /// Bound on the listing showing a member entry after a facet change
    pub content_wait: WaitPolicy,
    pub region_settle: Duration,
    pub industry_delay: Duration,
    pub region_delay: Duration,
}

impl CrawlSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let crawl = &config.crawl;
        Ok(Self {
            page_url: config.page_url()?,
            base_url: config.base_url()?,
            catalog_wait: WaitPolicy::new(crawl.catalog_timeout(), crawl.content_poll_interval()),
            content_wait: WaitPolicy::new(crawl.content_timeout(), crawl.content_poll_interval()),
            region_settle: crawl.region_settle(),
            industry_delay: crawl.industry_delay(),
            region_delay: crawl.region_delay(),
        })
    }
}

/// Why a facet combination produced no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The region value could not be selected; all its industries are skipped
    RegionRejected(String),
    /// The industry selection failed
    IndustryRejected(String),
    /// No member entry appeared before the content timeout
    NoContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::RegionRejected(reason) => write!(f, "region rejected: {}", reason),
            SkipReason::IndustryRejected(reason) => write!(f, "industry rejected: {}", reason),
            SkipReason::NoContent => write!(f, "no members listed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCombination {
    pub region: String,
    pub industry: String,
    pub reason: SkipReason,
}

/// Everything a finished (or aborted) crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Unique records in first-seen order
    pub records: Vec<MemberRecord>,
    pub regions: usize,
    pub industries: usize,
    /// Combinations whose industry selection was attempted
    pub visited: usize,
    pub skipped: Vec<SkippedCombination>,
    pub inserted: usize,
    pub duplicates: usize,
    /// Set when the run ended before the last combination
    pub aborted: Option<String>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl CrawlReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Navigate to the landing page and read its facet catalog.
///
/// The region control is waited for first; a page that never shows it is
/// treated as a missing control.
pub fn fetch_catalog<S>(session: &mut S, layout: &PageLayout, settings: &CrawlSettings) -> Result<FacetCatalog, CrawlError>
where
    S: BrowserSession + ?Sized,
{
    session
        .navigate(settings.page_url.as_str())
        .map_err(CrawlError::Session)?;

    if !wait_for_element(session, &layout.region_probe(), settings.catalog_wait)? {
        return Err(CrawlError::ControlNotFound {
            control: layout.region_control_id.clone(),
        });
    }

    let html = session.snapshot().map_err(CrawlError::Session)?;
    load_catalog(&Html::parse_document(&html), layout)
}

/// Mutable progress of one traversal, kept outside the coordinator so it
/// survives an early return.
#[derive(Default)]
struct Traversal {
    store: AggregationStore,
    regions: usize,
    industries: usize,
    visited: usize,
    skipped: Vec<SkippedCombination>,
    duplicates: usize,
}

impl Traversal {
    fn skip(&mut self, pair: FacetPair<'_>, reason: SkipReason) {
        self.skipped.push(SkippedCombination {
            region: pair.region.text.clone(),
            industry: pair.industry.text.clone(),
            reason,
        });
    }
}

pub struct Crawler<'a, S: BrowserSession> {
    session: S,
    layout: &'a PageLayout,
    settings: CrawlSettings,
    interrupt: Option<&'a AtomicBool>,
    logger: Option<Arc<CrawlLogger>>,
}

impl<'a, S: BrowserSession> Crawler<'a, S> {
    pub fn new(session: S, layout: &'a PageLayout, settings: CrawlSettings) -> Self {
        Self {
            session,
            layout,
            settings,
            interrupt: None,
            logger: None,
        }
    }

    /// Stop between combinations once `flag` is set.
    pub fn with_interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn with_logger(mut self, logger: Arc<CrawlLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Run the whole crawl. Never fails: fatal errors end the traversal early
    /// and are reported in `CrawlReport::aborted` next to the partial results.
    pub fn run(mut self) -> CrawlReport {
        let started_at = Local::now();
        let mut traversal = Traversal::default();

        let outcome = self.traverse(&mut traversal);

        if let Err(e) = self.session.close() {
            warn!("Failed to close browser session: {:#}", e);
        }

        let aborted = match outcome {
            Ok(()) => {
                self.finish_progress("Crawl completed");
                None
            }
            Err(e) => {
                warn!("Crawl aborted: {}", e);
                self.finish_progress("Crawl stopped early");
                if let Some(logger) = &self.logger {
                    logger.log_crawl_aborted(&e.to_string());
                }
                Some(e.to_string())
            }
        };

        let records = traversal.store.into_records();
        info!(
            "Crawl finished: {} records, {} visited, {} skipped",
            records.len(),
            traversal.visited,
            traversal.skipped.len()
        );

        CrawlReport {
            inserted: records.len(),
            records,
            regions: traversal.regions,
            industries: traversal.industries,
            visited: traversal.visited,
            skipped: traversal.skipped,
            duplicates: traversal.duplicates,
            aborted,
            started_at,
            finished_at: Local::now(),
        }
    }

    fn traverse(&mut self, t: &mut Traversal) -> Result<(), CrawlError> {
        if let Some(logger) = &self.logger {
            logger.log_initialization(self.settings.page_url.as_str());
        }

        let catalog = fetch_catalog(&mut self.session, self.layout, &self.settings)?;
        t.regions = catalog.regions.len();
        t.industries = catalog.industries.len();
        if let Some(logger) = &self.logger {
            logger.log_catalog_loaded(t.regions, t.industries);
            logger.start_progress(catalog.combinations() as u64);
        }

        for (index, region) in catalog.regions.iter().enumerate() {
            self.check_interrupt()?;
            if let Some(logger) = &self.logger {
                logger.log_region_start(&region.text, index, t.regions);
            }

            match select_facet(&mut self.session, &self.layout.region_control_id, &region.value) {
                Ok(()) => {}
                Err(e @ CrawlError::ValueNotSelectable { .. }) => {
                    self.skip_region(region, &catalog.industries, &e.to_string(), t);
                    continue;
                }
                Err(e) => return Err(e),
            }
            pause(self.settings.region_settle);

            for industry in &catalog.industries {
                self.check_interrupt()?;
                self.visit(FacetPair::new(region, industry), t)?;
                self.advance_progress();
            }

            pause(self.settings.region_delay);
        }

        Ok(())
    }

    /// One combination: select the industry, wait, extract, correlate, store.
    fn visit(&mut self, pair: FacetPair<'_>, t: &mut Traversal) -> Result<(), CrawlError> {
        t.visited += 1;
        if let Some(logger) = &self.logger {
            logger.log_combination_start(pair);
        }

        match select_facet(&mut self.session, &self.layout.industry_control_id, &pair.industry.value) {
            Ok(()) => {}
            Err(e) if e.is_skippable() => {
                self.skip(pair, SkipReason::IndustryRejected(e.to_string()), t);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        if wait_for_content(&mut self.session, &self.layout.entry_probe, self.settings.content_wait)? == ContentState::NoContent {
            self.skip(pair, SkipReason::NoContent, t);
            return Ok(());
        }

        let html = self.session.snapshot().map_err(CrawlError::Session)?;
        let document = Html::parse_document(&html);
        let records = extract_members(&document, self.layout, pair, &self.settings.base_url);

        let extracted = records.len();
        let mut inserted = 0;
        let mut correlated = 0;
        for mut record in records {
            if correlate(&document, self.layout, &mut record) {
                correlated += 1;
            }
            if t.store.insert(record) {
                inserted += 1;
            } else {
                t.duplicates += 1;
            }
        }

        debug!("{}: {} extracted, {} inserted, {} correlated", pair, extracted, inserted, correlated);
        if let Some(logger) = &self.logger {
            logger.log_combination_members(pair, extracted, inserted, correlated);
        }
        // Only a combination that produced a listing is paced
        pause(self.settings.industry_delay);
        Ok(())
    }

    fn skip(&self, pair: FacetPair<'_>, reason: SkipReason, t: &mut Traversal) {
        debug!("Skipping {}: {}", pair, reason);
        if let Some(logger) = &self.logger {
            logger.log_combination_skipped(pair, &reason.to_string());
        }
        t.skip(pair, reason);
    }

    fn skip_region(&self, region: &FacetOption, industries: &[FacetOption], reason: &str, t: &mut Traversal) {
        warn!("Skipping region '{}': {}", region.text, reason);
        if let Some(logger) = &self.logger {
            logger.log_region_skipped(&region.text, reason);
        }
        for industry in industries {
            t.skip(FacetPair::new(region, industry), SkipReason::RegionRejected(reason.to_string()));
            self.advance_progress();
        }
    }

    fn check_interrupt(&self) -> Result<(), CrawlError> {
        match self.interrupt {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(CrawlError::Interrupted),
            _ => Ok(()),
        }
    }

    fn advance_progress(&self) {
        if let Some(logger) = &self.logger {
            logger.advance_progress(1);
        }
    }

    fn finish_progress(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger.finish_progress(message);
        }
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
