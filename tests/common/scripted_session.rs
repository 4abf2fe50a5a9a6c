//! A `BrowserSession` that serves fixture pages instead of driving Chrome.
//!
//! The "live" page is the listing registered for the current region/industry
//! selection, or the landing page when nothing is registered. Element probes
//! run real CSS selectors against that page.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use memberfinder::browser::{BrowserSession, SelectOutcome};
use scraper::{Html, Selector};

pub const REGION_CONTROL: &str = "select-brand-list";
pub const INDUSTRY_CONTROL: &str = "select-nghe-list";

/// What the crawl did to the session, readable after the session is consumed.
#[derive(Debug, Default)]
pub struct SessionLog {
    pub navigations: Vec<String>,
    pub selections: Vec<(String, String)>,
    pub snapshots: usize,
    pub closed: usize,
}

pub struct ScriptedSession {
    landing: String,
    pages: HashMap<(String, String), String>,
    rejected: HashSet<(String, String)>,
    missing_controls: HashSet<String>,
    faults: HashSet<(String, String)>,
    interrupt_on: Option<((String, String), Arc<AtomicBool>)>,
    region: Option<String>,
    industry: Option<String>,
    log: Rc<RefCell<SessionLog>>,
}

impl ScriptedSession {
    pub fn new(landing: impl Into<String>) -> Self {
        Self {
            landing: landing.into(),
            pages: HashMap::new(),
            rejected: HashSet::new(),
            missing_controls: HashSet::new(),
            faults: HashSet::new(),
            interrupt_on: None,
            region: None,
            industry: None,
            log: Rc::new(RefCell::new(SessionLog::default())),
        }
    }

    /// Serve `html` once region `region` and industry `industry` are selected.
    pub fn with_page(mut self, region: &str, industry: &str, html: impl Into<String>) -> Self {
        self.pages.insert((region.to_string(), industry.to_string()), html.into());
        self
    }

    pub fn rejecting(mut self, control: &str, value: &str) -> Self {
        self.rejected.insert((control.to_string(), value.to_string()));
        self
    }

    pub fn without_control(mut self, control: &str) -> Self {
        self.missing_controls.insert(control.to_string());
        self
    }

    /// Fail with a session error when `value` is selected in `control`.
    pub fn failing_on(mut self, control: &str, value: &str) -> Self {
        self.faults.insert((control.to_string(), value.to_string()));
        self
    }

    /// Raise `flag` when `value` is selected in `control`, like a Ctrl-C arriving mid-crawl.
    pub fn interrupting_on(mut self, control: &str, value: &str, flag: Arc<AtomicBool>) -> Self {
        self.interrupt_on = Some(((control.to_string(), value.to_string()), flag));
        self
    }

    pub fn log(&self) -> Rc<RefCell<SessionLog>> {
        Rc::clone(&self.log)
    }

    fn current_page(&self) -> &str {
        match (&self.region, &self.industry) {
            (Some(region), Some(industry)) => self
                .pages
                .get(&(region.clone(), industry.clone()))
                .map(String::as_str)
                .unwrap_or(self.landing.as_str()),
            _ => self.landing.as_str(),
        }
    }
}

impl BrowserSession for ScriptedSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.log.borrow_mut().navigations.push(url.to_string());
        self.region = None;
        self.industry = None;
        Ok(())
    }

    fn element_exists(&mut self, css: &str) -> Result<bool> {
        let selector = Selector::parse(css).map_err(|e| anyhow!("bad selector {}: {:?}", css, e))?;
        let document = Html::parse_document(self.current_page());
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }

    fn select_option_by_value(&mut self, control_id: &str, value: &str) -> Result<SelectOutcome> {
        let key = (control_id.to_string(), value.to_string());
        self.log.borrow_mut().selections.push(key.clone());

        if self.faults.contains(&key) {
            return Err(anyhow!("Target closed while selecting {}", value));
        }
        if let Some((trigger, flag)) = &self.interrupt_on {
            if *trigger == key {
                flag.store(true, Ordering::SeqCst);
            }
        }
        if self.missing_controls.contains(control_id) {
            return Ok(SelectOutcome::ControlMissing);
        }
        if self.rejected.contains(&key) {
            return Ok(SelectOutcome::ValueRejected);
        }

        if control_id == REGION_CONTROL {
            self.region = Some(value.to_string());
            self.industry = None;
        } else if control_id == INDUSTRY_CONTROL {
            self.industry = Some(value.to_string());
        }
        Ok(SelectOutcome::Selected)
    }

    fn snapshot(&mut self) -> Result<String> {
        self.log.borrow_mut().snapshots += 1;
        Ok(self.current_page().to_string())
    }

    fn close(&mut self) -> Result<()> {
        self.log.borrow_mut().closed += 1;
        Ok(())
    }
}
