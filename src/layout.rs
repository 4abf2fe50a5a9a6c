//! Compiled page structure.
//!
//! `SelectorsConfig` holds selector strings; `PageLayout` parses them once so the
//! extractor and correlator can run against every snapshot without re-parsing.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use crate::config::{ConfigError, IconLinkConfig, SelectorsConfig};

// Safety: All .unwrap() calls below are safe because the selector strings are
// compile-time constants containing valid CSS selectors.
pub(crate) static OPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("option").unwrap());

pub(crate) static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

pub(crate) static LABEL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("label").unwrap());

pub(crate) static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

#[derive(Debug, Clone)]
pub struct PageLayout {
    pub region_control_id: String,
    pub industry_control_id: String,
    pub region_control: Selector,
    pub industry_control: Selector,
    pub listing_container: Selector,
    pub member_entry: Selector,
    pub member_identifier: Selector,
    pub member_name_link: Selector,
    pub modal_body: Selector,
    pub modal_label: Selector,
    pub modal_content: Selector,
    pub modal_link: Selector,
    pub identifier_label: String,
    pub icon_links: Vec<IconLinkConfig>,
    /// CSS query that matches a member entry inside the listing container
    pub entry_probe: String,
}

impl PageLayout {
    pub fn compile(config: &SelectorsConfig) -> Result<Self, ConfigError> {
        let region_control_selector = control_selector(&config.region_control_id);
        let industry_control_selector = control_selector(&config.industry_control_id);
        let entry_probe = format!("{} {}", config.listing_container, config.member_entry);

        Ok(Self {
            region_control_id: config.region_control_id.clone(),
            industry_control_id: config.industry_control_id.clone(),
            region_control: parse("selectors.region_control_id", &region_control_selector)?,
            industry_control: parse("selectors.industry_control_id", &industry_control_selector)?,
            listing_container: parse("selectors.listing_container", &config.listing_container)?,
            member_entry: parse("selectors.member_entry", &config.member_entry)?,
            member_identifier: parse("selectors.member_identifier", &config.member_identifier)?,
            member_name_link: parse("selectors.member_name_link", &config.member_name_link)?,
            modal_body: parse("selectors.modal_body", &config.modal_body)?,
            modal_label: parse("selectors.modal_label", &config.modal_label)?,
            modal_content: parse("selectors.modal_content", &config.modal_content)?,
            modal_link: parse("selectors.modal_link", &config.modal_link)?,
            identifier_label: config.identifier_label.trim().to_string(),
            icon_links: config.icon_links.clone(),
            entry_probe,
        })
    }

    /// CSS query for the region control, usable against the live page.
    pub fn region_probe(&self) -> String {
        control_selector(&self.region_control_id)
    }
}

/// `select` element addressed by id; attribute form tolerates ids that are not valid CSS identifiers.
fn control_selector(id: &str) -> String {
    format!("select[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\""))
}

fn parse(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}

/// Text of an element with each text node trimmed and the pieces joined.
pub fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// First following sibling element matched by `selector`.
pub fn next_sibling_matching<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| selector.matches(sibling))
}
