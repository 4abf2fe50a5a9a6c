//! Facet catalog: the region and industry options offered by the landing page.

use scraper::{Html, Selector};
use tracing::debug;

use crate::error::CrawlError;
use crate::layout::{stripped_text, PageLayout, OPTION_SELECTOR};
use crate::record::FacetOption;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetCatalog {
    pub regions: Vec<FacetOption>,
    pub industries: Vec<FacetOption>,
}

impl FacetCatalog {
    /// Number of (region, industry) combinations the traversal will visit.
    pub fn combinations(&self) -> usize {
        self.regions.len() * self.industries.len()
    }
}

/// Read both facet option lists from a landing-page snapshot.
///
/// Fails with `CatalogEmpty` when either control is missing or offers no option
/// with a non-empty value; there is nothing to traverse in that case.
pub fn load_catalog(document: &Html, layout: &PageLayout) -> Result<FacetCatalog, CrawlError> {
    let regions = extract_options(document, &layout.region_control);
    if regions.is_empty() {
        return Err(CrawlError::CatalogEmpty {
            control: layout.region_control_id.clone(),
        });
    }

    let industries = extract_options(document, &layout.industry_control);
    if industries.is_empty() {
        return Err(CrawlError::CatalogEmpty {
            control: layout.industry_control_id.clone(),
        });
    }

    debug!("Facet catalog: {} regions, {} industries", regions.len(), industries.len());
    Ok(FacetCatalog { regions, industries })
}

/// All options of the first control matched by `control`, in page order.
/// Placeholder options (empty or whitespace-only value) are left out.
pub fn extract_options(document: &Html, control: &Selector) -> Vec<FacetOption> {
    let Some(select) = document.select(control).next() else {
        return Vec::new();
    };

    select
        .select(&OPTION_SELECTOR)
        .filter_map(|option| {
            let value = option.value().attr("value").unwrap_or("").trim();
            if value.is_empty() {
                return None;
            }
            Some(FacetOption::new(stripped_text(option), value))
        })
        .collect()
}
