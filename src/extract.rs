//! Member Record Extractor: listing container → basic member records.

use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use crate::layout::{stripped_text, PageLayout};
use crate::record::{FacetPair, MemberRecord, MISSING};

/// Extract one record per member entry of the listing container.
///
/// Never fails: a missing container yields no records and any missing
/// sub-field of an entry degrades to `"N/A"`.
pub fn extract_members(
    document: &Html,
    layout: &PageLayout,
    pair: FacetPair<'_>,
    base_url: &Url,
) -> Vec<MemberRecord> {
    let Some(container) = document.select(&layout.listing_container).next() else {
        debug!("Listing container not found for {}", pair);
        return Vec::new();
    };

    let records: Vec<MemberRecord> = container
        .select(&layout.member_entry)
        .map(|entry| extract_entry(entry, layout, pair, base_url))
        .collect();

    debug!("Extracted {} member entries for {}", records.len(), pair);
    records
}

fn extract_entry(entry: ElementRef<'_>, layout: &PageLayout, pair: FacetPair<'_>, base_url: &Url) -> MemberRecord {
    let identifier = entry
        .select(&layout.member_identifier)
        .next()
        .map(stripped_text)
        .unwrap_or_else(|| MISSING.to_string());

    let name_link = entry.select(&layout.member_name_link).next();

    let name_local = name_link
        .map(stripped_text)
        .unwrap_or_else(|| MISSING.to_string());

    let detail_url = name_link
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| resolve_url(base_url, href))
        .unwrap_or_else(|| MISSING.to_string());

    MemberRecord::new(
        identifier,
        name_local,
        detail_url,
        pair.region.text.clone(),
        pair.industry.text.clone(),
    )
}

/// Resolve `href` against the directory base URL the way a browser would.
pub fn resolve_url(base_url: &Url, href: &str) -> Option<String> {
    match base_url.join(href) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            debug!("Unresolvable detail link '{}': {}", href, e);
            None
        }
    }
}
