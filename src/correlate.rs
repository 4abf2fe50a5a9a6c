//! Detail Correlator.
//!
//! Every member's full details sit in a modal fragment elsewhere in the page.
//! Fragments are not nested under their listing entry and are not positionally
//! keyed to it, so the join is done on the identifier each fragment embeds:
//! a linear scan in document order, first match wins. Two fragments carrying
//! the same identifier are not detected; the later one is never read.

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::layout::{next_sibling_matching, stripped_text, PageLayout, IMG_SELECTOR, LABEL_SELECTOR, PARAGRAPH_SELECTOR};
use crate::record::MemberRecord;

/// Merge the fields of the record's detail fragment into `record`.
///
/// Returns `false`, leaving the record untouched, when no fragment in
/// `document` embeds the record's identifier.
pub fn correlate(document: &Html, layout: &PageLayout, record: &mut MemberRecord) -> bool {
    if !record.has_identifier() {
        return false;
    }

    let Some(fragment) = find_detail_fragment(document, layout, &record.identifier) else {
        debug!("No detail fragment for {}", record.identifier);
        return false;
    };

    let fields = detail_fields(fragment, layout);
    debug!("Merging {} detail field(s) into {}", fields.len(), record.identifier);
    for (name, value) in fields {
        record.set_field(&name, value);
    }
    true
}

/// First modal fragment whose embedded identifier equals `identifier`.
pub fn find_detail_fragment<'a>(document: &'a Html, layout: &PageLayout, identifier: &str) -> Option<ElementRef<'a>> {
    document
        .select(&layout.modal_body)
        .find(|fragment| embedded_identifier(*fragment, layout).as_deref() == Some(identifier))
}

/// The identifier a fragment carries: the first paragraph of the content block
/// paired with the identifier label.
pub fn embedded_identifier(fragment: ElementRef<'_>, layout: &PageLayout) -> Option<String> {
    let label = fragment
        .select(&LABEL_SELECTOR)
        .find(|label| stripped_text(*label) == layout.identifier_label)?;
    let content = next_sibling_matching(label, &layout.modal_content)?;
    let paragraph = content.select(&PARAGRAPH_SELECTOR).next()?;
    Some(stripped_text(paragraph))
}

/// Label → value pairs of a fragment, in document order.
///
/// Icon-only labels store their link target under the icon's canonical field
/// name. Other labels are named by their text with colons removed; labels whose
/// name ends up empty, or that have no paired content block, are skipped.
pub fn detail_fields(fragment: ElementRef<'_>, layout: &PageLayout) -> Vec<(String, String)> {
    let mut fields = Vec::new();

    for label in fragment.select(&layout.modal_label) {
        let Some(content) = next_sibling_matching(label, &layout.modal_content) else {
            continue;
        };

        if let Some(field) = icon_field(label, layout) {
            let href = content
                .select(&layout.modal_link)
                .next()
                .and_then(|link| link.value().attr("href"))
                .map(|href| href.trim().to_string())
                .unwrap_or_default();
            fields.push((field.to_string(), href));
            continue;
        }

        let name = field_name(&stripped_text(label));
        if name.is_empty() {
            continue;
        }
        let value = match content.select(&PARAGRAPH_SELECTOR).next() {
            Some(paragraph) => stripped_text(paragraph),
            None => stripped_text(content),
        };
        fields.push((name, value));
    }

    fields
}

/// Canonical field of the first recognized icon inside `label`, if any.
fn icon_field<'l>(label: ElementRef<'_>, layout: &'l PageLayout) -> Option<&'l str> {
    let sources: Vec<&str> = label
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .collect();

    layout
        .icon_links
        .iter()
        .find(|icon| sources.iter().any(|src| icon_matches(src, &icon.marker)))
        .map(|icon| icon.field.as_str())
}

/// `src` is the marker itself, or an absolute/rooted path ending in it.
fn icon_matches(src: &str, marker: &str) -> bool {
    src == marker
        || src
            .strip_suffix(marker)
            .is_some_and(|prefix| prefix.ends_with('/'))
}

/// Label text without its separator colons (ASCII and full-width).
pub fn field_name(label_text: &str) -> String {
    label_text.replace([':', '：'], "").trim().to_string()
}
