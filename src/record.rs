use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fallback value for any listing field that is absent from the page.
pub const MISSING: &str = "N/A";

pub const FIELD_IDENTIFIER: &str = "會員編號";
pub const FIELD_NAME_LOCAL: &str = "公司名稱(中)";
pub const FIELD_DETAIL_URL: &str = "詳細頁面網址";
pub const FIELD_REGION: &str = "所在區域";
pub const FIELD_INDUSTRY: &str = "所屬行業";

/// Appended to a detail field whose label collides with a core field name.
pub const DETAIL_SUFFIX: &str = "(詳細)";

/// The fixed core fields, in the order they are written.
pub const CORE_FIELDS: [&str; 5] = [
    FIELD_IDENTIFIER,
    FIELD_NAME_LOCAL,
    FIELD_DETAIL_URL,
    FIELD_REGION,
    FIELD_INDUSTRY,
];

/// One selectable entry of a facet control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetOption {
    pub text: String,
    pub value: String,
}

impl FacetOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// The crawl's current coordinates in the region x industry space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetPair<'a> {
    pub region: &'a FacetOption,
    pub industry: &'a FacetOption,
}

impl<'a> FacetPair<'a> {
    pub fn new(region: &'a FacetOption, industry: &'a FacetOption) -> Self {
        Self { region, industry }
    }
}

impl std::fmt::Display for FacetPair<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}='{}', {}='{}'", FIELD_REGION, self.region.text, FIELD_INDUSTRY, self.industry.text)
    }
}

/// A member as extracted from the listing, optionally enriched from its detail modal.
///
/// Serializes as a flat object: the core fields under the site's own labels,
/// followed by whatever fields the detail modal exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(rename = "會員編號")]
    pub identifier: String,
    #[serde(rename = "公司名稱(中)")]
    pub name_local: String,
    #[serde(rename = "詳細頁面網址")]
    pub detail_url: String,
    #[serde(rename = "所在區域")]
    pub region_label: String,
    #[serde(rename = "所屬行業")]
    pub industry_label: String,
    #[serde(flatten)]
    pub extra_fields: IndexMap<String, String>,
}

/// Deduplication key for the aggregation store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// `(identifier, name_local)` of a record with a real identifier
    Keyed(String, String),
    /// No usable identifier; the whole record is its own identity
    Whole,
}

impl MemberRecord {
    pub fn new(
        identifier: String,
        name_local: String,
        detail_url: String,
        region_label: String,
        industry_label: String,
    ) -> Self {
        Self {
            identifier,
            name_local,
            detail_url,
            region_label,
            industry_label,
            extra_fields: IndexMap::new(),
        }
    }

    pub fn has_identifier(&self) -> bool {
        !self.identifier.is_empty() && self.identifier != MISSING
    }

    pub fn identity_key(&self) -> IdentityKey {
        if self.has_identifier() {
            IdentityKey::Keyed(self.identifier.clone(), self.name_local.clone())
        } else {
            IdentityKey::Whole
        }
    }

    /// Set a detail field by its display name.
    ///
    /// Core fields are fixed at extraction and never written here. The
    /// identifier label is dropped since a fragment only joins on its own
    /// identifier; any other core name is kept with `DETAIL_SUFFIX` appended.
    pub fn set_field(&mut self, name: &str, value: String) {
        if name == FIELD_IDENTIFIER {
            return;
        }
        let key = if CORE_FIELDS.contains(&name) {
            format!("{}{}", name, DETAIL_SUFFIX)
        } else {
            name.to_string()
        };
        self.extra_fields.insert(key, value);
    }

    /// Look up a field by its display name, core fields included.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            FIELD_IDENTIFIER => Some(&self.identifier),
            FIELD_NAME_LOCAL => Some(&self.name_local),
            FIELD_DETAIL_URL => Some(&self.detail_url),
            FIELD_REGION => Some(&self.region_label),
            FIELD_INDUSTRY => Some(&self.industry_label),
            _ => self.extra_fields.get(name).map(String::as_str),
        }
    }

    /// All field names of this record: core fields first, then extras in discovery order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        CORE_FIELDS
            .iter()
            .copied()
            .chain(self.extra_fields.keys().map(String::as_str))
    }
}
