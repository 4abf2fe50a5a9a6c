use thiserror::Error;

/// Typed outcomes of the leaf crawl components.
///
/// The coordinator is the only place that decides whether one of these aborts
/// the run or merely skips the current facet combination.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("facet control '{control}' has no selectable options")]
    CatalogEmpty { control: String },

    #[error("facet control '{control}' not found on the page")]
    ControlNotFound { control: String },

    #[error("value '{value}' is not selectable in facet control '{control}'")]
    ValueNotSelectable { control: String, value: String },

    #[error("crawl interrupted")]
    Interrupted,

    #[error("browser session error: {0:#}")]
    Session(anyhow::Error),
}

impl CrawlError {
    /// Errors that only invalidate the current industry selection.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            CrawlError::ValueNotSelectable { .. } | CrawlError::ControlNotFound { .. }
        )
    }
}
