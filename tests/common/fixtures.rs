use std::path::PathBuf;

use memberfinder::config::{AppConfig, DEFAULT_CONFIG};
use memberfinder::crawler::CrawlSettings;
use memberfinder::layout::PageLayout;
use memberfinder::waiter::WaitPolicy;
use std::time::Duration;
use url::Url;

pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn load_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixture_path(relative))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", relative))
}

pub fn default_config() -> AppConfig {
    AppConfig::from_toml(DEFAULT_CONFIG).expect("default config must parse")
}

pub fn default_layout() -> PageLayout {
    PageLayout::compile(&default_config().selectors).expect("default selectors must compile")
}

pub fn page_url() -> Url {
    Url::parse("https://btbvn.vn/").unwrap()
}

/// Settings with no pacing and single-probe waits, for scripted sessions.
pub fn instant_settings() -> CrawlSettings {
    let no_wait = WaitPolicy::new(Duration::ZERO, Duration::from_millis(1));
    CrawlSettings {
        page_url: page_url(),
        base_url: page_url(),
        catalog_wait: no_wait,
        content_wait: no_wait,
        region_settle: Duration::ZERO,
        industry_delay: Duration::ZERO,
        region_delay: Duration::ZERO,
    }
}
