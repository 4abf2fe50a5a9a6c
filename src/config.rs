//! Configuration management for memberfinder
//!
//! All configuration is loaded from `./config/memberfinder.toml`.
//! No hardcoded defaults exist in source code - all defaults are in the config template.

use scraper::Selector;
use serde::Deserialize;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/memberfinder.toml";

/// Default configuration file content - this is the ONLY place defaults exist
pub const DEFAULT_CONFIG: &str = include_str!("../config/memberfinder.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Invalid CSS selector in '{field}': {selector}")]
    InvalidSelector { field: String, selector: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Configuration field '{field}' must be greater than zero")]
    ZeroValue { field: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub selectors: SelectorsConfig,
    pub browser: BrowserConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
}

/// Where the member directory lives
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Relative detail links in the listing are resolved against this
    pub base_url: String,
    /// Landing page holding the facet controls and the listing container
    pub page_url: String,
}

/// Page structure assumptions, expressed as element ids and CSS selectors
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorsConfig {
    pub region_control_id: String,
    pub industry_control_id: String,
    pub listing_container: String,
    pub member_entry: String,
    pub member_identifier: String,
    pub member_name_link: String,
    pub modal_body: String,
    pub modal_label: String,
    pub modal_content: String,
    pub modal_link: String,
    pub identifier_label: String,
    #[serde(default)]
    pub icon_links: Vec<IconLinkConfig>,
}

/// An icon-only modal label whose link target is stored under a canonical field
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IconLinkConfig {
    /// `src` of the icon image inside the label
    pub marker: String,
    /// Field name the link target is stored under
    pub field: String,
}

/// Headless Chrome launch settings
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub sandbox: bool,
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout_secs: u64,
}

/// Waiting and pacing for the facet traversal
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    pub catalog_timeout_secs: u64,
    pub content_timeout_secs: u64,
    pub content_poll_interval_ms: u64,
    pub region_settle_ms: u64,
    pub industry_delay_ms: u64,
    pub region_delay_ms: u64,
}

impl CrawlConfig {
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }

    pub fn content_poll_interval(&self) -> Duration {
        Duration::from_millis(self.content_poll_interval_ms)
    }

    pub fn region_settle(&self) -> Duration {
        Duration::from_millis(self.region_settle_ms)
    }

    pub fn industry_delay(&self) -> Duration {
        Duration::from_millis(self.industry_delay_ms)
    }

    pub fn region_delay(&self) -> Duration {
        Duration::from_millis(self.region_delay_ms)
    }
}

/// Result file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub directory: String,
    pub json_file: String,
    pub csv_file: String,
}

impl OutputConfig {
    pub fn json_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.json_file)
    }

    pub fn csv_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.csv_file)
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed landing page URL (validated by `validate`)
    pub fn page_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.site.page_url).map_err(|_| ConfigError::InvalidUrl {
            field: "site.page_url".to_string(),
            url: self.site.page_url.clone(),
        })
    }

    /// Parsed directory base URL (validated by `validate`)
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.site.base_url).map_err(|_| ConfigError::InvalidUrl {
            field: "site.base_url".to_string(),
            url: self.site.base_url.clone(),
        })
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate site URLs
        for (field, url) in [
            ("site.base_url", &self.site.base_url),
            ("site.page_url", &self.site.page_url),
        ] {
            let parsed = Url::parse(url).map_err(|_| ConfigError::InvalidUrl {
                field: field.to_string(),
                url: url.clone(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl {
                    field: field.to_string(),
                    url: url.clone(),
                });
            }
        }

        // Validate control ids
        let s = &self.selectors;
        require_non_empty("selectors.region_control_id", &s.region_control_id)?;
        require_non_empty("selectors.industry_control_id", &s.industry_control_id)?;
        require_non_empty("selectors.identifier_label", &s.identifier_label)?;

        // Validate CSS selectors compile
        for (field, selector) in [
            ("selectors.listing_container", &s.listing_container),
            ("selectors.member_entry", &s.member_entry),
            ("selectors.member_identifier", &s.member_identifier),
            ("selectors.member_name_link", &s.member_name_link),
            ("selectors.modal_body", &s.modal_body),
            ("selectors.modal_label", &s.modal_label),
            ("selectors.modal_content", &s.modal_content),
            ("selectors.modal_link", &s.modal_link),
        ] {
            validate_selector(field, selector)?;
        }

        for (i, icon) in s.icon_links.iter().enumerate() {
            require_non_empty(&format!("selectors.icon_links[{}].marker", i), &icon.marker)?;
            require_non_empty(&format!("selectors.icon_links[{}].field", i), &icon.field)?;
        }

        // Validate timings
        if self.browser.navigation_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "browser.navigation_timeout_secs".to_string(),
            });
        }
        if self.crawl.content_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroValue {
                field: "crawl.content_poll_interval_ms".to_string(),
            });
        }

        // Validate output
        require_non_empty("output.json_file", &self.output.json_file)?;
        require_non_empty("output.csv_file", &self.output.csv_file)?;

        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        Self::create_default_config_at(Path::new(CONFIG_PATH))
    }

    /// Create default configuration file at a specific path
    pub fn create_default_config_at(path: &Path) -> Result<PathBuf, ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }

    /// Check if stdin is a TTY (interactive terminal)
    pub fn is_interactive() -> bool {
        io::stdin().is_terminal()
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config() -> Result<Option<PathBuf>, ConfigError> {
        if !Self::is_interactive() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config()?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyRequired {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    require_non_empty(field, selector)?;
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })?;
    Ok(())
}
