pub mod browser;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod correlate;
pub mod crawler;
pub mod error;
pub mod export;
pub mod extract;
pub mod facets;
pub mod layout;
pub mod logger;
pub mod record;
pub mod store;
pub mod waiter;

pub use browser::{BrowserSession, ChromeSession, SelectOutcome};
pub use config::AppConfig;
pub use crawler::{CrawlReport, CrawlSettings, Crawler};
pub use error::CrawlError;
pub use record::{FacetOption, MemberRecord};
pub use store::AggregationStore;
