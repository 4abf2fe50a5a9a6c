use clap::Parser;
use std::path::PathBuf;

use crate::config::{AppConfig, CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(name = "memberfinder")]
#[command(about = "Crawls a member directory across every region x industry facet and exports the members it lists")]
#[command(version)]
pub struct Cli {
    /// Create default configuration file at ./config/memberfinder.toml
    #[arg(long)]
    pub init: bool,

    /// Configuration file to load instead of ./config/memberfinder.toml
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory for the JSON and CSV exports (overrides config)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Verbose logging (use -v for per-combination results, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Export execution logs to a file (specify file path)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print the region and industry options of the landing page, then exit
    #[arg(long)]
    pub list_facets: bool,

    /// Show the browser window instead of running Chrome headless
    #[arg(long)]
    pub headful: bool,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_PATH))
    }

    /// Fold command-line overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.to_string_lossy().to_string();
        }
        if self.headful {
            config.browser.headless = false;
        }
    }
}
