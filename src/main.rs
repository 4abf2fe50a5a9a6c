use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use memberfinder::browser::{BrowserSession, ChromeSession};
use memberfinder::cli::Cli;
use memberfinder::config::{self, AppConfig, OutputConfig, CONFIG_PATH};
use memberfinder::crawler::{fetch_catalog, CrawlReport, CrawlSettings, Crawler};
use memberfinder::export;
use memberfinder::layout::PageLayout;
use memberfinder::logger::{CrawlLogger, VerbosityLevel};

/// Global flag for interrupt signaling - the crawl stops between combinations
/// and the partial results are still exported
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    // Handle --init first (before any other processing)
    if cli.init {
        match AppConfig::create_default_config_at(&config_path) {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                println!("   Edit this file to customize settings, then run memberfinder again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut app_config = match AppConfig::load_from_path(&config_path) {
        Ok(cfg) => cfg,
        Err(config::ConfigError::FileNotFound(path)) => {
            // Only offer to create the file at the standard location
            let prompt = if cli.config.is_none() {
                AppConfig::prompt_create_config()
            } else {
                Ok(None)
            };
            match prompt {
                Ok(Some(created_path)) => {
                    println!("✅ Created default configuration file at: {}", created_path.display());
                    println!("   Edit this file to customize settings, then run memberfinder again.");
                    std::process::exit(0);
                }
                Ok(None) => {
                    eprintln!("❌ Configuration file not found at: {}", path.display());
                    eprintln!("   Run with --init to create a default configuration file ({}).", CONFIG_PATH);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("❌ Failed to create configuration file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut app_config);

    let verbosity = VerbosityLevel::from_verbose_count(cli.verbose);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let logger = Arc::new(match &cli.log_file {
        Some(log_file_path) => CrawlLogger::with_log_file(verbosity, log_file_path),
        None => CrawlLogger::new(verbosity),
    });

    // First Ctrl-C lets the crawl wind down and export; a second one exits immediately
    ctrlc::set_handler(move || {
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            eprintln!("\n⚠️  Force exiting (partial results not exported).");
            std::process::exit(130); // 130 = 128 + SIGINT(2)
        }
        eprintln!("\n⚠️  Interrupt received. Stopping after the current combination and exporting partial results...");
    })
    .unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to set Ctrl-C handler: {}. Interrupt signals may not be handled gracefully.", e);
    });

    let (layout, settings) = match PageLayout::compile(&app_config.selectors)
        .and_then(|layout| Ok((layout, CrawlSettings::from_config(&app_config)?)))
    {
        Ok(prepared) => prepared,
        Err(e) => {
            logger.error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };

    let session = match ChromeSession::launch(&app_config.browser) {
        Ok(session) => session,
        Err(e) => {
            logger.error(&format!("{:#}", e));
            eprintln!("   Set CHROME_PATH or browser.chrome_path to point at a Chrome/Chromium binary.");
            std::process::exit(1);
        }
    };

    if cli.list_facets {
        return list_facets(session, &layout, &settings);
    }

    let report = Crawler::new(session, &layout, settings)
        .with_interrupt(&INTERRUPTED)
        .with_logger(Arc::clone(&logger))
        .run();

    let exported = export_results(&report, &app_config.output, &logger)?;

    logger.print_final_summary(&report, &exported);

    if logger.is_log_export_enabled() {
        match logger.export_logs() {
            Ok(()) => {
                if let Some(ref log_file) = cli.log_file {
                    println!("📄 Execution logs exported to: {}", log_file.display());
                    println!("   Total log entries: {}", logger.get_log_count());
                }
            }
            Err(e) => {
                eprintln!("⚠️ Warning: Failed to export logs: {}", e);
            }
        }
    }

    if report.aborted.is_some() {
        std::process::exit(if INTERRUPTED.load(Ordering::SeqCst) { 130 } else { 1 });
    }

    Ok(())
}

/// Print the facet catalog of the landing page.
fn list_facets(mut session: ChromeSession, layout: &PageLayout, settings: &CrawlSettings) -> Result<()> {
    let catalog = fetch_catalog(&mut session, layout, settings);
    session.close()?;
    let catalog = catalog.context("Failed to read facet catalog")?;

    println!("Regions ({}):", catalog.regions.len());
    for option in &catalog.regions {
        println!("  {:>6}  {}", option.value, option.text);
    }
    println!("Industries ({}):", catalog.industries.len());
    for option in &catalog.industries {
        println!("  {:>6}  {}", option.value, option.text);
    }
    println!("{} combinations", catalog.combinations());
    Ok(())
}

/// Write the JSON and CSV exports. Nothing is written for an empty record set.
fn export_results(report: &CrawlReport, output: &OutputConfig, logger: &CrawlLogger) -> Result<Vec<PathBuf>> {
    if report.records.is_empty() {
        logger.info("No members collected; nothing to export.");
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(&output.directory)
        .with_context(|| format!("Failed to create output directory '{}'", output.directory))?;

    let json_path = output.json_path();
    export::export_json(&report.records, &json_path)?;
    logger.log_export_success(&json_path, report.records.len());

    let csv_path = output.csv_path();
    export::export_csv(&report.records, &csv_path)?;
    logger.log_export_success(&csv_path, report.records.len());

    Ok(vec![json_path, csv_path])
}
