use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use indicatif::{ProgressBar, ProgressStyle};

use crate::crawler::CrawlReport;
use crate::record::FacetPair;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Silent = 0,   // Only show progress bar and final summary
    Summary = 1,  // Crawl milestones (default)
    Detailed = 2, // Per-combination results and skips
    Debug = 3,    // Everything
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Matching `tracing` filter directive for the library's own spans and events.
    pub fn filter_directive(self) -> &'static str {
        match self {
            VerbosityLevel::Silent => "memberfinder=error",
            VerbosityLevel::Summary => "memberfinder=warn",
            VerbosityLevel::Detailed => "memberfinder=info",
            VerbosityLevel::Debug => "memberfinder=debug",
        }
    }
}

/// Human-facing crawl log: timestamped lines routed around a progress bar,
/// optionally buffered for export to a file at the end of the run.
#[derive(Clone)]
pub struct CrawlLogger {
    verbosity: VerbosityLevel,
    progress_bar: Arc<RwLock<Option<ProgressBar>>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
    log_file_path: Option<PathBuf>,
}

impl CrawlLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: Arc::new(RwLock::new(None)),
            log_buffer: Arc::new(Mutex::new(Vec::new())),
            log_file_path: None,
        }
    }

    pub fn with_log_file(verbosity: VerbosityLevel, log_file_path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: Some(log_file_path.into()),
            ..Self::new(verbosity)
        }
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("INFO", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.print_message("WARN", message);
        }
    }

    pub fn error(&self, message: &str) {
        // Errors are shown at every verbosity
        self.print_message("ERROR", message);
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Debug {
            self.print_message("DEBUG", message);
        }
    }

    fn print_message(&self, level: &str, message: &str) {
        let msg = format!("[{}] {}: {}", timestamp(), level, message);

        if self.log_file_path.is_some() {
            if let Ok(mut buffer) = self.log_buffer.lock() {
                buffer.push(msg.clone());
            }
        }

        // Print above an active progress bar so it keeps its position
        if let Ok(guard) = self.progress_bar.try_read() {
            if let Some(pb) = guard.as_ref() {
                pb.println(msg);
                return;
            }
        }

        eprintln!("{}", msg);
    }

    /// Show a progress bar over `total_steps` facet combinations.
    pub fn start_progress(&self, total_steps: u64) {
        if self.verbosity == VerbosityLevel::Debug {
            // Debug output is too dense to interleave with a bar
            return;
        }

        let pb = ProgressBar::new(total_steps);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| {
                    ProgressStyle::default_bar()
                        .template("{bar:40} {pos}/{len} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                })
                .progress_chars("##-"),
        );
        pb.set_message("Starting crawl...");

        if let Ok(mut guard) = self.progress_bar.write() {
            *guard = Some(pb);
        }
    }

    pub fn update_progress(&self, message: &str) {
        if let Ok(guard) = self.progress_bar.read() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(message.to_string());
            }
        }
    }

    pub fn advance_progress(&self, steps: u64) {
        if let Ok(guard) = self.progress_bar.read() {
            if let Some(pb) = guard.as_ref() {
                pb.inc(steps);
            }
        }
    }

    pub fn finish_progress(&self, final_message: &str) {
        if let Ok(mut guard) = self.progress_bar.write() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        self.info(final_message);
    }

    pub fn log_initialization(&self, page_url: &str) {
        self.info(&format!("Starting member crawl of {}", page_url));
    }

    pub fn log_catalog_loaded(&self, regions: usize, industries: usize) {
        self.info(&format!(
            "Facet catalog loaded: {} regions x {} industries = {} combinations",
            regions,
            industries,
            regions * industries
        ));
    }

    pub fn log_region_start(&self, region: &str, index: usize, total: usize) {
        self.info(&format!("Region {}/{}: {}", index + 1, total, region));
    }

    pub fn log_region_skipped(&self, region: &str, reason: &str) {
        self.info(&format!("Skipping region '{}': {}", region, reason));
    }

    pub fn log_combination_start(&self, pair: FacetPair<'_>) {
        self.update_progress(&format!("{} / {}", pair.region.text, pair.industry.text));
        self.debug(&format!("Visiting {}", pair));
    }

    pub fn log_combination_members(&self, pair: FacetPair<'_>, extracted: usize, inserted: usize, correlated: usize) {
        self.detail_or_debug(
            extracted > 0,
            &format!(
                "{}: {} members ({} new, {} with details)",
                pair, extracted, inserted, correlated
            ),
        );
    }

    pub fn log_combination_skipped(&self, pair: FacetPair<'_>, reason: &str) {
        self.info(&format!("Skipping {}: {}", pair, reason));
    }

    pub fn log_crawl_aborted(&self, reason: &str) {
        self.error(&format!("Crawl aborted: {}", reason));
    }

    pub fn log_export_success(&self, path: &Path, count: usize) {
        self.info(&format!("Exported {} records to {}", count, path.display()));
    }

    // Detailed results show at -v, everything else waits for -vv
    fn detail_or_debug(&self, detailed: bool, message: &str) {
        if detailed && self.verbosity >= VerbosityLevel::Detailed {
            self.print_message("INFO", message);
        } else {
            self.debug(message);
        }
    }

    /// Print the end-of-run summary to stdout. Always shown.
    pub fn print_final_summary(&self, report: &CrawlReport, exported: &[PathBuf]) {
        // Clear any remaining progress bar artifacts
        print!("\x1b[2K\r");
        let _ = io::stdout().flush();

        println!("\n=== CRAWL SUMMARY ===");
        let duration = report.finished_at - report.started_at;
        println!(
            "Crawl Duration: {:.2}s",
            duration.num_milliseconds().max(0) as f64 / 1000.0
        );
        println!("Regions: {}", report.regions);
        println!("Industries: {}", report.industries);
        println!("Combinations Visited: {}", report.visited);
        println!("Combinations Skipped: {}", report.skipped.len());
        println!("Unique Members: {}", report.records.len());
        println!("Duplicates Dropped: {}", report.duplicates);
        for path in exported {
            println!("Results Exported: {}", path.display());
        }
        let trace = skip_trace(report);
        if !trace.is_empty() {
            println!("Skipped:");
            for line in &trace {
                println!("  {}", line);
            }
        }
        println!("=====================\n");

        match &report.aborted {
            Some(reason) => println!(
                "⚠️  Crawl stopped early ({}). {} members collected before stopping.",
                reason,
                report.records.len()
            ),
            None if report.records.is_empty() => println!("✅ Crawl completed. No members found."),
            None => println!("✅ Crawl completed successfully! Collected {} members.", report.records.len()),
        }
    }

    /// Write all buffered log lines to the configured log file.
    pub fn export_logs(&self) -> io::Result<()> {
        let Some(ref log_file_path) = self.log_file_path else {
            return Ok(());
        };
        let buffer = match self.log_buffer.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(parent) = log_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)?;

        for log_entry in buffer.iter() {
            writeln!(file, "{}", log_entry)?;
        }
        file.flush()
    }

    pub fn is_log_export_enabled(&self) -> bool {
        self.log_file_path.is_some()
    }

    pub fn get_log_count(&self) -> usize {
        self.log_buffer.lock().map(|buffer| buffer.len()).unwrap_or(0)
    }
}

/// One line per skipped combination, in visit order.
pub fn skip_trace(report: &CrawlReport) -> Vec<String> {
    report
        .skipped
        .iter()
        .map(|skipped| format!("{} / {}: {}", skipped.region, skipped.industry, skipped.reason))
        .collect()
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}
