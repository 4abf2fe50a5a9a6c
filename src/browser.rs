//! Live browser session for the crawl.
//!
//! The crawl drives exactly one headless Chrome tab. Everything the
//! coordinator needs from it goes through the `BrowserSession` trait so the
//! traversal can be exercised without a Chrome process.
//!
//! Chrome is blocking; all calls here are synchronous.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::BrowserConfig;

/// Result of a select-by-value action against a live control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The control now reflects the requested value
    Selected,
    /// No control with that id exists on the current page
    ControlMissing,
    /// The control exists but has no option with that value, or did not take it
    ValueRejected,
}

/// The automation operations the crawl consumes.
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Query the live DOM (not a cached snapshot) for `css`.
    fn element_exists(&mut self, css: &str) -> Result<bool>;

    fn select_option_by_value(&mut self, control_id: &str, value: &str) -> Result<SelectOutcome>;

    /// Serialized HTML of the page as currently rendered.
    fn snapshot(&mut self) -> Result<String>;

    /// Release the browser. Must be safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

impl<S: BrowserSession + ?Sized> BrowserSession for Box<S> {
    fn navigate(&mut self, url: &str) -> Result<()> {
        (**self).navigate(url)
    }

    fn element_exists(&mut self, css: &str) -> Result<bool> {
        (**self).element_exists(css)
    }

    fn select_option_by_value(&mut self, control_id: &str, value: &str) -> Result<SelectOutcome> {
        (**self).select_option_by_value(control_id, value)
    }

    fn snapshot(&mut self) -> Result<String> {
        (**self).snapshot()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// A headless Chrome process with a single tab.
/// Dropping the session kills the Chrome process.
pub struct ChromeSession {
    browser: Option<headless_chrome::Browser>,
    tab: Arc<headless_chrome::Tab>,
}

impl ChromeSession {
    /// Launch Chrome according to `config`.
    /// Automatically disables sandbox when running inside a container
    /// (detected via /.dockerenv or MEMBERFINDER_CONTAINER env var).
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let is_container = std::env::var("MEMBERFINDER_CONTAINER").is_ok()
            || std::path::Path::new("/.dockerenv").exists();

        // CHROME_PATH wins over the configured binary
        let chrome_path: Option<PathBuf> = std::env::var("CHROME_PATH")
            .ok()
            .map(PathBuf::from)
            .or_else(|| config.chrome_path.clone());

        let options = headless_chrome::LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox && !is_container)
            .path(chrome_path)
            // The crawl can sit in pacing delays; keep the idle watchdog well above them
            .idle_browser_timeout(Duration::from_secs(config.navigation_timeout_secs.max(60) * 4))
            .build()
            .map_err(|e| anyhow!("Failed to build Chrome launch options: {}", e))?;

        let browser = headless_chrome::Browser::new(options)
            .map_err(|e| anyhow!("Failed to launch headless Chrome: {}", e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| anyhow!("Failed to create browser tab: {}", e))?;
        tab.set_default_timeout(Duration::from_secs(config.navigation_timeout_secs));

        debug!("Launched Chrome (headless: {}, container: {})", config.headless, is_container);

        Ok(Self {
            browser: Some(browser),
            tab,
        })
    }

    fn tab(&self) -> Result<&Arc<headless_chrome::Tab>> {
        if self.browser.is_none() {
            return Err(anyhow!("Browser session already closed"));
        }
        Ok(&self.tab)
    }

    fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>> {
        let remote = self
            .tab()?
            .evaluate(script, false)
            .map_err(|e| anyhow!("Failed to evaluate script: {}", e))?;
        Ok(remote.value)
    }
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .map_err(|e| anyhow!("Failed to navigate to {}: {}", url, e))?;
        tab.wait_until_navigated()
            .map_err(|e| anyhow!("Page failed to load for {}: {}", url, e))?;
        Ok(())
    }

    fn element_exists(&mut self, css: &str) -> Result<bool> {
        let script = format!("document.querySelector({}) !== null", js_string(css)?);
        let value = self.evaluate(&script)?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    fn select_option_by_value(&mut self, control_id: &str, value: &str) -> Result<SelectOutcome> {
        let script = select_script(control_id, value)?;
        let result = self.evaluate(&script)?;
        match result.as_ref().and_then(|v| v.as_str()) {
            Some("selected") => Ok(SelectOutcome::Selected),
            Some("missing") => Ok(SelectOutcome::ControlMissing),
            Some("rejected") => Ok(SelectOutcome::ValueRejected),
            other => Err(anyhow!(
                "Unexpected result selecting '{}' in #{}: {:?}",
                value,
                control_id,
                other
            )),
        }
    }

    fn snapshot(&mut self) -> Result<String> {
        self.tab()?
            .get_content()
            .map_err(|e| anyhow!("Failed to get page content: {}", e))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(browser) = self.browser.take() {
            if let Err(e) = self.tab.close(false) {
                debug!("Failed to close tab cleanly: {}", e);
            }
            drop(browser);
            debug!("Chrome session closed");
        }
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to release Chrome session: {}", e);
        }
    }
}

/// Encode `s` as a JavaScript string literal.
fn js_string(s: &str) -> Result<String> {
    serde_json::to_string(s).context("Failed to encode script argument")
}

/// Script that selects `value` in the `<select>` with id `control_id` and fires `change`,
/// the way a user picking the option would.
fn select_script(control_id: &str, value: &str) -> Result<String> {
    Ok(format!(
        r#"(() => {{
    const control = document.getElementById({id});
    if (!control) {{ return "missing"; }}
    const wanted = {value};
    const option = Array.from(control.options || []).find(o => o.value.trim() === wanted);
    if (!option) {{ return "rejected"; }}
    control.value = option.value;
    control.dispatchEvent(new Event("input", {{ bubbles: true }}));
    control.dispatchEvent(new Event("change", {{ bubbles: true }}));
    return control.value === option.value ? "selected" : "rejected";
}})()"#,
        id = js_string(control_id)?,
        value = js_string(value)?,
    ))
}
