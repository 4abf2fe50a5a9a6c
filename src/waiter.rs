//! Bounded polling of the live page.

use std::time::{Duration, Instant};
use tracing::debug;

use crate::browser::BrowserSession;
use crate::error::CrawlError;

/// Whether the listing showed any member entry before the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    Ready,
    /// Expected for facet combinations without members; not an error.
    NoContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

/// Poll the live DOM for `css` until it matches or `policy.timeout` elapses.
///
/// The page is re-queried on every tick because facet changes are applied
/// asynchronously by the page. At least one probe is always made.
pub fn wait_for_element<S>(session: &mut S, css: &str, policy: WaitPolicy) -> Result<bool, CrawlError>
where
    S: BrowserSession + ?Sized,
{
    let deadline = Instant::now() + policy.timeout;
    let mut probes = 0u32;

    loop {
        probes += 1;
        if session.element_exists(css).map_err(CrawlError::Session)? {
            debug!("'{}' present after {} probe(s)", css, probes);
            return Ok(true);
        }

        let now = Instant::now();
        if now >= deadline {
            debug!("'{}' absent after {} probe(s)", css, probes);
            return Ok(false);
        }
        std::thread::sleep(policy.poll_interval.min(deadline - now));
    }
}

/// Wait for at least one member entry in the listing container.
pub fn wait_for_content<S>(session: &mut S, entry_probe: &str, policy: WaitPolicy) -> Result<ContentState, CrawlError>
where
    S: BrowserSession + ?Sized,
{
    if wait_for_element(session, entry_probe, policy)? {
        Ok(ContentState::Ready)
    } else {
        Ok(ContentState::NoContent)
    }
}
