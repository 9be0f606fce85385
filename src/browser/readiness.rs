use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::browser::navigation::WaitStrategy;

/// No new resource entries for this long counts as network idle
pub const QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Marks the outgoing document before navigating. A document that still
/// carries the flag is the previous page, not the one being loaded.
pub const MARK_STALE_SCRIPT: &str = "window.__profileScraperStale = true; return null;";

/// Reports the load state of the current document. The resource timing
/// buffer is enlarged once per document so that the entry count keeps
/// growing past the default 250 entries.
pub const LOAD_STATE_SCRIPT: &str = r#"
    if (!window.__profileScraperBuffer) {
        window.__profileScraperBuffer = true;
        try { performance.setResourceTimingBufferSize(100000); } catch (e) {}
    }
    return {
        href: String(location.href),
        readyState: document.readyState,
        stale: window.__profileScraperStale === true,
        resources: performance.getEntriesByType('resource').length
    };
"#;

/// Result of one `LOAD_STATE_SCRIPT` poll
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadState {
    pub href: String,
    pub ready_state: String,
    pub stale: bool,
    pub resources: u64,
}

impl LoadState {
    /// The navigation has committed to a new document
    pub fn is_new_document(&self) -> bool {
        !self.stale && self.href != "about:blank"
    }
}

/// Decides from successive polls when a page satisfies a wait strategy
#[derive(Debug)]
pub struct ReadinessTracker {
    wait: WaitStrategy,
    last_count: Option<u64>,
    quiet_since: Option<Instant>,
}

impl ReadinessTracker {
    pub fn new(wait: WaitStrategy) -> Self {
        Self {
            wait,
            last_count: None,
            quiet_since: None,
        }
    }

    /// Feed one poll taken at `now`; true once the page is ready
    pub fn observe(&mut self, sample: &LoadState, now: Instant) -> bool {
        if !sample.is_new_document() {
            self.last_count = None;
            self.quiet_since = None;
            return false;
        }

        match self.wait {
            WaitStrategy::DomContentLoaded => sample.ready_state != "loading",
            WaitStrategy::NetworkIdle => {
                if self.last_count != Some(sample.resources) {
                    self.last_count = Some(sample.resources);
                    self.quiet_since = Some(now);
                }

                let quiet = self
                    .quiet_since
                    .map_or(false, |since| now.saturating_duration_since(since) >= QUIET_WINDOW);
                sample.ready_state == "complete" && quiet
            }
        }
    }
}
