use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::info;

/// How a URL ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every field extracted
    Complete,
    /// Page captured, some fields unknown
    Partial,
    /// Page could not be captured
    Failed,
}

/// Bookkeeping for one run
#[derive(Debug, Clone)]
pub struct RunMetrics {
    /// Start time of the run
    pub start_time: DateTime<Utc>,

    /// URLs processed
    pub total: usize,

    pub complete: usize,
    pub partial: usize,
    pub failed: usize,

    /// URLs retried after a navigation timeout
    pub retries: usize,

    /// Per-URL elapsed time in milliseconds, in input order
    pub durations_ms: Vec<u64>,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            total: 0,
            complete: 0,
            partial: 0,
            failed: 0,
            retries: 0,
            durations_ms: Vec::new(),
        }
    }

    /// Record the final outcome of one URL
    pub fn record(&mut self, outcome: Outcome, retried: bool, duration_ms: u64) {
        self.total += 1;
        match outcome {
            Outcome::Complete => self.complete += 1,
            Outcome::Partial => self.partial += 1,
            Outcome::Failed => self.failed += 1,
        }
        if retried {
            self.retries += 1;
        }
        self.durations_ms.push(duration_ms);
    }

    /// Mean time spent per URL
    pub fn average_ms(&self) -> Option<u64> {
        if self.durations_ms.is_empty() {
            return None;
        }
        Some(self.durations_ms.iter().sum::<u64>() / self.durations_ms.len() as u64)
    }

    pub fn log_summary(&self) {
        let elapsed = (Utc::now() - self.start_time).num_seconds();
        info!(
            total = self.total,
            complete = self.complete,
            partial = self.partial,
            failed = self.failed,
            retries = self.retries,
            average_ms = self.average_ms().unwrap_or(0),
            elapsed_secs = elapsed,
            "Run finished"
        );
    }
}

/// Request timer for measuring per-URL durations
pub struct RequestTimer {
    /// Start time of the request
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// End timing and get the duration in milliseconds
    pub fn end(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
