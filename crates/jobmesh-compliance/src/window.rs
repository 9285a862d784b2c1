//! Sliding one-minute request window per domain.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Length of the trailing window used for rate limiting.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Request timestamps for one domain within the trailing minute.
///
/// Timestamps are appended in call order and therefore stay sorted; every
/// read or write prunes entries older than [`WINDOW`] first.
#[derive(Debug, Default)]
pub struct RequestWindow {
    timestamps: VecDeque<Instant>,
    total_requests: u64,
    blocked_requests: u64,
}

impl RequestWindow {
    /// Create an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop timestamps that fell out of the trailing window.
    pub fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= WINDOW {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of requests within the trailing window as of `now`.
    pub fn count(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.timestamps.len()
    }

    /// Record an issued request.
    pub fn record(&mut self, now: Instant) {
        self.prune(now);
        // Keep ascending order even if a caller hands us a stale instant.
        let at = self.timestamps.back().map_or(now, |&last| last.max(now));
        self.timestamps.push_back(at);
        self.total_requests += 1;
    }

    /// Count a request that was refused.
    pub fn record_blocked(&mut self) {
        self.blocked_requests += 1;
    }

    /// Requests recorded over the window's lifetime.
    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    /// Requests refused over the window's lifetime.
    #[must_use]
    pub fn blocked_requests(&self) -> u64 {
        self.blocked_requests
    }

    /// When the oldest in-window request expires, if the window is non-empty.
    #[must_use]
    pub fn next_expiry(&self) -> Option<Instant> {
        self.timestamps.front().map(|&oldest| oldest + WINDOW)
    }
}
