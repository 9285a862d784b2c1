//! Audit trail of compliance decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

/// Default number of entries kept before the oldest are trimmed.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Records every allow/deny decision the compliance engine makes.
///
/// The log is a bounded ring: once `capacity` entries are held, each new
/// entry evicts the oldest one.
#[derive(Debug)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
}

impl AuditLog {
    /// Create a log holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a decision.
    pub fn record(
        &mut self,
        domain: &str,
        url: Option<&str>,
        action: AuditAction,
        reason: impl Into<String>,
    ) {
        let reason = reason.into();
        debug!(domain = %domain, ?action, reason = %reason, "compliance decision");

        self.entries.push_back(AuditEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            domain: domain.to_string(),
            url: url.map(ToString::to_string),
            action,
            reason,
        });

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Most recent entries first, optionally limited to one domain.
    #[must_use]
    pub fn recent(&self, domain: Option<&str>, max_entries: usize) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|entry| domain.map_or(true, |d| entry.domain == d))
            .take(max_entries)
            .cloned()
            .collect()
    }

    /// Get count of entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Maximum number of entries retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear all audit entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// When the decision was made
    pub timestamp: DateTime<Utc>,

    /// Domain the request targeted
    pub domain: String,

    /// Full URL, when the caller supplied one
    pub url: Option<String>,

    /// What was decided
    pub action: AuditAction,

    /// Why
    pub reason: String,
}

impl AuditEntry {
    /// Get a human-readable description of this decision.
    #[must_use]
    pub fn description(&self) -> String {
        let target = self.url.as_deref().unwrap_or(&self.domain);
        let verb = match self.action {
            AuditAction::Allowed => "allowed",
            AuditAction::Blocked => "blocked",
            AuditAction::RateLimited => "rate limited",
        };
        format!("Request to {target} was {verb}: {}", self.reason)
    }
}

/// Outcome recorded for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// The request was issued
    Allowed,
    /// robots.txt disallowed the path
    Blocked,
    /// The domain's request window was full
    RateLimited,
}
