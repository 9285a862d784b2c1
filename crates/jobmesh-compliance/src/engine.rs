//! The compliance engine: per-domain rate windows, robots.txt cache and audit.
//!
//! Window, policy and audit state sit behind one mutex owned by the engine.
//! Robots rule sets live in a separate concurrent map so a slow robots.txt
//! fetch for one origin never holds up rate checks or other origins.

use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::error::{ComplianceError, Result};
use crate::policy::{normalize_domain, DomainPolicyStore};
use crate::robots::RobotsRuleSet;
use crate::window::RequestWindow;
use dashmap::DashMap;
use jobmesh_core::{ComplianceConfig, DomainPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Outcome of a combined robots + rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The request may be issued and has been recorded
    Allowed,
    /// The domain's window is full
    RateLimited,
    /// robots.txt disallows the path
    Disallowed,
}

/// Per-domain request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainStatistics {
    /// Requests recorded since the engine was created
    pub total_requests: u64,
    /// Requests refused (rate limited or disallowed) since the engine was created
    pub blocked_requests: u64,
    /// Requests within the trailing minute
    pub requests_last_minute: usize,
}

#[derive(Debug)]
struct EngineState {
    store: DomainPolicyStore,
    windows: HashMap<String, RequestWindow>,
    audit: AuditLog,
}

/// Enforces per-domain rate limits and robots.txt rules.
///
/// Construct one per process (or per test) and share it behind an `Arc`.
#[derive(Debug)]
pub struct ComplianceEngine {
    state: Mutex<EngineState>,
    robots_cache: DashMap<String, Arc<RobotsRuleSet>>,
    robots_fetches: DashMap<String, Arc<AsyncMutex<()>>>,
    crawl_delays: DashMap<String, Duration>,
    client: reqwest::Client,
    user_agent: String,
    robots_ttl: Duration,
    robots_fetch_timeout: Duration,
}

impl ComplianceEngine {
    /// Create an engine over the given policies with default settings.
    #[must_use]
    pub fn new(store: DomainPolicyStore) -> Self {
        let defaults = ComplianceConfig::default();
        Self {
            state: Mutex::new(EngineState {
                store,
                windows: HashMap::new(),
                audit: AuditLog::with_capacity(defaults.audit_capacity),
            }),
            robots_cache: DashMap::new(),
            robots_fetches: DashMap::new(),
            crawl_delays: DashMap::new(),
            client: reqwest::Client::new(),
            user_agent: defaults.user_agent,
            robots_ttl: Duration::from_secs(defaults.robots_ttl_secs),
            robots_fetch_timeout: Duration::from_secs(defaults.robots_fetch_timeout_secs),
        }
    }

    /// Create an engine from the `[compliance]` configuration section.
    #[must_use]
    pub fn from_config(config: &ComplianceConfig) -> Self {
        Self::new(DomainPolicyStore::from_config(config))
            .with_user_agent(config.user_agent.clone())
            .with_robots_ttl(Duration::from_secs(config.robots_ttl_secs))
            .with_robots_fetch_timeout(Duration::from_secs(config.robots_fetch_timeout_secs))
            .with_audit_capacity(config.audit_capacity)
    }

    /// Use a caller-provided HTTP client for robots.txt fetches.
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the user agent sent to, and matched against, robots.txt.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set how long a fetched rule set is reused.
    #[must_use]
    pub fn with_robots_ttl(mut self, ttl: Duration) -> Self {
        self.robots_ttl = ttl;
        self
    }

    /// Set the timeout for a single robots.txt fetch.
    #[must_use]
    pub fn with_robots_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.robots_fetch_timeout = timeout;
        self
    }

    /// Set the number of audit entries retained.
    #[must_use]
    pub fn with_audit_capacity(self, capacity: usize) -> Self {
        self.lock().audit = AuditLog::with_capacity(capacity);
        self
    }

    /// The user agent this engine identifies as.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EngineState> {
        self.state.lock().expect("acquire compliance state lock")
    }

    /// Resolve the policy currently in force for `domain`.
    #[must_use]
    pub fn policy_for(&self, domain: &str) -> DomainPolicy {
        self.lock().store.policy_for(domain)
    }

    /// Replace the policy for a domain at runtime.
    pub fn set_policy(&self, policy: DomainPolicy) {
        self.lock().store.set_policy(policy);
    }

    /// Whether another request to `domain` fits in its trailing-minute window.
    ///
    /// A denial is counted and audited as `RateLimited`.
    #[must_use]
    pub fn can_request(&self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        let mut state = self.lock();
        Self::admit(&mut state, &domain, None, Instant::now())
    }

    /// Record an issued request against `domain`'s window.
    ///
    /// Call exactly once per HTTP request actually sent, after
    /// [`can_request`](Self::can_request) and the robots check passed.
    pub fn record_request(&self, domain: &str, url: Option<&str>) {
        let domain = normalize_domain(domain);
        let mut state = self.lock();
        Self::record(&mut state, &domain, url, Instant::now());
    }

    /// Check the window and, if there is room, record the request, atomically.
    #[must_use]
    pub fn try_acquire(&self, domain: &str, url: Option<&str>) -> bool {
        let domain = normalize_domain(domain);
        let now = Instant::now();
        let mut state = self.lock();
        if Self::admit(&mut state, &domain, url, now) {
            Self::record(&mut state, &domain, url, now);
            true
        } else {
            false
        }
    }

    /// Wait until `domain`'s window has room, then record the request.
    ///
    /// Unlike [`try_acquire`](Self::try_acquire) a full window is not a
    /// refusal: the caller sleeps until the oldest request leaves it.
    /// Returns `false` only when the policy allows no requests at all.
    pub async fn acquire(
        &self,
        domain: &str,
        url: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let domain = normalize_domain(domain);

        loop {
            if cancel.is_cancelled() {
                return Err(ComplianceError::Cancelled);
            }

            let now = Instant::now();
            let ready_at = {
                let mut state = self.lock();
                let limit = Self::limit(&state.store.policy_for(&domain));
                if limit == 0 {
                    return Ok(false);
                }
                let window = state.windows.entry(domain.clone()).or_default();
                if window.count(now) < limit {
                    Self::record(&mut state, &domain, url, now);
                    return Ok(true);
                }
                window.next_expiry().unwrap_or(now)
            };

            let wait = ready_at.saturating_duration_since(now);
            let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
            debug!(domain = %domain, wait_ms, "waiting for rate window");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ComplianceError::Cancelled),
                () = tokio::time::sleep_until(ready_at) => {}
            }
        }
    }

    fn limit(policy: &DomainPolicy) -> usize {
        usize::try_from(policy.max_requests_per_minute).unwrap_or(usize::MAX)
    }

    fn admit(state: &mut EngineState, domain: &str, url: Option<&str>, now: Instant) -> bool {
        let EngineState {
            store,
            windows,
            audit,
        } = state;
        let policy = store.policy_for(domain);
        let window = windows.entry(domain.to_string()).or_default();
        let in_window = window.count(now);
        let limit = Self::limit(&policy);

        if in_window < limit {
            return true;
        }

        window.record_blocked();
        audit.record(
            domain,
            url,
            AuditAction::RateLimited,
            format!("{in_window}/{limit} requests in the last minute"),
        );
        false
    }

    fn record(state: &mut EngineState, domain: &str, url: Option<&str>, now: Instant) {
        let EngineState { windows, audit, .. } = state;
        windows.entry(domain.to_string()).or_default().record(now);
        audit.record(domain, url, AuditAction::Allowed, "request issued");
    }

    /// Minimum delay callers must keep between requests to `domain`, in milliseconds.
    ///
    /// This is the configured floor, raised to the robots.txt `Crawl-delay`
    /// when a cached rule set for the domain asked for more.
    #[must_use]
    pub fn min_delay_ms(&self, domain: &str) -> u64 {
        let domain = normalize_domain(domain);
        let configured = self.policy_for(&domain).min_delay_ms;
        let crawl_delay = self
            .crawl_delays
            .get(&domain)
            .map_or(0, |d| u64::try_from(d.value().as_millis()).unwrap_or(u64::MAX));
        configured.max(crawl_delay)
    }

    /// Whether robots.txt permits fetching `url`.
    ///
    /// Domains whose policy does not respect robots are allowed without a
    /// fetch. A missing, unreachable or malformed robots.txt allows
    /// everything and is cached for the TTL like any other result.
    pub async fn is_path_allowed(&self, url: &str, cancel: &CancellationToken) -> Result<bool> {
        let parsed = parse_target(url)?;
        let domain = normalize_domain(parsed.host_str().unwrap_or_default());

        if !self.policy_for(&domain).respect_robots {
            return Ok(true);
        }

        let rules = self.robots_for(&parsed, &domain, cancel).await?;
        let path = match parsed.query() {
            Some(query) => format!("{}?{query}", parsed.path()),
            None => parsed.path().to_string(),
        };

        if rules.is_allowed(&path) {
            return Ok(true);
        }

        let mut state = self.lock();
        let EngineState { windows, audit, .. } = &mut *state;
        windows.entry(domain.clone()).or_default().record_blocked();
        audit.record(
            &domain,
            Some(url),
            AuditAction::Blocked,
            "disallowed by robots.txt",
        );
        Ok(false)
    }

    /// Robots check, then rate check, then record: the full gate for one request.
    pub async fn check_and_record(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Decision> {
        if !self.is_path_allowed(url, cancel).await? {
            return Ok(Decision::Disallowed);
        }
        let parsed = parse_target(url)?;
        let domain = parsed.host_str().unwrap_or_default();

        if self.try_acquire(domain, Some(url)) {
            Ok(Decision::Allowed)
        } else {
            Ok(Decision::RateLimited)
        }
    }

    async fn robots_for(
        &self,
        parsed: &Url,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<RobotsRuleSet>> {
        let origin = parsed.origin().ascii_serialization();

        let cached = self
            .robots_cache
            .get(&origin)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(rules) = cached {
            if rules.is_fresh(Instant::now(), self.robots_ttl) {
                return Ok(rules);
            }
        }

        if cancel.is_cancelled() {
            return Err(ComplianceError::Cancelled);
        }

        // One fetch per origin at a time; latecomers reuse the winner's result.
        let gate = Arc::clone(&self.robots_fetches.entry(origin.clone()).or_default());
        let _fetching = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ComplianceError::Cancelled),
            guard = gate.lock() => guard,
        };

        let cached = self
            .robots_cache
            .get(&origin)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(rules) = cached {
            if rules.is_fresh(Instant::now(), self.robots_ttl) {
                return Ok(rules);
            }
        }

        let robots_url = format!("{origin}/robots.txt");
        let rules = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ComplianceError::Cancelled),
            rules = self.fetch_robots(&robots_url) => Arc::new(rules),
        };

        match rules.crawl_delay() {
            Some(delay) => {
                self.crawl_delays.insert(domain.to_string(), delay);
            }
            None => {
                self.crawl_delays.remove(domain);
            }
        }
        self.robots_cache.insert(origin, Arc::clone(&rules));
        Ok(rules)
    }

    async fn fetch_robots(&self, robots_url: &str) -> RobotsRuleSet {
        let response = self
            .client
            .get(robots_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.robots_fetch_timeout)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => {
                    let rules = RobotsRuleSet::parse(&body, &self.user_agent);
                    debug!(url = %robots_url, rules = rules.rules().len(), "fetched robots.txt");
                    rules
                }
                Err(e) => {
                    warn!(url = %robots_url, error = %e, "unreadable robots.txt, allowing all");
                    RobotsRuleSet::allow_all()
                }
            },
            Ok(response) => {
                let status = response.status();
                debug!(url = %robots_url, status = %status, "no robots.txt, allowing all");
                RobotsRuleSet::allow_all()
            }
            Err(e) => {
                warn!(url = %robots_url, error = %e, "robots.txt fetch failed, allowing all");
                RobotsRuleSet::allow_all()
            }
        }
    }

    /// Drop every cached robots rule set.
    pub fn clear_robots_cache(&self) {
        self.robots_cache.clear();
        self.crawl_delays.clear();
    }

    /// Number of origins with a cached rule set (fresh or stale).
    #[must_use]
    pub fn robots_cache_len(&self) -> usize {
        self.robots_cache.len()
    }

    /// Audit entries, most recent first, optionally for one domain only.
    #[must_use]
    pub fn get_audit_log(&self, domain: Option<&str>, max_entries: usize) -> Vec<AuditEntry> {
        let domain = domain.map(normalize_domain);
        self.lock().audit.recent(domain.as_deref(), max_entries)
    }

    /// Request counters for every domain touched so far.
    #[must_use]
    pub fn get_domain_statistics(&self) -> HashMap<String, DomainStatistics> {
        let now = Instant::now();
        let mut state = self.lock();
        state
            .windows
            .iter_mut()
            .map(|(domain, window)| {
                let stats = DomainStatistics {
                    total_requests: window.total_requests(),
                    blocked_requests: window.blocked_requests(),
                    requests_last_minute: window.count(now),
                };
                (domain.clone(), stats)
            })
            .collect()
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new(DomainPolicyStore::with_builtin())
    }
}

/// Parse an absolute http(s) URL with a host.
pub(crate) fn parse_target(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| ComplianceError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ComplianceError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ComplianceError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed)
}
