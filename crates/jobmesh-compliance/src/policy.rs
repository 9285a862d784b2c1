//! Domain rate policies.
//!
//! The store ships with conservative limits for the boards and applicant
//! tracking systems adapters talk to most. Anything else falls back to the
//! default policy (10 requests/minute, 3 s between requests, robots respected).

use jobmesh_core::{ComplianceConfig, DomainPolicy};
use std::collections::HashMap;
use tracing::debug;

/// Built-in policies: (domain, requests per minute, min delay ms, respect robots).
const BUILTIN_POLICIES: &[(&str, u32, u64, bool)] = &[
    ("linkedin.com", 5, 12_000, true),
    ("indeed.com", 10, 6_000, true),
    ("glassdoor.com", 6, 10_000, true),
    ("stepstone.de", 10, 5_000, true),
    ("xing.com", 10, 5_000, true),
    ("remoteok.com", 20, 2_000, true),
    ("weworkremotely.com", 20, 3_000, true),
    ("remotive.com", 30, 1_000, true),
    ("arbeitnow.com", 30, 1_000, true),
    ("himalayas.app", 20, 2_000, true),
    ("jobicy.com", 20, 2_000, true),
    ("workingnomads.com", 15, 3_000, true),
    ("justjoin.it", 20, 2_000, true),
    ("nofluffjobs.com", 20, 2_000, true),
    ("landing.jobs", 15, 3_000, true),
    ("github.com", 30, 1_000, true),
    ("greenhouse.io", 30, 1_000, true),
    ("lever.co", 30, 1_000, true),
    ("workable.com", 20, 2_000, true),
    ("ashbyhq.com", 20, 2_000, true),
    ("smartrecruiters.com", 20, 2_000, true),
];

/// Normalize a host for policy lookup: lowercase, no port, no leading `www.`.
#[must_use]
pub fn normalize_domain(domain: &str) -> String {
    let lower = domain.trim().trim_end_matches('.').to_lowercase();
    let without_port = match lower.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host.to_string(),
        _ => lower,
    };
    without_port
        .strip_prefix("www.")
        .map(ToString::to_string)
        .unwrap_or(without_port)
}

/// Map of domain to rate policy.
///
/// Lookups try the exact domain first, then each parent domain
/// (`boards.greenhouse.io` -> `greenhouse.io`), then the default policy.
#[derive(Debug, Clone)]
pub struct DomainPolicyStore {
    policies: HashMap<String, DomainPolicy>,
    default_policy: DomainPolicy,
}

impl DomainPolicyStore {
    /// Create an empty store that answers every lookup with `default_policy`.
    #[must_use]
    pub fn empty(default_policy: DomainPolicy) -> Self {
        Self {
            policies: HashMap::new(),
            default_policy,
        }
    }

    /// Create a store populated with the built-in job-board policies.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut store = Self::empty(DomainPolicy::default());
        for &(domain, rpm, delay, robots) in BUILTIN_POLICIES {
            store.set_policy(DomainPolicy::new(domain, rpm, delay, robots));
        }
        store
    }

    /// Built-in policies overlaid with the configured default and overrides.
    #[must_use]
    pub fn from_config(config: &ComplianceConfig) -> Self {
        let mut store = Self::with_builtin();
        store.default_policy = config.default_policy.clone();
        for policy in &config.domains {
            store.set_policy(policy.clone());
        }
        store
    }

    /// Insert or replace the policy for `policy.domain` (last write wins).
    pub fn set_policy(&mut self, mut policy: DomainPolicy) {
        policy.domain = normalize_domain(&policy.domain);
        debug!(
            domain = %policy.domain,
            max_rpm = policy.max_requests_per_minute,
            min_delay_ms = policy.min_delay_ms,
            "set domain policy"
        );
        self.policies.insert(policy.domain.clone(), policy);
    }

    /// Resolve the policy for a domain.
    ///
    /// Unknown domains receive a copy of the default policy carrying their own name.
    #[must_use]
    pub fn policy_for(&self, domain: &str) -> DomainPolicy {
        let domain = normalize_domain(domain);

        let mut candidate = domain.as_str();
        loop {
            if let Some(policy) = self.policies.get(candidate) {
                return policy.clone();
            }
            match candidate.split_once('.') {
                Some((_, parent)) if parent.contains('.') => candidate = parent,
                _ => break,
            }
        }

        DomainPolicy {
            domain,
            ..self.default_policy.clone()
        }
    }

    /// The policy applied to unknown domains.
    #[must_use]
    pub fn default_policy(&self) -> &DomainPolicy {
        &self.default_policy
    }

    /// Number of explicitly configured domains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no domain has an explicit policy.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for DomainPolicyStore {
    fn default() -> Self {
        Self::with_builtin()
    }
}
