//! Scrape orchestrator for fanning out over source adapters.
//!
//! Every registered adapter runs in its own task, bounded by a per-adapter
//! timeout and a child of the caller's cancellation token. The orchestrator
//! waits for all of them and keeps whatever finished: a failing, panicking
//! or slow source contributes zero postings and never affects its siblings.

use crate::adapter::{AdapterRegistry, SourceAdapter};
use crate::board::{BoardCatalog, BoardProfile};
use crate::error::{AdapterError, AggregateError, Result};
use crate::filter::PostingFilter;
use crate::ranking::Ranker;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use jobmesh_core::{AggregationConfig, Posting};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What the caller is looking for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationRequest {
    /// Technology stacks; empty disables the stack filter
    pub preferred_stacks: Vec<String>,
    /// Countries or regions; empty or a wildcard disables the location filter
    pub preferred_locations: Vec<String>,
    /// Salary floor; 0 disables the salary filter
    pub min_salary: u32,
    /// Search keywords passed to adapters; defaults to the stacks
    pub keywords: Option<String>,
    /// Pages per adapter; defaults to the orchestrator's setting
    pub max_pages: Option<u32>,
}

impl AggregationRequest {
    /// Keywords sent to adapters: explicit keywords, else the stacks joined by spaces.
    #[must_use]
    pub fn effective_keywords(&self) -> String {
        match self.keywords.as_deref().map(str::trim) {
            Some(keywords) if !keywords.is_empty() => keywords.to_string(),
            _ => self
                .preferred_stacks
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Why a source contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The adapter returned an error
    Error,
    /// The adapter panicked
    Panicked,
    /// The adapter exceeded its timeout
    TimedOut,
}

/// A source that failed during one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Platform name
    pub source: String,
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable detail
    pub message: String,
}

/// Output of one [`ScrapeOrchestrator::scrape_all`] run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Postings returned per source; failed sources are listed with 0
    pub jobs_by_source: HashMap<String, usize>,
    /// Every posting from every source, in registration order
    pub all_postings: Vec<Posting>,
    /// Postings passing the request's filters, best first
    pub filtered_postings: Vec<Posting>,
    /// Sources that errored, panicked or timed out
    pub failed_sources: Vec<SourceFailure>,
}

impl AggregationResult {
    /// Total number of postings collected.
    #[must_use]
    pub fn total_jobs(&self) -> usize {
        self.all_postings.len()
    }

    /// Whether `source` failed during this run.
    #[must_use]
    pub fn is_failed(&self, source: &str) -> bool {
        self.failed_sources.iter().any(|f| f.source == source)
    }
}

enum SourceOutcome {
    Completed(Vec<Posting>),
    Failed(FailureKind, String),
    Cancelled,
}

/// Orchestrates scraping across every registered adapter.
#[derive(Debug)]
pub struct ScrapeOrchestrator {
    registry: Arc<AdapterRegistry>,
    catalog: BoardCatalog,
    adapter_timeout: Duration,
    max_pages: u32,
    recent_posting_days: i64,
}

impl ScrapeOrchestrator {
    /// Create an orchestrator with default settings and the built-in board catalog.
    #[must_use]
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self::with_config(registry, &AggregationConfig::default())
    }

    /// Create an orchestrator from the `[aggregation]` configuration section.
    #[must_use]
    pub fn with_config(registry: Arc<AdapterRegistry>, config: &AggregationConfig) -> Self {
        Self {
            registry,
            catalog: BoardCatalog::builtin().with_limit(config.max_recommended_boards),
            adapter_timeout: Duration::from_secs(config.adapter_timeout_secs),
            max_pages: config.max_pages,
            recent_posting_days: config.recent_posting_days,
        }
    }

    /// Set the per-adapter timeout.
    #[must_use]
    pub fn with_adapter_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// Replace the board catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: BoardCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Registered adapters.
    #[must_use]
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Best boards for the given locations and stacks.
    #[must_use]
    pub fn recommended_boards(&self, locations: &[String], stacks: &[String]) -> Vec<BoardProfile> {
        self.catalog.recommended_boards(locations, stacks)
    }

    /// Run every adapter and aggregate the results.
    ///
    /// Fails only when `cancel` fires; individual sources never fail the call.
    pub async fn scrape_all(
        &self,
        request: &AggregationRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregationResult> {
        self.scrape_all_at(request, Utc::now(), cancel).await
    }

    /// [`scrape_all`](Self::scrape_all) with an explicit ranking clock.
    pub async fn scrape_all_at(
        &self,
        request: &AggregationRequest,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<AggregationResult> {
        if cancel.is_cancelled() {
            return Err(AggregateError::Cancelled);
        }

        let keywords = request.effective_keywords();
        let max_pages = request.max_pages.unwrap_or(self.max_pages);
        info!(
            sources = self.registry.len(),
            keywords = %keywords,
            max_pages,
            "starting aggregation"
        );

        let (names, handles): (Vec<String>, Vec<_>) = self
            .registry
            .adapters()
            .iter()
            .map(|adapter| {
                let name = adapter.platform_name().to_string();
                let handle = tokio::spawn(run_scrape(
                    Arc::clone(adapter),
                    keywords.clone(),
                    max_pages,
                    self.adapter_timeout,
                    cancel.child_token(),
                ));
                (name, handle)
            })
            .unzip();

        let joined = join_all(handles).await;

        if cancel.is_cancelled() {
            debug!("aggregation cancelled by caller");
            return Err(AggregateError::Cancelled);
        }

        let mut result = AggregationResult::default();
        for (name, joined) in names.into_iter().zip(joined) {
            let outcome = joined.unwrap_or_else(|e| {
                if e.is_panic() {
                    error!(source = %name, "source adapter panicked");
                    SourceOutcome::Failed(FailureKind::Panicked, "adapter panicked".to_string())
                } else {
                    SourceOutcome::Cancelled
                }
            });

            match outcome {
                SourceOutcome::Completed(postings) => {
                    result.jobs_by_source.insert(name, postings.len());
                    result.all_postings.extend(postings);
                }
                SourceOutcome::Failed(kind, message) => {
                    result.jobs_by_source.insert(name.clone(), 0);
                    result.failed_sources.push(SourceFailure {
                        source: name,
                        kind,
                        message,
                    });
                }
                SourceOutcome::Cancelled => {
                    result.jobs_by_source.insert(name, 0);
                }
            }
        }

        result.filtered_postings = self.filter_and_rank(request, &result.all_postings, now);

        info!(
            total = result.all_postings.len(),
            filtered = result.filtered_postings.len(),
            failed = result.failed_sources.len(),
            "aggregation complete"
        );

        Ok(result)
    }

    /// Apply the request's filters, then rank the survivors as of `now`.
    #[must_use]
    pub fn filter_and_rank(
        &self,
        request: &AggregationRequest,
        postings: &[Posting],
        now: DateTime<Utc>,
    ) -> Vec<Posting> {
        let filter = PostingFilter::from_request(request);
        let kept = filter.apply(postings);
        Ranker::new(filter.stacks(), now, self.recent_posting_days).rank(kept)
    }

    /// Scrape a single posting through the named platform's adapter.
    ///
    /// Adapter failures, panics and timeouts yield `Ok(None)`.
    pub async fn scrape_detail(
        &self,
        platform: &str,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Posting>> {
        let adapter = self
            .registry
            .get(platform)
            .ok_or_else(|| AggregateError::UnknownAdapter {
                name: platform.to_string(),
            })?;

        if cancel.is_cancelled() {
            return Err(AggregateError::Cancelled);
        }

        let timeout = self.adapter_timeout;
        let token = cancel.child_token();
        let url_owned = url.to_string();
        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => Ok(None),
                res = tokio::time::timeout(timeout, adapter.scrape_detail(&url_owned, &token)) => {
                    res.unwrap_or_else(|_| {
                        Err(AdapterError::Other(format!("timed out after {timeout:?}")))
                    })
                }
            }
        });

        let outcome = handle.await;
        if cancel.is_cancelled() {
            return Err(AggregateError::Cancelled);
        }

        match outcome {
            Ok(Ok(posting)) => Ok(posting),
            Ok(Err(e)) => {
                warn!(platform = %platform, url = %url, error = %e, "detail scrape failed");
                Ok(None)
            }
            Err(e) => {
                error!(platform = %platform, url = %url, error = %e, "detail scrape task failed");
                Ok(None)
            }
        }
    }
}

async fn run_scrape(
    adapter: Arc<dyn SourceAdapter>,
    keywords: String,
    max_pages: u32,
    timeout: Duration,
    cancel: CancellationToken,
) -> SourceOutcome {
    let name = adapter.platform_name().to_string();
    let started = tokio::time::Instant::now();

    let scrape = tokio::time::timeout(timeout, adapter.scrape(&keywords, max_pages, &cancel));
    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => SourceOutcome::Cancelled,
        res = scrape => match res {
            Ok(Ok(postings)) => SourceOutcome::Completed(postings),
            Ok(Err(AdapterError::Cancelled)) if cancel.is_cancelled() => SourceOutcome::Cancelled,
            Ok(Err(e)) => SourceOutcome::Failed(FailureKind::Error, e.to_string()),
            Err(_) => {
                // Stop any work the adapter handed off to other tasks.
                cancel.cancel();
                SourceOutcome::Failed(
                    FailureKind::TimedOut,
                    format!("no result within {}s", timeout.as_secs_f64()),
                )
            }
        },
    };

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &outcome {
        SourceOutcome::Completed(postings) => {
            debug!(source = %name, count = postings.len(), elapsed_ms, "source completed");
        }
        SourceOutcome::Failed(kind, message) => {
            warn!(source = %name, ?kind, error = %message, elapsed_ms, "source failed");
        }
        SourceOutcome::Cancelled => {
            debug!(source = %name, elapsed_ms, "source cancelled");
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jobmesh_core::RemotePolicy;

    #[test]
    fn test_effective_keywords() {
        let mut request = AggregationRequest {
            preferred_stacks: vec!["Rust".to_string(), " ".to_string(), "Go".to_string()],
            ..AggregationRequest::default()
        };
        assert_eq!(request.effective_keywords(), "Rust Go");

        request.keywords = Some("  backend engineer ".to_string());
        assert_eq!(request.effective_keywords(), "backend engineer");

        request.keywords = Some(String::new());
        assert_eq!(request.effective_keywords(), "Rust Go");
    }

    #[test]
    fn test_request_deserializes_partial_toml() {
        let request: AggregationRequest =
            toml::from_str("preferred_stacks = [\"C#\"]\nmin_salary = 50000\n")
                .expect("parse request");
        assert_eq!(request.preferred_stacks, vec!["C#"]);
        assert_eq!(request.min_salary, 50_000);
        assert!(request.preferred_locations.is_empty());
        assert!(request.max_pages.is_none());
    }

    #[test]
    fn test_filter_and_rank() {
        let orchestrator = ScrapeOrchestrator::new(Arc::new(AdapterRegistry::new()));
        let now = Utc
            .with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");

        let mut onsite = Posting::new("A", "Rust Developer", "Acme");
        onsite.country = Some("Germany".to_string());
        let mut remote = Posting::new("B", "Rust Engineer", "Globex");
        remote.remote_policy = RemotePolicy::FullyRemote;
        let java = Posting::new("C", "Java Developer", "Initech");

        let request = AggregationRequest {
            preferred_stacks: vec!["rust".to_string()],
            preferred_locations: vec!["Germany".to_string()],
            ..AggregationRequest::default()
        };

        let ranked = orchestrator.filter_and_rank(&request, &[onsite, remote, java], now);
        let titles: Vec<_> = ranked.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust Engineer", "Rust Developer"]);
    }

    #[test]
    fn test_recommended_boards_respects_config_limit() {
        let config = AggregationConfig {
            max_recommended_boards: 4,
            ..AggregationConfig::default()
        };
        let orchestrator =
            ScrapeOrchestrator::with_config(Arc::new(AdapterRegistry::new()), &config);

        let boards = orchestrator.recommended_boards(&["Germany".to_string()], &[]);
        assert_eq!(boards.len(), 4);
    }

    #[tokio::test]
    async fn test_scrape_all_with_no_adapters() {
        let orchestrator = ScrapeOrchestrator::new(Arc::new(AdapterRegistry::new()));
        let result = orchestrator
            .scrape_all(&AggregationRequest::default(), &CancellationToken::new())
            .await
            .expect("aggregate");

        assert!(result.jobs_by_source.is_empty());
        assert_eq!(result.total_jobs(), 0);
    }

    #[tokio::test]
    async fn test_scrape_all_cancelled_up_front() {
        let orchestrator = ScrapeOrchestrator::new(Arc::new(AdapterRegistry::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = orchestrator
            .scrape_all(&AggregationRequest::default(), &cancel)
            .await;
        assert!(matches!(result, Err(AggregateError::Cancelled)));
    }
}
