//! Discover, re-scrape, match.

use crate::discovery::{CanonicalDiscovery, CorrelationTarget};
use crate::error::{CorrelationError, Result};
use crate::matcher::{PositionMatch, PositionMatcher};
use crate::probe::UrlProbe;
use async_trait::async_trait;
use jobmesh_core::{CorrelationConfig, Posting};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Scrapes a company's own careers site.
#[async_trait]
pub trait CareerSiteScraper: Send + Sync {
    /// Postings listed at `target.canonical_url`.
    async fn scrape(
        &self,
        target: &CorrelationTarget,
        cancel: &CancellationToken,
    ) -> Result<Vec<Posting>>;
}

/// Matches found for one intermediary posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMatches {
    /// The intermediary posting
    pub source: Posting,
    /// Canonical postings that likely describe the same position
    pub matches: Vec<PositionMatch>,
}

/// Outcome of [`CorrelationEngine::correlate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Discovery result
    pub target: CorrelationTarget,
    /// Number of postings scraped from the canonical site
    pub canonical_postings: usize,
    /// One entry per intermediary posting, in input order
    pub matches: Vec<SourceMatches>,
}

impl CorrelationReport {
    /// Intermediary postings with at least one canonical match.
    #[must_use]
    pub fn confirmed(&self) -> usize {
        self.matches.iter().filter(|m| !m.matches.is_empty()).count()
    }
}

/// Cross-source correlation: canonical discovery plus posting matching.
pub struct CorrelationEngine {
    discovery: CanonicalDiscovery,
    scraper: Arc<dyn CareerSiteScraper>,
    matcher: PositionMatcher,
}

impl CorrelationEngine {
    /// Create an engine with default settings.
    #[must_use]
    pub fn new(probe: Arc<dyn UrlProbe>, scraper: Arc<dyn CareerSiteScraper>) -> Self {
        Self::with_config(probe, scraper, &CorrelationConfig::default())
    }

    /// Create an engine from the `[correlation]` section.
    ///
    /// An empty `search_endpoint` disables the search step.
    #[must_use]
    pub fn with_config(
        probe: Arc<dyn UrlProbe>,
        scraper: Arc<dyn CareerSiteScraper>,
        config: &CorrelationConfig,
    ) -> Self {
        let endpoint = config.search_endpoint.trim();
        let search_endpoint = (!endpoint.is_empty()).then(|| endpoint.to_string());
        Self {
            discovery: CanonicalDiscovery::new(probe, search_endpoint),
            scraper,
            matcher: PositionMatcher::new(config.min_confidence),
        }
    }

    /// The underlying matcher.
    #[must_use]
    pub fn matcher(&self) -> &PositionMatcher {
        &self.matcher
    }

    /// First reachable careers URL for `entity_name`, or `None`.
    pub async fn discover_canonical_url(
        &self,
        entity_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        Ok(self.discovery.discover(entity_name, cancel).await?.canonical_url)
    }

    /// Full discovery result for `entity_name`.
    pub async fn discover(
        &self,
        entity_name: &str,
        cancel: &CancellationToken,
    ) -> Result<CorrelationTarget> {
        self.discovery.discover(entity_name, cancel).await
    }

    /// Score `candidates` against `source`, keeping confident matches.
    #[must_use]
    pub fn match_positions(&self, source: &Posting, candidates: &[Posting]) -> Vec<PositionMatch> {
        self.matcher.match_postings(source, candidates)
    }

    /// Discover the canonical site, scrape it, and match every intermediary posting.
    ///
    /// An unresolved target or a failed scrape yields a report with no
    /// matches. Only cancellation and invalid input are errors.
    pub async fn correlate(
        &self,
        entity_name: &str,
        intermediary_postings: &[Posting],
        cancel: &CancellationToken,
    ) -> Result<CorrelationReport> {
        let target = self.discovery.discover(entity_name, cancel).await?;

        let canonical = if target.is_resolved() {
            if cancel.is_cancelled() {
                return Err(CorrelationError::Cancelled);
            }
            match self.scraper.scrape(&target, cancel).await {
                Ok(postings) => postings,
                Err(CorrelationError::Cancelled) => return Err(CorrelationError::Cancelled),
                Err(e) => {
                    warn!(entity = %entity_name, error = %e, "canonical scrape failed");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let matches: Vec<SourceMatches> = intermediary_postings
            .iter()
            .map(|source| SourceMatches {
                source: source.clone(),
                matches: self.matcher.match_postings(source, &canonical),
            })
            .collect();

        let report = CorrelationReport {
            target,
            canonical_postings: canonical.len(),
            matches,
        };
        info!(
            entity = %entity_name,
            canonical_postings = report.canonical_postings,
            confirmed = report.confirmed(),
            "correlation complete"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for CorrelationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationEngine")
            .field("discovery", &self.discovery)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoProbe;

    #[async_trait]
    impl UrlProbe for NoProbe {
        async fn exists(&self, _url: &str, _cancel: &CancellationToken) -> Result<bool> {
            Ok(false)
        }

        async fn fetch_text(
            &self,
            _url: &str,
            _cancel: &CancellationToken,
        ) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct PanicScraper;

    #[async_trait]
    impl CareerSiteScraper for PanicScraper {
        async fn scrape(
            &self,
            _target: &CorrelationTarget,
            _cancel: &CancellationToken,
        ) -> Result<Vec<Posting>> {
            panic!("scraper must not run for an unresolved target");
        }
    }

    #[tokio::test]
    async fn test_unresolved_target_skips_scrape() {
        let engine = CorrelationEngine::new(Arc::new(NoProbe), Arc::new(PanicScraper));
        let postings = vec![Posting::new("LinkedIn", "Rust Engineer", "Acme")];

        let report = engine
            .correlate("Acme", &postings, &CancellationToken::new())
            .await
            .expect("correlate");

        assert!(!report.target.is_resolved());
        assert_eq!(report.canonical_postings, 0);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.confirmed(), 0);
    }

    #[test]
    fn test_config_threshold_and_empty_endpoint() {
        let config = CorrelationConfig {
            min_confidence: 0.5,
            search_endpoint: "  ".to_string(),
            ..CorrelationConfig::default()
        };
        let engine =
            CorrelationEngine::with_config(Arc::new(NoProbe), Arc::new(PanicScraper), &config);
        assert!((engine.matcher().min_confidence() - 0.5).abs() < f64::EPSILON);
        assert!(format!("{engine:?}").contains("search_endpoint: None"));
    }
}
