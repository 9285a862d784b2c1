//! Canonical careers-page discovery.
//!
//! Strategies run strictly in order and stop at the first URL that answers
//! a probe: guessed company domain paths, careers/jobs subdomains, hosted
//! ATS boards, then a web search. Probes are sequential; cancellation is
//! checked before each one.

use crate::domain::{candidate_urls, DiscoveryStrategy};
use crate::error::{CorrelationError, Result};
use crate::probe::UrlProbe;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Hosts of job aggregators and search engines never accepted as canonical.
const AGGREGATOR_HOSTS: &[&str] = &[
    "linkedin.com",
    "indeed.com",
    "indeed.de",
    "glassdoor.com",
    "glassdoor.de",
    "monster.com",
    "monster.de",
    "ziprecruiter.com",
    "stepstone.de",
    "xing.com",
    "kununu.com",
    "remoteok.com",
    "weworkremotely.com",
    "remotive.com",
    "himalayas.app",
    "arbeitnow.com",
    "simplyhired.com",
    "careerbuilder.com",
    "duckduckgo.com",
    "google.com",
    "bing.com",
];

/// Result of discovery for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationTarget {
    /// Company name as given by the caller
    pub entity_name: String,
    /// First reachable careers URL, if any
    pub canonical_url: Option<String>,
    /// How `canonical_url` was found
    pub strategy: Option<DiscoveryStrategy>,
}

impl CorrelationTarget {
    /// A target for which nothing was found.
    #[must_use]
    pub fn unresolved(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            canonical_url: None,
            strategy: None,
        }
    }

    /// Whether a canonical URL was found.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.canonical_url.is_some()
    }
}

/// Finds a company's own careers page.
#[derive(Clone)]
pub struct CanonicalDiscovery {
    probe: Arc<dyn UrlProbe>,
    search_endpoint: Option<String>,
}

impl CanonicalDiscovery {
    /// Create a discovery over `probe`; `search_endpoint = None` skips the search step.
    #[must_use]
    pub fn new(probe: Arc<dyn UrlProbe>, search_endpoint: Option<String>) -> Self {
        Self {
            probe,
            search_endpoint,
        }
    }

    /// Discover the canonical careers URL for `entity_name`.
    pub async fn discover(
        &self,
        entity_name: &str,
        cancel: &CancellationToken,
    ) -> Result<CorrelationTarget> {
        for (strategy, url) in candidate_urls(entity_name)? {
            if cancel.is_cancelled() {
                return Err(CorrelationError::Cancelled);
            }
            if self.probe.exists(&url, cancel).await? {
                info!(entity = %entity_name, url = %url, ?strategy, "found canonical careers page");
                return Ok(CorrelationTarget {
                    entity_name: entity_name.to_string(),
                    canonical_url: Some(url),
                    strategy: Some(strategy),
                });
            }
        }

        if let Some(url) = self.search(entity_name, cancel).await? {
            info!(entity = %entity_name, url = %url, "found careers page via search");
            return Ok(CorrelationTarget {
                entity_name: entity_name.to_string(),
                canonical_url: Some(url),
                strategy: Some(DiscoveryStrategy::Search),
            });
        }

        debug!(entity = %entity_name, "no canonical careers page found");
        Ok(CorrelationTarget::unresolved(entity_name))
    }

    async fn search(
        &self,
        entity_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let Some(endpoint) = &self.search_endpoint else {
            return Ok(None);
        };

        let query = format!("{entity_name} careers");
        let search_url = Url::parse_with_params(endpoint, &[("q", query.as_str())])
            .map_err(|e| CorrelationError::InvalidUrl {
                url: endpoint.clone(),
                reason: e.to_string(),
            })?;

        if cancel.is_cancelled() {
            return Err(CorrelationError::Cancelled);
        }
        let Some(html) = self.probe.fetch_text(search_url.as_str(), cancel).await? else {
            return Ok(None);
        };

        for url in extract_result_urls(&html) {
            if !is_plausible_careers_url(&url) {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(CorrelationError::Cancelled);
            }
            if self.probe.exists(&url, cancel).await? {
                return Ok(Some(url));
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for CanonicalDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalDiscovery")
            .field("search_endpoint", &self.search_endpoint)
            .finish_non_exhaustive()
    }
}

/// Absolute result links from a search results page, in page order.
///
/// DuckDuckGo redirect links (`/l/?uddg=...`) are unwrapped.
#[must_use]
pub fn extract_result_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(result_links) = Selector::parse("a.result__a[href]") else {
        return Vec::new();
    };
    let Ok(any_link) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut anchors: Vec<_> = document.select(&result_links).collect();
    if anchors.is_empty() {
        anchors = document.select(&any_link).collect();
    }

    anchors
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter_map(unwrap_redirect)
        .collect()
}

fn unwrap_redirect(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    if let Some((_, target)) = parsed.query_pairs().find(|(key, _)| key == "uddg") {
        return Url::parse(&target).ok().map(String::from);
    }
    Some(parsed.into())
}

/// An http(s) URL off the aggregator list whose text mentions careers or jobs.
#[must_use]
pub fn is_plausible_careers_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str().map(str::to_lowercase) else {
        return false;
    };

    let is_aggregator = AGGREGATOR_HOSTS
        .iter()
        .any(|agg| host == *agg || host.ends_with(&format!(".{agg}")));
    if is_aggregator {
        return false;
    }

    let lowered = url.to_lowercase();
    lowered.contains("career") || lowered.contains("job")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProbe {
        reachable: HashSet<String>,
        pages: Vec<(String, String)>,
        probed: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn reachable(urls: &[&str]) -> Self {
            Self {
                reachable: urls.iter().map(ToString::to_string).collect(),
                ..Self::default()
            }
        }

        fn probed(&self) -> Vec<String> {
            self.probed.lock().expect("probe log lock").clone()
        }
    }

    #[async_trait]
    impl UrlProbe for FakeProbe {
        async fn exists(&self, url: &str, _cancel: &CancellationToken) -> Result<bool> {
            self.probed.lock().expect("probe log lock").push(url.to_string());
            Ok(self.reachable.contains(url))
        }

        async fn fetch_text(
            &self,
            url: &str,
            _cancel: &CancellationToken,
        ) -> Result<Option<String>> {
            self.probed.lock().expect("probe log lock").push(url.to_string());
            Ok(self
                .pages
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, body)| body.clone()))
        }
    }

    #[tokio::test]
    async fn test_first_reachable_wins() {
        let probe = Arc::new(FakeProbe::reachable(&[
            "https://acme.com/jobs",
            "https://careers.acme.com",
        ]));
        let discovery = CanonicalDiscovery::new(probe.clone(), None);

        let target = discovery
            .discover("Acme Technologies Inc.", &CancellationToken::new())
            .await
            .expect("discover");

        assert_eq!(target.canonical_url.as_deref(), Some("https://acme.com/jobs"));
        assert_eq!(target.strategy, Some(DiscoveryStrategy::CompanyDomain));

        // www.acme.com/careers, acme.com/careers, www.acme.com/jobs, acme.com/jobs
        assert_eq!(probe.probed().len(), 4);
    }

    #[tokio::test]
    async fn test_falls_through_to_ats() {
        let probe = Arc::new(FakeProbe::reachable(&["https://jobs.lever.co/acme"]));
        let discovery = CanonicalDiscovery::new(probe, None);

        let target = discovery
            .discover("Acme", &CancellationToken::new())
            .await
            .expect("discover");

        assert_eq!(target.canonical_url.as_deref(), Some("https://jobs.lever.co/acme"));
        assert_eq!(
            target.strategy,
            Some(DiscoveryStrategy::ApplicantTracking {
                provider: "Lever".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_search_fallback_skips_aggregators() {
        let html = r#"
            <html><body>
              <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.linkedin.com%2Fcompany%2Facme%2Fjobs&rut=x">LinkedIn</a>
              <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.acme-corp.io%2Fabout&rut=y">About</a>
              <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.acme-corp.io%2Fcareers%2F&rut=z">Careers</a>
            </body></html>
        "#;
        let probe = Arc::new(FakeProbe {
            reachable: ["https://www.acme-corp.io/careers/".to_string()]
                .into_iter()
                .collect(),
            pages: vec![("https://search.test/html".to_string(), html.to_string())],
            ..FakeProbe::default()
        });
        let discovery =
            CanonicalDiscovery::new(probe.clone(), Some("https://search.test/html".to_string()));

        let target = discovery
            .discover("Acme", &CancellationToken::new())
            .await
            .expect("discover");

        assert_eq!(
            target.canonical_url.as_deref(),
            Some("https://www.acme-corp.io/careers/")
        );
        assert_eq!(target.strategy, Some(DiscoveryStrategy::Search));

        let probed = probe.probed();
        assert!(probed.iter().any(|u| u.starts_with("https://search.test/html?q=Acme+careers")));
        assert!(!probed.iter().any(|u| u.contains("linkedin.com")));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let probe = Arc::new(FakeProbe::default());
        let discovery =
            CanonicalDiscovery::new(probe, Some("https://search.test/html".to_string()));

        let target = discovery
            .discover("Nobody GmbH", &CancellationToken::new())
            .await
            .expect("discover");
        assert!(!target.is_resolved());
        assert!(target.strategy.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_first_probe() {
        let probe = Arc::new(FakeProbe::default());
        let discovery = CanonicalDiscovery::new(probe.clone(), None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = discovery.discover("Acme", &cancel).await;
        assert!(matches!(result, Err(CorrelationError::Cancelled)));
        assert!(probe.probed().is_empty());
    }

    #[test]
    fn test_extract_result_urls_without_result_class() {
        let html = r#"<a href="https://acme.com/jobs">Jobs</a><a href="/relative">x</a>"#;
        assert_eq!(extract_result_urls(html), vec!["https://acme.com/jobs"]);
    }

    #[test]
    fn test_is_plausible_careers_url() {
        assert!(is_plausible_careers_url("https://acme.com/careers"));
        assert!(is_plausible_careers_url("https://jobs.acme.com/"));
        assert!(!is_plausible_careers_url("https://acme.com/about"));
        assert!(!is_plausible_careers_url("https://de.linkedin.com/jobs/view/1"));
        assert!(!is_plausible_careers_url("https://www.indeed.com/jobs?q=acme"));
        assert!(!is_plausible_careers_url("ftp://acme.com/jobs"));
    }
}
