//! Compliance-aware HTTP fetching for source adapters.
//!
//! Adapters own a [`PoliteFetcher`] instead of inheriting request helpers.
//! With an engine attached every GET goes through robots.txt, the domain's
//! rate window and its minimum delay. Without one, requests are always
//! allowed and only the fetcher's default delay applies.

use crate::engine::{parse_target, ComplianceEngine, Decision};
use crate::error::{ComplianceError, Result};
use crate::pacer::RequestPacer;
use crate::policy::normalize_domain;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Delay applied between requests to one domain when an adapter has no opinion.
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_millis(1000);

/// GETs pages on behalf of an adapter while honoring compliance rules.
///
/// A full rate window skips the request rather than waiting for it, so a
/// paginating adapter stops early instead of stalling the whole search.
#[derive(Debug)]
pub struct PoliteFetcher {
    client: reqwest::Client,
    pacer: RequestPacer,
}

impl PoliteFetcher {
    /// Create a fetcher.
    ///
    /// `compliance = None` disables robots and rate checks; only
    /// `default_delay` spacing is applied.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        compliance: Option<Arc<ComplianceEngine>>,
        default_delay: Duration,
    ) -> Self {
        Self {
            client,
            pacer: RequestPacer::new(compliance, default_delay),
        }
    }

    /// Create a fetcher whose client identifies with the engine's user agent.
    ///
    /// Requests are spaced by at least [`DEFAULT_POLITENESS_DELAY`].
    pub fn for_engine(engine: Arc<ComplianceEngine>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(engine.user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self::new(client, Some(engine), DEFAULT_POLITENESS_DELAY))
    }

    /// The engine this fetcher reports to, if any.
    #[must_use]
    pub fn compliance(&self) -> Option<&Arc<ComplianceEngine>> {
        self.pacer.compliance()
    }

    /// Delay to keep between two requests to `domain`.
    #[must_use]
    pub fn delay_for(&self, domain: &str) -> Duration {
        self.pacer.delay_for(domain)
    }

    /// Fetch `url` as text.
    ///
    /// Returns `Ok(None)` when the request was refused by robots.txt or the
    /// rate window, and on any transport failure or non-success status.
    pub async fn get_text(&self, url: &str, cancel: &CancellationToken) -> Result<Option<String>> {
        let parsed = parse_target(url)?;
        let domain = normalize_domain(parsed.host_str().unwrap_or_default());

        if let Some(engine) = self.compliance() {
            if !engine.is_path_allowed(url, cancel).await? {
                debug!(url = %url, "skipping request disallowed by robots.txt");
                return Ok(None);
            }
        }

        self.pacer.wait_turn(&domain, cancel).await?;

        if let Some(engine) = self.compliance() {
            if !engine.try_acquire(&domain, Some(url)) {
                debug!(url = %url, "skipping rate limited request");
                return Ok(None);
            }
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ComplianceError::Cancelled),
            response = self.client.get(url).send() => response,
        };

        match response {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => Ok(Some(body)),
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to read response body");
                    Ok(None)
                }
            },
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "non-success response");
                Ok(None)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "request failed");
                Ok(None)
            }
        }
    }

    /// Same gate as [`get_text`](Self::get_text) without issuing a request.
    pub async fn check(&self, url: &str, cancel: &CancellationToken) -> Result<Decision> {
        match self.compliance() {
            Some(engine) => engine.check_and_record(url, cancel).await,
            None => {
                parse_target(url)?;
                Ok(Decision::Allowed)
            }
        }
    }
}
