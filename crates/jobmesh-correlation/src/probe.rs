//! Cheap existence probes used during discovery.

use crate::error::{CorrelationError, Result};
use async_trait::async_trait;
use jobmesh_compliance::{normalize_domain, ComplianceEngine, RequestPacer};
use jobmesh_core::CorrelationConfig;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Network access needed by discovery.
///
/// Implementations must treat transport failures as "absent" (`false` or
/// `None`) and only return errors for invalid input or cancellation.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    /// Whether `url` answers with a success status.
    async fn exists(&self, url: &str, cancel: &CancellationToken) -> Result<bool>;

    /// Body of `url` on success.
    async fn fetch_text(&self, url: &str, cancel: &CancellationToken) -> Result<Option<String>>;
}

/// [`UrlProbe`] over `reqwest`.
///
/// Probes use `HEAD` and fall back to `GET` when the server answers 405.
/// With a compliance engine attached, requests to one domain are spaced by
/// its minimum delay and a full rate window is waited out, never read as
/// "absent". Clones share the same pacing.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    pacer: Arc<RequestPacer>,
}

impl HttpProbe {
    /// Create a probe over an existing client.
    #[must_use]
    pub fn new(client: reqwest::Client, compliance: Option<Arc<ComplianceEngine>>) -> Self {
        Self {
            client,
            pacer: Arc::new(RequestPacer::new(compliance, Duration::ZERO)),
        }
    }

    /// Build a client from the `[correlation]` section.
    pub fn from_config(
        config: &CorrelationConfig,
        user_agent: &str,
        compliance: Option<Arc<ComplianceEngine>>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.probe_timeout_secs))
            .build()?;
        Ok(Self::new(client, compliance))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<reqwest::Response>> {
        if cancel.is_cancelled() {
            return Err(CorrelationError::Cancelled);
        }

        let parsed = Url::parse(url).map_err(|e| CorrelationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let domain = normalize_domain(parsed.host_str().unwrap_or_default());
        if !self.pacer.acquire(&domain, Some(url), cancel).await? {
            debug!(url = %url, "domain allows no requests");
            return Ok(None);
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CorrelationError::Cancelled),
            response = request.send() => match response {
                Ok(response) => Ok(Some(response)),
                Err(e) => {
                    debug!(url = %url, error = %e, "probe failed");
                    Ok(None)
                }
            },
        }
    }
}

#[async_trait]
impl UrlProbe for HttpProbe {
    async fn exists(&self, url: &str, cancel: &CancellationToken) -> Result<bool> {
        let Some(response) = self.send(self.client.head(url), url, cancel).await? else {
            return Ok(false);
        };

        if response.status() != StatusCode::METHOD_NOT_ALLOWED {
            return Ok(response.status().is_success());
        }

        let fallback = self.send(self.client.get(url), url, cancel).await?;
        Ok(fallback.is_some_and(|r| r.status().is_success()))
    }

    async fn fetch_text(&self, url: &str, cancel: &CancellationToken) -> Result<Option<String>> {
        let Some(response) = self.send(self.client.get(url), url, cancel).await? else {
            return Ok(None);
        };

        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "fetch returned non-success");
            return Ok(None);
        }

        match response.text().await {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                debug!(url = %url, error = %e, "failed to read body");
                Ok(None)
            }
        }
    }
}
