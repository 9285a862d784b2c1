//! The source adapter capability and its registry.

use crate::error::{AdapterError, AggregateError, Result};
use async_trait::async_trait;
use jobmesh_core::Posting;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One external job source.
///
/// Implementations fetch through a [`jobmesh_compliance::PoliteFetcher`] and
/// should return an empty list (or `None`) for transport failures instead
/// of an error. Errors and panics are tolerated by the orchestrator but
/// logged as failures of that source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Display name of the platform, unique within a registry.
    fn platform_name(&self) -> &str;

    /// Scrape listing pages for `keywords`, visiting at most `max_pages`.
    async fn scrape(
        &self,
        keywords: &str,
        max_pages: u32,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<Posting>, AdapterError>;

    /// Scrape a single posting page.
    async fn scrape_detail(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<Option<Posting>, AdapterError>;
}

/// Registered adapters, kept in registration order.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter.
    ///
    /// Platform names are compared case-insensitively; a second adapter for
    /// the same platform is rejected.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Result<()> {
        let name = adapter.platform_name();
        if self.get(name).is_some() {
            return Err(AggregateError::DuplicateAdapter {
                name: name.to_string(),
            });
        }

        debug!(platform = %name, "registered source adapter");
        self.adapters.push(adapter);
        Ok(())
    }

    /// Look up an adapter by platform name (case-insensitive).
    #[must_use]
    pub fn get(&self, platform: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.platform_name().eq_ignore_ascii_case(platform))
            .cloned()
    }

    /// All adapters in registration order.
    #[must_use]
    pub fn adapters(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.adapters
    }

    /// Platform names in registration order.
    #[must_use]
    pub fn platform_names(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|a| a.platform_name().to_string())
            .collect()
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("platforms", &self.platform_names())
            .finish()
    }
}
