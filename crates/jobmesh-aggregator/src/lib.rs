//! Jobmesh Aggregator - concurrent scraping across job source adapters.
//!
//! This crate fans a search out to every registered [`SourceAdapter`],
//! bounds each with its own timeout, and merges what comes back into an
//! [`AggregationResult`]. Results are then filtered by stack, location and
//! salary floor and ranked by relevance.
//!
//! # Features
//!
//! - Per-source isolation: errors, panics and timeouts zero one source only
//! - Caller cancellation via `CancellationToken`
//! - Board recommendation from a built-in or TOML-loaded catalog
//!
//! # Example
//!
//! ```rust,ignore
//! use jobmesh_aggregator::{AdapterRegistry, AggregationRequest, ScrapeOrchestrator};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let mut registry = AdapterRegistry::new();
//! registry.register(Arc::new(remote_ok_adapter))?;
//!
//! let orchestrator = ScrapeOrchestrator::new(Arc::new(registry));
//! let request = AggregationRequest {
//!     preferred_stacks: vec!["Rust".to_string()],
//!     preferred_locations: vec!["Germany".to_string()],
//!     ..AggregationRequest::default()
//! };
//!
//! let result = orchestrator.scrape_all(&request, &CancellationToken::new()).await?;
//! for posting in &result.filtered_postings {
//!     println!("{} at {}", posting.title, posting.company);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapter;
pub mod board;
pub mod error;
pub mod filter;
pub mod loader;
pub mod orchestrator;
pub mod ranking;

// Re-export commonly used types
pub use adapter::{AdapterRegistry, SourceAdapter};
pub use board::{BoardCatalog, BoardProfile, PreferenceTags};
pub use error::{AdapterError, AggregateError, Result};
pub use filter::PostingFilter;
pub use loader::BoardLoader;
pub use orchestrator::{
    AggregationRequest, AggregationResult, FailureKind, ScrapeOrchestrator, SourceFailure,
};
pub use ranking::Ranker;
