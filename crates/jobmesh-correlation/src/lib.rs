//! Jobmesh Correlation - does a posting seen on a job board exist at the source?
//!
//! Given a company name, [`CorrelationEngine`] looks for the company's own
//! careers page, re-scrapes it through a [`CareerSiteScraper`], and scores
//! each intermediary posting against what it finds there.
//!
//! Discovery probes candidate URLs one at a time and stops at the first hit:
//!
//! 1. `https://www.{domain}{path}` and `https://{domain}{path}` for common careers paths
//! 2. `careers.` and `jobs.` subdomains
//! 3. Hosted applicant tracking boards (Greenhouse, Lever, ...)
//! 4. A web search, ignoring aggregator hosts
//!
//! Match confidence is `0.45 * title + 0.40 * skills + 0.15 * location`.
//!
//! # Example
//!
//! ```rust,ignore
//! use jobmesh_correlation::{CorrelationEngine, HttpProbe};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let probe = HttpProbe::from_config(&config.correlation, "jobmesh/0.1", Some(compliance))?;
//! let engine = CorrelationEngine::with_config(Arc::new(probe), scraper, &config.correlation);
//!
//! let report = engine
//!     .correlate("Acme GmbH", &linkedin_postings, &CancellationToken::new())
//!     .await?;
//! println!("{} of {} confirmed", report.confirmed(), report.matches.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod discovery;
pub mod domain;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod probe;

pub use discovery::{CanonicalDiscovery, CorrelationTarget};
pub use domain::{candidate_urls, company_slug, normalize_domain_name, DiscoveryStrategy};
pub use engine::{CareerSiteScraper, CorrelationEngine, CorrelationReport, SourceMatches};
pub use error::{CorrelationError, Result};
pub use matcher::{PositionMatch, PositionMatcher, DEFAULT_MIN_CONFIDENCE};
pub use probe::{HttpProbe, UrlProbe};
