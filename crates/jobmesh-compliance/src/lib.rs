//! Jobmesh Compliance - polite access to third-party job sites.
//!
//! Every outbound request made by a source adapter or the correlation
//! engine passes through a [`ComplianceEngine`], which enforces:
//! - per-domain request budgets over a sliding one-minute window
//! - robots.txt rules for the crawler's user agent, cached per origin
//! - minimum delays between requests (configured or `Crawl-delay`), kept by
//!   a [`RequestPacer`]
//!
//! Every allow/deny decision lands in a bounded audit log.
//!
//! # Example
//!
//! ```rust
//! use jobmesh_compliance::{ComplianceEngine, DomainPolicyStore};
//!
//! let engine = ComplianceEngine::new(DomainPolicyStore::with_builtin());
//!
//! if engine.try_acquire("remoteok.com", Some("https://remoteok.com/remote-rust-jobs")) {
//!     println!("request slot acquired");
//! }
//!
//! let stats = engine.get_domain_statistics();
//! assert_eq!(stats["remoteok.com"].total_requests, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod audit;
mod engine;
mod error;
mod fetch;
mod pacer;
mod policy;
mod robots;
mod window;

pub use audit::{AuditAction, AuditEntry, AuditLog, DEFAULT_AUDIT_CAPACITY};
pub use engine::{ComplianceEngine, Decision, DomainStatistics};
pub use error::{ComplianceError, Result};
pub use fetch::{PoliteFetcher, DEFAULT_POLITENESS_DELAY};
pub use jobmesh_core::DomainPolicy;
pub use pacer::RequestPacer;
pub use policy::{normalize_domain, DomainPolicyStore};
pub use robots::{RobotsRule, RobotsRuleSet};
pub use window::{RequestWindow, WINDOW};
