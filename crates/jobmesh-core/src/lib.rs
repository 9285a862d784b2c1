//! Jobmesh Core - Foundation crate for the jobmesh aggregation toolkit.
//!
//! This crate provides the shared posting model, error handling,
//! configuration management and logging bootstrap that the compliance,
//! aggregator and correlation crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared posting model (`Posting`, `RemotePolicy`)
//! - [`salary`] - Free-text salary parsing for adapters
//! - [`logging`] - `tracing-subscriber` setup
//!
//! # Example
//!
//! ```rust
//! use jobmesh_core::{AppConfig, Posting, RemotePolicy};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.aggregation.adapter_timeout_secs, 30);
//!
//! let mut posting = Posting::new("RemoteOK", "Rust Engineer", "Acme");
//! posting.remote_policy = RemotePolicy::FullyRemote;
//! assert!(posting.is_fully_remote());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod logging;
pub mod salary;
pub mod types;

// Re-export commonly used types
pub use config::{
    AggregationConfig, AppConfig, ComplianceConfig, CorrelationConfig, DomainPolicy,
};
pub use error::{ConfigError, ConfigResult, JobmeshError, Result};
pub use logging::init_tracing;
pub use salary::{parse_salary, SalaryRange};
pub use types::{Posting, RemotePolicy};
