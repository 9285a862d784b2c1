//! Error types for the correlation subsystem.

use thiserror::Error;

/// Errors that can occur in correlation operations.
///
/// Unreachable probes and failed searches are not errors; discovery simply
/// moves on. Only bad input, client setup and cancellation surface here.
#[derive(Error, Debug)]
pub enum CorrelationError {
    /// The entity name normalizes to nothing usable
    #[error("invalid entity name: {0:?}")]
    InvalidEntityName(String),

    /// A URL passed in by the caller could not be parsed
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Scraping the canonical site failed
    #[error("career site scrape failed: {0}")]
    Scrape(String),

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The caller cancelled the operation
    #[error("correlation cancelled")]
    Cancelled,
}

impl From<jobmesh_compliance::ComplianceError> for CorrelationError {
    fn from(err: jobmesh_compliance::ComplianceError) -> Self {
        use jobmesh_compliance::ComplianceError;
        match err {
            ComplianceError::Cancelled => Self::Cancelled,
            ComplianceError::InvalidUrl { url, reason } => Self::InvalidUrl { url, reason },
            ComplianceError::Client(e) => Self::Client(e),
        }
    }
}

impl From<CorrelationError> for jobmesh_core::JobmeshError {
    fn from(err: CorrelationError) -> Self {
        match err {
            CorrelationError::Cancelled => Self::Cancelled,
            CorrelationError::InvalidEntityName(_) | CorrelationError::InvalidUrl { .. } => {
                Self::Validation(err.to_string())
            }
            CorrelationError::Client(_) | CorrelationError::Scrape(_) => {
                Self::Correlation(err.to_string())
            }
        }
    }
}

/// Result type for correlation operations.
pub type Result<T> = std::result::Result<T, CorrelationError>;
