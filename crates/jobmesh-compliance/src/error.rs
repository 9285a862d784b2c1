//! Error types for the compliance subsystem.
//!
//! Policy outcomes (rate limited, disallowed by robots.txt) are not errors:
//! they are returned as booleans or [`crate::Decision`] values. Only caller
//! mistakes and cancellation surface here.

use thiserror::Error;

/// Errors that can occur in compliance operations.
#[derive(Error, Debug)]
pub enum ComplianceError {
    /// URL could not be parsed or has no host
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,
}

impl From<ComplianceError> for jobmesh_core::JobmeshError {
    fn from(err: ComplianceError) -> Self {
        match err {
            ComplianceError::Cancelled => Self::Cancelled,
            ComplianceError::InvalidUrl { .. } => Self::Validation(err.to_string()),
            ComplianceError::Client(_) => Self::Compliance(err.to_string()),
        }
    }
}

/// Result type for compliance operations.
pub type Result<T> = std::result::Result<T, ComplianceError>;
