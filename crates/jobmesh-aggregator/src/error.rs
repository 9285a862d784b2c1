//! Error types for the aggregation subsystem.
//!
//! [`AdapterError`] is what a single source adapter reports. The orchestrator
//! never propagates it: a failing adapter degrades to zero postings. Only
//! [`AggregateError`] crosses the orchestrator boundary.

use jobmesh_compliance::ComplianceError;
use thiserror::Error;

/// Failure reported by one source adapter.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Network-level failure the adapter chose to surface
    #[error("transport error: {0}")]
    Transport(String),

    /// The source returned content the adapter could not understand
    #[error("parse error: {0}")]
    Parse(String),

    /// Compliance gate rejected the input (bad URL)
    #[error("compliance error: {0}")]
    Compliance(ComplianceError),

    /// The adapter observed cancellation
    #[error("adapter cancelled")]
    Cancelled,

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl From<ComplianceError> for AdapterError {
    fn from(err: ComplianceError) -> Self {
        match err {
            ComplianceError::Cancelled => Self::Cancelled,
            other => Self::Compliance(other),
        }
    }
}

/// Errors that can occur in aggregation operations.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// An adapter with the same platform name is already registered
    #[error("adapter already registered: {name}")]
    DuplicateAdapter {
        /// Platform name
        name: String,
    },

    /// No adapter is registered under this platform name
    #[error("no adapter registered for platform: {name}")]
    UnknownAdapter {
        /// Platform name
        name: String,
    },

    /// Board definition directory not found
    #[error("board definitions directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// Failed to read a board definition file
    #[error("failed to load board definition from {path}: {source}")]
    LoadError {
        /// Path to the definition file
        path: String,
        /// Underlying error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse board definition TOML
    #[error("failed to parse board definition TOML in {path}: {source}")]
    ParseError {
        /// Path to the definition file
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Board definition failed validation
    #[error("invalid board definition for {board}: {reason}")]
    InvalidBoard {
        /// Board name (may be empty when the name itself is invalid)
        board: String,
        /// Reason for validation failure
        reason: String,
    },

    /// I/O error while reading board definitions
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the aggregation
    #[error("aggregation cancelled")]
    Cancelled,
}

impl From<AggregateError> for jobmesh_core::JobmeshError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::Cancelled => Self::Cancelled,
            AggregateError::Io(e) => Self::Io(e),
            AggregateError::InvalidBoard { .. } => Self::Validation(err.to_string()),
            other => Self::Aggregation(other.to_string()),
        }
    }
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregateError>;
