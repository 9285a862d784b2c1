//! Core error types for jobmesh.
//!
//! This module defines the umbrella error type shared by the subsystem crates.
//! Each subsystem error converts into a variant for propagation across crate
//! boundaries.

use thiserror::Error;

/// Central error type for all jobmesh operations.
#[derive(Error, Debug)]
pub enum JobmeshError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Compliance errors (robots resolution, policy lookup)
    #[error("compliance error: {0}")]
    Compliance(String),

    /// Aggregation errors (adapter registry, board catalog)
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// Correlation errors (discovery, matching)
    #[error("correlation error: {0}")]
    Correlation(String),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation was cancelled by its caller
    #[error("operation cancelled")]
    Cancelled,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobmeshError {
    /// Whether this error represents caller cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `JobmeshError`.
pub type Result<T> = std::result::Result<T, JobmeshError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
