//! Configuration management for jobmesh.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration.
///
/// This is loaded from `~/.config/jobmesh/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rate limiting and robots.txt settings
    pub compliance: ComplianceConfig,
    /// Scrape fan-out settings
    pub aggregation: AggregationConfig,
    /// Cross-source matching settings
    pub correlation: CorrelationConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBMESH_USER_AGENT`: Override the crawler user agent
    /// - `JOBMESH_ADAPTER_TIMEOUT_SECS`: Override the per-adapter timeout
    /// - `JOBMESH_RESPECT_ROBOTS`: Override robots.txt handling for unknown domains
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("JOBMESH_USER_AGENT") {
            if !val.trim().is_empty() {
                tracing::debug!("Override compliance.user_agent from env: {}", val);
                self.compliance.user_agent = val;
            }
        }

        if let Ok(val) = std::env::var("JOBMESH_ADAPTER_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.aggregation.adapter_timeout_secs = secs;
                tracing::debug!("Override aggregation.adapter_timeout_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("JOBMESH_RESPECT_ROBOTS") {
            if let Ok(respect) = val.parse() {
                self.compliance.default_policy.respect_robots = respect;
                tracing::debug!("Override default_policy.respect_robots from env: {}", respect);
            }
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/jobmesh/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "jobmesh", "jobmesh").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Reject values that would make an engine misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.compliance.audit_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "compliance.audit_capacity".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        for policy in
            std::iter::once(&self.compliance.default_policy).chain(&self.compliance.domains)
        {
            if policy.max_requests_per_minute == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("compliance.domains[{}]", policy.domain),
                    reason: "max_requests_per_minute must be at least 1".to_string(),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.correlation.min_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "correlation.min_confidence".to_string(),
                reason: format!("must be within 0.0-1.0, got {}", self.correlation.min_confidence),
            });
        }

        Ok(())
    }
}

/// Rate policy for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPolicy {
    /// Domain the policy applies to (e.g. `linkedin.com`)
    pub domain: String,
    /// Requests allowed within any trailing 60-second window
    pub max_requests_per_minute: u32,
    /// Minimum delay between two requests to the domain
    pub min_delay_ms: u64,
    /// Whether robots.txt is consulted before requesting a path
    #[serde(default = "default_true")]
    pub respect_robots: bool,
}

impl DomainPolicy {
    /// Create a policy for `domain`.
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        max_requests_per_minute: u32,
        min_delay_ms: u64,
        respect_robots: bool,
    ) -> Self {
        Self {
            domain: domain.into(),
            max_requests_per_minute,
            min_delay_ms,
            respect_robots,
        }
    }

    /// The conservative policy applied to domains nobody configured.
    #[must_use]
    pub fn conservative(domain: impl Into<String>) -> Self {
        Self::new(domain, 10, 3000, true)
    }
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::conservative("*")
    }
}

fn default_true() -> bool {
    true
}

/// Compliance engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// User agent sent with robots.txt fetches and matched against robots groups
    pub user_agent: String,
    /// How long a fetched robots.txt rule set stays valid
    pub robots_ttl_secs: u64,
    /// Timeout for a single robots.txt fetch
    pub robots_fetch_timeout_secs: u64,
    /// Maximum number of audit entries kept in memory
    pub audit_capacity: usize,
    /// Policy applied to unknown domains
    pub default_policy: DomainPolicy,
    /// Per-domain overrides layered over the built-in table
    pub domains: Vec<DomainPolicy>,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            user_agent: "JobmeshBot/0.1 (+https://github.com/jobmesh/jobmesh)".to_string(),
            robots_ttl_secs: 3600,
            robots_fetch_timeout_secs: 10,
            audit_capacity: 10_000,
            default_policy: DomainPolicy::default(),
            domains: Vec::new(),
        }
    }
}

/// Scrape orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Ceiling on how long a single adapter may run
    pub adapter_timeout_secs: u64,
    /// Pages each adapter is asked to scrape
    pub max_pages: u32,
    /// Number of boards returned by board recommendation
    pub max_recommended_boards: usize,
    /// Postings newer than this get the recency bonus when ranking
    pub recent_posting_days: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_secs: 30,
            max_pages: 3,
            max_recommended_boards: 10,
            recent_posting_days: 7,
        }
    }
}

/// Cross-source correlation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Matches below this confidence are discarded
    pub min_confidence: f64,
    /// Timeout for one discovery probe
    pub probe_timeout_secs: u64,
    /// HTML search endpoint used as the last discovery strategy
    pub search_endpoint: String,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.25,
            probe_timeout_secs: 10,
            search_endpoint: "https://html.duckduckgo.com/html/".to_string(),
        }
    }
}
