//! Shared types used across jobmesh.
//!
//! [`Posting`] is the common shape every source adapter produces. The core
//! crates only ever read postings; they never mutate one after an adapter
//! hands it over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote-work policy advertised by a posting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    /// Work from anywhere (possibly within a geo restriction)
    FullyRemote,
    /// Part remote, part office
    Hybrid,
    /// Office only
    OnSite,
    /// The source did not say
    #[default]
    Unknown,
}

impl RemotePolicy {
    /// Get a human-readable display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FullyRemote => "Fully Remote",
            Self::Hybrid => "Hybrid",
            Self::OnSite => "On-site",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RemotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A job posting scraped from one source platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Posting {
    /// Identifier unique within the source platform
    pub id: String,
    /// Position title as advertised
    pub title: String,
    /// Hiring company
    pub company: String,
    /// Free-text description (may be empty when only a summary was scraped)
    pub description: String,
    /// Link to the posting
    pub url: String,
    /// Skill and technology tags
    pub skills: Vec<String>,
    /// Country of the position, if stated
    pub country: Option<String>,
    /// City of the position, if stated
    pub city: Option<String>,
    /// Geographic restriction for remote roles (e.g. "EU only", "Europe")
    pub geo_restriction: Option<String>,
    /// Remote-work policy
    pub remote_policy: RemotePolicy,
    /// Lower bound of the advertised yearly salary
    pub salary_min: Option<u32>,
    /// Upper bound of the advertised yearly salary
    pub salary_max: Option<u32>,
    /// ISO currency code of the salary, if known
    pub salary_currency: Option<String>,
    /// When the posting was published
    pub posted_date: Option<DateTime<Utc>>,
    /// Name of the platform the posting was scraped from
    pub source_platform: String,
}

impl Posting {
    /// Create a posting with the identifying fields set and everything else empty.
    #[must_use]
    pub fn new(
        source_platform: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            company: company.into(),
            source_platform: source_platform.into(),
            ..Self::default()
        }
    }

    /// Whether the posting is advertised as fully remote.
    #[must_use]
    pub fn is_fully_remote(&self) -> bool {
        self.remote_policy == RemotePolicy::FullyRemote
    }

    /// Whether `token` appears (case-insensitively) in the skills, title or description.
    ///
    /// `token` must already be lowercase.
    #[must_use]
    pub fn mentions(&self, token: &str) -> bool {
        self.skills.iter().any(|s| s.to_lowercase().contains(token))
            || self.title.to_lowercase().contains(token)
            || self.description.to_lowercase().contains(token)
    }

    /// Whether `token` appears (case-insensitively) in the country or geo restriction.
    ///
    /// `token` must already be lowercase.
    #[must_use]
    pub fn located_in(&self, token: &str) -> bool {
        [&self.country, &self.geo_restriction]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(token))
    }
}
