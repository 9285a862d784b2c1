//! Stack, location and salary filters applied to aggregated postings.

use crate::orchestrator::AggregationRequest;
use jobmesh_core::Posting;

/// Location tokens that disable location filtering.
const LOCATION_WILDCARDS: &[&str] = &["*", "anywhere", "worldwide"];

/// Filter pipeline derived from an [`AggregationRequest`].
///
/// Tokens are lowercased once at construction; blank tokens are dropped.
#[derive(Debug, Clone, Default)]
pub struct PostingFilter {
    stacks: Vec<String>,
    locations: Vec<String>,
    min_salary: u32,
}

impl PostingFilter {
    /// Build the filter for a request.
    #[must_use]
    pub fn from_request(request: &AggregationRequest) -> Self {
        let locations = normalize_tokens(&request.preferred_locations);
        let wildcard = locations
            .iter()
            .any(|l| LOCATION_WILDCARDS.contains(&l.as_str()));

        Self {
            stacks: normalize_tokens(&request.preferred_stacks),
            locations: if wildcard { Vec::new() } else { locations },
            min_salary: request.min_salary,
        }
    }

    /// Lowercased stack tokens.
    #[must_use]
    pub fn stacks(&self) -> &[String] {
        &self.stacks
    }

    /// Any preferred stack appears in skills, title or description.
    #[must_use]
    pub fn matches_stack(&self, posting: &Posting) -> bool {
        self.stacks.is_empty() || self.stacks.iter().any(|s| posting.mentions(s))
    }

    /// A preferred location appears in country or geo restriction, or the role is fully remote.
    #[must_use]
    pub fn matches_location(&self, posting: &Posting) -> bool {
        self.locations.is_empty()
            || posting.is_fully_remote()
            || self.locations.iter().any(|l| posting.located_in(l))
    }

    /// Known minimum salary is at least the floor; unknown salaries pass.
    #[must_use]
    pub fn meets_salary(&self, posting: &Posting) -> bool {
        self.min_salary == 0 || posting.salary_min.map_or(true, |min| min >= self.min_salary)
    }

    /// Whether a posting passes every filter.
    #[must_use]
    pub fn matches(&self, posting: &Posting) -> bool {
        self.matches_stack(posting) && self.matches_location(posting) && self.meets_salary(posting)
    }

    /// Postings passing every filter, input order preserved.
    #[must_use]
    pub fn apply(&self, postings: &[Posting]) -> Vec<Posting> {
        postings.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}

fn normalize_tokens(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
