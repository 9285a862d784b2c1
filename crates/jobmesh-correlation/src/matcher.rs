//! Weighted similarity between postings from different sources.

use jobmesh_core::Posting;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Weight of title similarity in the confidence score.
pub const TITLE_WEIGHT: f64 = 0.45;
/// Weight of skill overlap in the confidence score.
pub const SKILL_WEIGHT: f64 = 0.40;
/// Weight of location compatibility in the confidence score.
pub const LOCATION_WEIGHT: f64 = 0.15;
/// Matches below this confidence are dropped.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.25;

/// Title tokens carrying no identity. Includes gender markers such as "(m/w/d)".
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "for", "in", "at", "to", "with", "m", "f", "w", "d", "x",
    "mwd",
];

/// A candidate posting scored against a source posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionMatch {
    /// Posting from the intermediary source
    pub source_posting: Posting,
    /// Posting from the canonical source
    pub candidate_posting: Posting,
    /// Jaccard index of normalized title tokens
    pub title_similarity: f64,
    /// Jaccard index of lowercased skills
    pub skill_overlap: f64,
    /// Both remote, or same country, or same city
    pub location_compatible: bool,
    /// Weighted sum of the three signals
    pub confidence: f64,
}

/// Scores candidate postings against a source posting.
#[derive(Debug, Clone, Copy)]
pub struct PositionMatcher {
    min_confidence: f64,
}

impl Default for PositionMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl PositionMatcher {
    /// Create a matcher keeping matches at or above `min_confidence`.
    #[must_use]
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Confidence threshold.
    #[must_use]
    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Score one pair regardless of the threshold.
    #[must_use]
    pub fn score(&self, source: &Posting, candidate: &Posting) -> PositionMatch {
        let title_similarity =
            jaccard(&title_tokens(&source.title), &title_tokens(&candidate.title));
        let skill_overlap = jaccard(&skill_set(&source.skills), &skill_set(&candidate.skills));
        let location_compatible = location_compatible(source, candidate);

        let confidence = TITLE_WEIGHT * title_similarity
            + SKILL_WEIGHT * skill_overlap
            + if location_compatible { LOCATION_WEIGHT } else { 0.0 };

        PositionMatch {
            source_posting: source.clone(),
            candidate_posting: candidate.clone(),
            title_similarity,
            skill_overlap,
            location_compatible,
            confidence,
        }
    }

    /// Matches at or above the threshold, highest confidence first.
    #[must_use]
    pub fn match_postings(&self, source: &Posting, candidates: &[Posting]) -> Vec<PositionMatch> {
        let mut matches: Vec<PositionMatch> = candidates
            .iter()
            .map(|candidate| self.score(source, candidate))
            .filter(|m| m.confidence >= self.min_confidence)
            .collect();
        matches.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        matches
    }
}

/// Lowercased alphanumeric title tokens without stop words.
#[must_use]
pub fn title_tokens(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(ToString::to_string)
        .collect()
}

fn skill_set(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Jaccard index; 0 when either set is empty.
#[allow(clippy::cast_precision_loss)]
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

fn location_compatible(a: &Posting, b: &Posting) -> bool {
    if a.is_fully_remote() && b.is_fully_remote() {
        return true;
    }
    same_field(a.country.as_deref(), b.country.as_deref())
        || same_field(a.city.as_deref(), b.city.as_deref())
}

fn same_field(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            let (a, b) = (a.trim(), b.trim());
            !a.is_empty() && a.eq_ignore_ascii_case(b)
        }
        _ => false,
    }
}
