//! Posting relevance scoring.

use chrono::{DateTime, Duration, Utc};
use jobmesh_core::Posting;
use std::cmp::Reverse;

/// Bonus for fully remote roles.
pub const REMOTE_BONUS: i64 = 50;
/// Bonus for postings published within the recency window.
pub const RECENT_BONUS: i64 = 20;
/// Bonus per preferred stack the posting mentions.
pub const STACK_MATCH_BONUS: i64 = 10;

/// Scores postings relative to a fixed point in time.
#[derive(Debug, Clone)]
pub struct Ranker<'a> {
    stacks: &'a [String],
    now: DateTime<Utc>,
    recent_window: Duration,
}

impl<'a> Ranker<'a> {
    /// `stacks` must already be lowercase.
    #[must_use]
    pub fn new(stacks: &'a [String], now: DateTime<Utc>, recent_days: i64) -> Self {
        Self {
            stacks,
            now,
            recent_window: Duration::days(recent_days),
        }
    }

    /// `50 if remote + salary_min / 1000 + 20 if recent + 10 per stack match`.
    #[must_use]
    pub fn score(&self, posting: &Posting) -> i64 {
        let mut score = 0;

        if posting.is_fully_remote() {
            score += REMOTE_BONUS;
        }
        if let Some(min) = posting.salary_min {
            score += i64::from(min / 1000);
        }
        if posting
            .posted_date
            .is_some_and(|posted| self.now.signed_duration_since(posted) <= self.recent_window)
        {
            score += RECENT_BONUS;
        }

        let stack_matches = self.stacks.iter().filter(|s| posting.mentions(s)).count();
        score + STACK_MATCH_BONUS * i64::try_from(stack_matches).unwrap_or_default()
    }

    /// Sort descending by score; equal scores keep input order.
    #[must_use]
    pub fn rank(&self, mut postings: Vec<Posting>) -> Vec<Posting> {
        postings.sort_by_cached_key(|p| Reverse(self.score(p)));
        postings
    }
}
