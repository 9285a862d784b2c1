//! Job board catalog and board recommendation.
//!
//! A board's score for a request is its base priority plus affinity bonuses
//! that only apply when the request's locations or stacks match one of the
//! configured [`PreferenceTags`].

use crate::error::{AggregateError, Result};
use crate::loader::BoardLoader;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Static description of a job board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardProfile {
    /// Display name
    pub name: String,
    /// Landing page
    pub url: String,
    /// Base importance, 1-10
    pub priority: u8,
    /// How well the board covers the tagged stacks, 0-10
    pub stack_affinity: u8,
    /// How well the board covers the tagged locations, 0-10
    pub locale_affinity: u8,
}

impl BoardProfile {
    /// Create a board profile.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        priority: u8,
        stack_affinity: u8,
        locale_affinity: u8,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            priority,
            stack_affinity,
            locale_affinity,
        }
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AggregateError::InvalidBoard {
                board: self.name.clone(),
                reason: "board name cannot be empty".to_string(),
            });
        }

        if self.url.trim().is_empty() {
            return Err(AggregateError::InvalidBoard {
                board: self.name.clone(),
                reason: "board URL cannot be empty".to_string(),
            });
        }

        if !(1..=10).contains(&self.priority) {
            return Err(AggregateError::InvalidBoard {
                board: self.name.clone(),
                reason: format!("priority must be 1-10, got {}", self.priority),
            });
        }

        for (field, value) in [
            ("stack_affinity", self.stack_affinity),
            ("locale_affinity", self.locale_affinity),
        ] {
            if value > 10 {
                return Err(AggregateError::InvalidBoard {
                    board: self.name.clone(),
                    reason: format!("{field} must be 0-10, got {value}"),
                });
            }
        }

        Ok(())
    }

    /// Score this board against a request.
    #[must_use]
    pub fn score(&self, locale_match: bool, stack_match: bool) -> u32 {
        let mut score = u32::from(self.priority) * 10;
        if locale_match {
            score += u32::from(self.locale_affinity) * 2;
        }
        if stack_match {
            score += u32::from(self.stack_affinity) * 2;
        }
        score
    }
}

/// Tags deciding which request attributes trigger affinity bonuses.
///
/// Matching is a case-insensitive substring test of each request token
/// against each tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceTags {
    /// Tags marking a location as European
    pub eu_locations: Vec<String>,
    /// Tags marking a stack as .NET
    pub dotnet_stacks: Vec<String>,
}

impl PreferenceTags {
    /// Whether any of `locations` matches a locale tag.
    #[must_use]
    pub fn matches_locale(&self, locations: &[String]) -> bool {
        any_tagged(locations, &self.eu_locations)
    }

    /// Whether any of `stacks` matches a stack tag.
    #[must_use]
    pub fn matches_stack(&self, stacks: &[String]) -> bool {
        any_tagged(stacks, &self.dotnet_stacks)
    }
}

impl Default for PreferenceTags {
    fn default() -> Self {
        const EU: &[&str] = &[
            "europe", "emea", "eu", "germany", "deutschland", "austria", "switzerland",
            "netherlands", "belgium", "france", "spain", "portugal", "italy", "ireland",
            "poland", "czech", "sweden", "denmark", "norway", "finland", "estonia", "latvia",
            "lithuania", "romania", "bulgaria", "greece", "croatia", "slovenia", "slovakia",
            "hungary", "luxembourg", "united kingdom", "uk", "berlin", "munich", "hamburg",
            "frankfurt", "cologne", "vienna", "zurich", "amsterdam", "paris", "madrid",
            "barcelona", "lisbon", "dublin", "warsaw", "krakow", "prague", "stockholm",
            "copenhagen", "london",
        ];
        const DOTNET: &[&str] = &[".net", "dotnet", "c#", "csharp", "asp.net", "blazor", "f#"];

        Self {
            eu_locations: EU.iter().map(ToString::to_string).collect(),
            dotnet_stacks: DOTNET.iter().map(ToString::to_string).collect(),
        }
    }
}

fn any_tagged(tokens: &[String], tags: &[String]) -> bool {
    tokens.iter().any(|token| {
        let token = token.trim().to_lowercase();
        !token.is_empty()
            && tags.iter().any(|tag| {
                let tag = tag.to_lowercase();
                // Short tags like "eu" or "uk" must match a whole word.
                if tag.len() <= 2 && tag.chars().all(char::is_alphanumeric) {
                    token
                        .split(|c: char| !c.is_alphanumeric())
                        .any(|word| word == tag)
                } else {
                    token.contains(&tag)
                }
            })
    })
}

const BUILTIN_BOARDS: &[(&str, &str, u8, u8, u8)] = &[
    ("LinkedIn", "https://www.linkedin.com/jobs", 9, 6, 7),
    ("Indeed", "https://www.indeed.com", 8, 5, 6),
    ("StepStone", "https://www.stepstone.de", 8, 6, 10),
    ("Xing", "https://www.xing.com/jobs", 6, 5, 9),
    ("Arbeitnow", "https://www.arbeitnow.com", 7, 5, 10),
    ("RemoteOK", "https://remoteok.com", 8, 4, 4),
    ("WeWorkRemotely", "https://weworkremotely.com", 8, 4, 4),
    ("Remotive", "https://remotive.com", 7, 4, 5),
    ("Himalayas", "https://himalayas.app", 7, 4, 6),
    ("Jobicy", "https://jobicy.com", 6, 4, 6),
    ("WorkingNomads", "https://www.workingnomads.com", 5, 3, 5),
    ("JustJoinIT", "https://justjoin.it", 6, 6, 9),
    ("NoFluffJobs", "https://nofluffjobs.com", 6, 6, 9),
    ("LandingJobs", "https://landing.jobs", 6, 5, 9),
    ("Glassdoor", "https://www.glassdoor.com", 6, 4, 5),
    ("EuroDotnetJobs", "https://www.eurodotnetjobs.com", 5, 10, 10),
    ("DotnetJobs", "https://dotnetjobs.net", 4, 10, 4),
    ("EuroRemoteJobs", "https://euremotejobs.com", 5, 4, 10),
];

/// The set of boards considered for recommendation.
#[derive(Debug, Clone)]
pub struct BoardCatalog {
    boards: Vec<BoardProfile>,
    tags: PreferenceTags,
    limit: usize,
}

impl BoardCatalog {
    /// Default number of boards returned by [`recommended_boards`](Self::recommended_boards).
    pub const DEFAULT_LIMIT: usize = 10;

    /// Create a catalog from explicit boards.
    #[must_use]
    pub fn new(boards: Vec<BoardProfile>) -> Self {
        Self {
            boards,
            tags: PreferenceTags::default(),
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// The built-in board list.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_BOARDS
                .iter()
                .map(|&(name, url, priority, stack, locale)| {
                    BoardProfile::new(name, url, priority, stack, locale)
                })
                .collect(),
        )
    }

    /// The built-in list extended (or overridden, by name) with boards from disk.
    pub fn builtin_with(loader: &BoardLoader) -> Result<Self> {
        let mut catalog = Self::builtin();
        for board in loader.load_all()? {
            catalog.insert(board)?;
        }
        info!(count = catalog.len(), "loaded board catalog");
        Ok(catalog)
    }

    /// Replace the preference tags.
    #[must_use]
    pub fn with_tags(mut self, tags: PreferenceTags) -> Self {
        self.tags = tags;
        self
    }

    /// Set how many boards a recommendation returns.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Add a board, replacing any board with the same name.
    pub fn insert(&mut self, board: BoardProfile) -> Result<()> {
        board.validate()?;

        if let Some(existing) = self
            .boards
            .iter_mut()
            .find(|b| b.name.eq_ignore_ascii_case(&board.name))
        {
            debug!(board = %board.name, "replacing board definition");
            *existing = board;
        } else {
            debug!(board = %board.name, "adding board definition");
            self.boards.push(board);
        }
        Ok(())
    }

    /// All boards in catalog order.
    #[must_use]
    pub fn boards(&self) -> &[BoardProfile] {
        &self.boards
    }

    /// The tags used for scoring.
    #[must_use]
    pub fn tags(&self) -> &PreferenceTags {
        &self.tags
    }

    /// Number of boards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Whether the catalog has no boards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// The highest scoring boards for a request, best first.
    ///
    /// Equal scores keep catalog order.
    #[must_use]
    pub fn recommended_boards(&self, locations: &[String], stacks: &[String]) -> Vec<BoardProfile> {
        let locale_match = self.tags.matches_locale(locations);
        let stack_match = self.tags.matches_stack(stacks);

        let mut scored: Vec<(u32, &BoardProfile)> = self
            .boards
            .iter()
            .map(|board| (board.score(locale_match, stack_match), board))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(self.limit)
            .map(|(_, board)| board.clone())
            .collect()
    }
}

impl Default for BoardCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
