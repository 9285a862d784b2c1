//! robots.txt parsing and path resolution.
//!
//! Only the groups addressed to `*` or to our own agent token are honored.
//! When a group names our agent, the wildcard groups are ignored entirely.
//! Resolution is longest-prefix-wins; an Allow and a Disallow of the same
//! length resolve to allowed.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// A single Allow/Disallow line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsRule {
    /// Path prefix the rule applies to
    pub path_prefix: String,
    /// `true` for `Disallow`, `false` for `Allow`
    pub is_disallow: bool,
}

/// Rules that apply to our agent for one origin.
///
/// An empty rule set allows everything. It is the cached result for a
/// missing, unreachable or unparseable robots.txt.
#[derive(Debug, Clone)]
pub struct RobotsRuleSet {
    rules: Vec<RobotsRule>,
    crawl_delay: Option<Duration>,
    fetched_at: Instant,
}

impl RobotsRuleSet {
    /// The allow-all rule set.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            rules: Vec::new(),
            crawl_delay: None,
            fetched_at: Instant::now(),
        }
    }

    /// Parse robots.txt content for the given user agent.
    #[must_use]
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let agent = agent_token(user_agent);
        let mut groups: Vec<Group> = Vec::new();
        let mut collecting_agents = false;

        for raw_line in content.lines() {
            let line = raw_line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !collecting_agents {
                        groups.push(Group::default());
                        collecting_agents = true;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                }
                "allow" | "disallow" => {
                    collecting_agents = false;
                    let Some(group) = groups.last_mut() else {
                        continue;
                    };
                    if value.is_empty() {
                        continue;
                    }
                    group.rules.push(RobotsRule {
                        path_prefix: value.to_string(),
                        is_disallow: key == "disallow",
                    });
                }
                "crawl-delay" => {
                    collecting_agents = false;
                    if let (Some(group), Ok(secs)) = (groups.last_mut(), value.parse::<f64>()) {
                        if secs.is_finite() && secs >= 0.0 {
                            group.crawl_delay = Some(Duration::from_secs_f64(secs));
                        }
                    }
                }
                _ => {}
            }
        }

        let (specific, wildcard): (Vec<&Group>, Vec<&Group>) = groups
            .iter()
            .filter(|g| g.applies_to(&agent))
            .partition(|g| g.names_agent(&agent));
        let chosen = if specific.is_empty() { wildcard } else { specific };

        Self {
            rules: chosen.iter().flat_map(|g| g.rules.iter().cloned()).collect(),
            crawl_delay: chosen.iter().filter_map(|g| g.crawl_delay).max(),
            fetched_at: Instant::now(),
        }
    }

    /// Whether `path` may be requested.
    ///
    /// The longest matching prefix decides; no match means allowed.
    #[must_use]
    pub fn is_allowed(&self, path: &str) -> bool {
        let path = if path.is_empty() { "/" } else { path };

        self.rules
            .iter()
            .filter(|rule| path.starts_with(rule.path_prefix.as_str()))
            .max_by(|a, b| {
                a.path_prefix
                    .len()
                    .cmp(&b.path_prefix.len())
                    // Equal length: prefer Allow (false sorts before true, so reverse).
                    .then_with(|| b.is_disallow.cmp(&a.is_disallow))
            })
            .map_or(true, |rule| !rule.is_disallow)
    }

    /// Whether the rule set was fetched less than `ttl` before `now`.
    #[must_use]
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }

    /// Rules applying to our agent, in file order.
    #[must_use]
    pub fn rules(&self) -> &[RobotsRule] {
        &self.rules
    }

    /// `Crawl-delay` requested for our agent, if any.
    #[must_use]
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }

    /// Whether the set allows everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<RobotsRule>,
    crawl_delay: Option<Duration>,
}

impl Group {
    fn applies_to(&self, agent: &str) -> bool {
        self.agents.iter().any(|a| a == "*") || self.names_agent(agent)
    }

    fn names_agent(&self, agent: &str) -> bool {
        !agent.is_empty() && self.agents.iter().any(|a| agent_token(a) == agent)
    }
}

/// Product token of a user agent string: `JobmeshBot/0.1 (+url)` -> `jobmeshbot`.
fn agent_token(user_agent: &str) -> String {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
