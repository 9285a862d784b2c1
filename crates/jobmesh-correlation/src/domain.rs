//! Company name normalization and careers-page URL candidates.

use crate::error::{CorrelationError, Result};

/// Trailing words dropped from a company name before building a domain.
const CORPORATE_SUFFIXES: &[&str] = &[
    "ab", "ag", "as", "bv", "co", "company", "corp", "corporation", "gmbh", "group", "holding",
    "holdings", "inc", "incorporated", "kg", "kgaa", "limited", "llc", "llp", "ltd", "nv", "oy",
    "plc", "pty", "sa", "sarl", "sas", "se", "solutions", "spa", "technologies", "technology",
    "ug",
];

/// Path suffixes commonly hosting a careers page.
pub const CAREER_PATHS: &[&str] = &[
    "/careers",
    "/jobs",
    "/career",
    "/karriere",
    "/en/careers",
    "/company/careers",
    "/about/careers",
    "/join-us",
];

/// Applicant tracking systems and their public board URL templates.
///
/// `{slug}` is replaced with [`company_slug`].
pub const ATS_TEMPLATES: &[(&str, &str)] = &[
    ("Greenhouse", "https://boards.greenhouse.io/{slug}"),
    ("Lever", "https://jobs.lever.co/{slug}"),
    ("Workable", "https://apply.workable.com/{slug}/"),
    ("Ashby", "https://jobs.ashbyhq.com/{slug}"),
    ("SmartRecruiters", "https://careers.smartrecruiters.com/{slug}"),
    ("Recruitee", "https://{slug}.recruitee.com"),
    ("Personio", "https://{slug}.jobs.personio.de"),
    ("BambooHR", "https://{slug}.bamboohr.com/careers"),
];

/// How a candidate URL was derived.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DiscoveryStrategy {
    /// A careers path on the company's guessed domain
    CompanyDomain,
    /// A `careers.` or `jobs.` subdomain
    CareersSubdomain,
    /// A hosted applicant tracking board
    ApplicantTracking {
        /// Provider name, e.g. "Greenhouse"
        provider: String,
    },
    /// A web search result
    Search,
}

/// Lowercased name tokens with corporate suffixes removed.
fn name_tokens(entity_name: &str) -> Vec<String> {
    let folded: String = entity_name
        .to_lowercase()
        .chars()
        .flat_map(|c| match c {
            'ä' => vec!['a', 'e'],
            'ö' => vec!['o', 'e'],
            'ü' => vec!['u', 'e'],
            'ß' => vec!['s', 's'],
            'é' | 'è' | 'ê' => vec!['e'],
            'á' | 'à' | 'â' => vec!['a'],
            c => vec![c],
        })
        .collect();

    // "&" joins words ("AT&T", "Procter & Gamble") rather than separating tokens.
    let mut tokens: Vec<String> = folded
        .replace('&', "")
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect();

    while tokens.len() > 1
        && tokens
            .last()
            .is_some_and(|t| CORPORATE_SUFFIXES.contains(&t.as_str()))
    {
        tokens.pop();
    }
    tokens
}

/// Guess a company's domain: `"Acme Technologies Inc."` -> `"acme.com"`.
pub fn normalize_domain_name(entity_name: &str) -> Result<String> {
    Ok(format!("{}.com", company_slug(entity_name)?))
}

/// Compact slug used in ATS URLs: `"Red Hat, Inc."` -> `"redhat"`.
pub fn company_slug(entity_name: &str) -> Result<String> {
    let slug = name_tokens(entity_name).concat();
    if slug.is_empty() {
        return Err(CorrelationError::InvalidEntityName(entity_name.to_string()));
    }
    Ok(slug)
}

/// Hyphenated slug variant: `"Red Hat, Inc."` -> `"red-hat"`.
#[must_use]
pub fn hyphenated_slug(entity_name: &str) -> Option<String> {
    let tokens = name_tokens(entity_name);
    (tokens.len() > 1).then(|| tokens.join("-"))
}

/// Every URL probed by the cheap discovery strategies, in probe order.
pub fn candidate_urls(entity_name: &str) -> Result<Vec<(DiscoveryStrategy, String)>> {
    let slug = company_slug(entity_name)?;
    let domain = format!("{slug}.com");
    let mut candidates = Vec::new();

    for path in CAREER_PATHS {
        for host in [format!("www.{domain}"), domain.clone()] {
            candidates.push((DiscoveryStrategy::CompanyDomain, format!("https://{host}{path}")));
        }
    }

    for sub in ["careers", "jobs"] {
        candidates.push((
            DiscoveryStrategy::CareersSubdomain,
            format!("https://{sub}.{domain}"),
        ));
    }

    let mut slugs = vec![slug];
    slugs.extend(hyphenated_slug(entity_name));
    for (provider, template) in ATS_TEMPLATES {
        for slug in &slugs {
            candidates.push((
                DiscoveryStrategy::ApplicantTracking {
                    provider: (*provider).to_string(),
                },
                template.replace("{slug}", slug),
            ));
        }
    }

    Ok(candidates)
}
