//! Salary string parsing shared by source adapters.
//!
//! Job boards advertise pay as free text ("€60k - €80k", "$120,000",
//! "50000-70000 PLN"). Adapters call [`parse_salary`] to turn that into the
//! numeric bounds carried on a [`crate::Posting`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Amounts below this are hourly/daily rates or noise, not yearly salaries.
const MIN_YEARLY_AMOUNT: f64 = 1000.0;

/// Amounts above this are almost certainly parse accidents.
const MAX_YEARLY_AMOUNT: f64 = 10_000_000.0;

/// A parsed salary range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    /// Lower bound
    pub min: u32,
    /// Upper bound (equal to `min` for a single figure)
    pub max: u32,
    /// ISO currency code, if a symbol or code was present
    pub currency: Option<String>,
}

/// Parse a free-text salary into a range.
///
/// Returns `None` when no plausible yearly amount is found.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_salary(text: &str) -> Option<SalaryRange> {
    static AMOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = AMOUNT_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,3}(?:[.,]\d{3})+|\d+(?:\.\d+)?)\s?(k\b)?").expect("valid regex")
    });

    let amounts: Vec<u32> = regex
        .captures_iter(text)
        .filter_map(|caps| {
            let raw = caps.get(1)?.as_str();
            let grouped = raw.len() > 4
                && raw
                    .chars()
                    .rev()
                    .nth(3)
                    .is_some_and(|c| c == '.' || c == ',');
            let mut value: f64 = if grouped {
                raw.replace(['.', ','], "").parse().ok()?
            } else {
                raw.parse().ok()?
            };
            if caps.get(2).is_some() {
                value *= 1000.0;
            }
            (MIN_YEARLY_AMOUNT..=MAX_YEARLY_AMOUNT)
                .contains(&value)
                .then(|| value.round() as u32)
        })
        .collect();

    let min = amounts.iter().copied().min()?;
    let max = amounts.iter().copied().max()?;

    Some(SalaryRange {
        min,
        max,
        currency: detect_currency(text),
    })
}

fn detect_currency(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let code = if lower.contains('€') || lower.contains("eur") {
        "EUR"
    } else if lower.contains('£') || lower.contains("gbp") {
        "GBP"
    } else if lower.contains("chf") {
        "CHF"
    } else if lower.contains("pln") || lower.contains("zł") {
        "PLN"
    } else if lower.contains("sek") {
        "SEK"
    } else if lower.contains('$') || lower.contains("usd") {
        "USD"
    } else {
        return None;
    };
    Some(code.to_string())
}
