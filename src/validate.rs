//! Input validation for command arguments.
//!
//! Statuses resolve in three tiers: exact match → synonym lookup → error
//! with the closest suggestion. Dates accept `YYYY-MM-DD` or `today`.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// ── Valid value sets (O(1) lookups) ──────────────────────────

pub static VALID_STATUSES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ["active", "paused", "completed"].into_iter().collect());

// ── Synonym maps ─────────────────────────────────────────────

pub static STATUS_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("done", "completed"),
        ("complete", "completed"),
        ("finished", "completed"),
        ("closed", "completed"),
        ("delivered", "completed"),
        ("wip", "active"),
        ("open", "active"),
        ("started", "active"),
        ("ongoing", "active"),
        ("in_progress", "active"),
        ("running", "active"),
        ("hold", "paused"),
        ("on_hold", "paused"),
        ("blocked", "paused"),
        ("suspended", "paused"),
        ("pause", "paused"),
    ]
    .into_iter()
    .collect()
});

/// Normalize a status string via exact match or synonym lookup.
///
/// Returns the canonical status, or an error with the original input
/// and an optional suggestion.
pub fn normalize_status(input: &str) -> Result<&'static str, (String, Option<String>)> {
    let lower = input.trim().to_lowercase().replace(['-', ' '], "_");

    // Tier 1: exact match
    if let Some(&canonical) = VALID_STATUSES.get(lower.as_str()) {
        return Ok(canonical);
    }

    // Tier 2: synonym lookup
    if let Some(&canonical) = STATUS_SYNONYMS.get(lower.as_str()) {
        return Ok(canonical);
    }

    // Tier 3: find closest suggestion
    let suggestion = find_closest_match(&lower, &VALID_STATUSES, &STATUS_SYNONYMS);
    Err((input.to_string(), suggestion))
}

/// Parse a calendar date in `YYYY-MM-DD` form, or the word `today`.
///
/// # Errors
///
/// Returns a message describing the expected format.
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("today") {
        return Ok(today());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{input}', expected YYYY-MM-DD"))
}

/// Today's date in UTC.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Find the closest matching value across valid set and synonyms.
fn find_closest_match(
    input: &str,
    valid: &HashSet<&str>,
    synonyms: &HashMap<&str, &str>,
) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;

    for &v in valid.iter().chain(synonyms.keys()) {
        let dist = levenshtein_distance(input, v);
        if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
            // For synonyms, show what it maps to
            let shown = synonyms.get(v).copied().unwrap_or(v);
            best = Some((shown, dist));
        }
    }

    best.map(|(v, _)| v.to_string())
}

// ── Levenshtein distance ─────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
#[must_use]
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single-row optimization (O(min(m,n)) space)
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1) // deletion
                .min(curr[j - 1] + 1) // insertion
                .min(prev[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_status() {
        assert_eq!(normalize_status("active"), Ok("active"));
        assert_eq!(normalize_status("ACTIVE"), Ok("active"));
        assert_eq!(normalize_status("done"), Ok("completed"));
        assert_eq!(normalize_status("wip"), Ok("active"));
        assert_eq!(normalize_status("on hold"), Ok("paused"));
        assert_eq!(normalize_status("in-progress"), Ok("active"));
        assert!(normalize_status("nonsense").is_err());
    }

    #[test]
    fn test_normalize_status_suggests_typo_fix() {
        let (value, suggestion) = normalize_status("complted").unwrap_err();
        assert_eq!(value, "complted");
        assert_eq!(suggestion.as_deref(), Some("completed"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-02-28"),
            Ok(NaiveDate::from_ymd_opt(2025, 2, 28).unwrap())
        );
        assert_eq!(parse_date("today"), Ok(today()));
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("28/02/2025").is_err());
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "abd"), 1);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }
}
