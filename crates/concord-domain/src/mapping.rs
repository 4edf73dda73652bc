//! Categorical mappings for demographic text fields
//!
//! Education and income arrive as free text from registration forms. Each
//! mapping has an explicit default branch for unrecognized input, which is
//! logged rather than silently coerced.

use tracing::warn;

/// Highest education level
pub const MAX_EDUCATION_LEVEL: i64 = 4;

/// Level assigned to unrecognized education text
pub const DEFAULT_EDUCATION_LEVEL: i64 = 2;

/// Highest income level
pub const MAX_INCOME_LEVEL: i64 = 3;

/// Level assigned to unrecognized income text
pub const DEFAULT_INCOME_LEVEL: i64 = 1;

/// Map education text to an ordinal level in 0..=4
///
/// Integer text already in range is taken as the level.
///
/// # Examples
///
/// ```
/// use concord_domain::mapping::education_level;
///
/// assert_eq!(education_level("High School Graduate"), 1);
/// assert_eq!(education_level("College Graduate"), 3);
/// assert_eq!(education_level("Master's Degree"), 4);
/// assert_eq!(education_level("3"), 3);
/// assert_eq!(education_level("unknown"), 2);
/// ```
pub fn education_level(text: &str) -> i64 {
    if let Some(level) = in_range(text, MAX_EDUCATION_LEVEL) {
        return level;
    }

    let t = text.trim().to_lowercase();
    let level = if t.is_empty() {
        None
    } else if ["post", "master", "doctor", "phd"].iter().any(|k| t.contains(k)) {
        Some(4)
    } else if t.contains("college") && t.contains("grad") && !t.contains("under") {
        Some(3)
    } else if ["vocational", "college", "undergrad", "technical"]
        .iter()
        .any(|k| t.contains(k))
    {
        Some(2)
    } else if t.contains("high school") || t.contains("secondary") {
        Some(1)
    } else if ["none", "no formal", "elementary", "primary"]
        .iter()
        .any(|k| t.contains(k))
    {
        Some(0)
    } else {
        None
    };

    level.unwrap_or_else(|| {
        warn!(value = text, "Unrecognized education level, using default");
        DEFAULT_EDUCATION_LEVEL
    })
}

/// Map an income bracket to an ordinal level in 0..=3
///
/// Brackets are read by their lower bound: below 10,000 is 0, up to 20,000
/// is 1, up to 40,000 is 2, anything higher is 3. Integer text in range is
/// taken as the level.
///
/// # Examples
///
/// ```
/// use concord_domain::mapping::income_level;
///
/// assert_eq!(income_level("Below 10,000"), 0);
/// assert_eq!(income_level("10,000 - 20,000"), 1);
/// assert_eq!(income_level("20,001-40,000"), 2);
/// assert_eq!(income_level("Above 40,000"), 3);
/// assert_eq!(income_level("n/a"), 1);
/// ```
pub fn income_level(text: &str) -> i64 {
    if let Some(level) = in_range(text, MAX_INCOME_LEVEL) {
        return level;
    }

    let t = text.trim().to_lowercase();
    let amounts = amounts(&t);

    let level = if ["below", "less than", "under"].iter().any(|k| t.contains(k)) {
        Some(0)
    } else if ["above", "over", "more than"].iter().any(|k| t.contains(k)) {
        Some(MAX_INCOME_LEVEL)
    } else {
        amounts.first().map(|&low| bracket_of(low))
    };

    level.unwrap_or_else(|| {
        warn!(value = text, "Unrecognized income bracket, using default");
        DEFAULT_INCOME_LEVEL
    })
}

fn bracket_of(lower_bound: u64) -> i64 {
    match lower_bound {
        0..=9_999 => 0,
        10_000..=20_000 => 1,
        20_001..=40_000 => 2,
        _ => 3,
    }
}

/// Integer text within 0..=max
fn in_range(text: &str, max: i64) -> Option<i64> {
    text.trim()
        .parse::<i64>()
        .ok()
        .filter(|v| (0..=max).contains(v))
}

/// Numbers appearing in the text, ignoring thousands separators
fn amounts(text: &str) -> Vec<u64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    cleaned
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
