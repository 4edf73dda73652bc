//! Response normalization
//!
//! Maps stored answers onto the integer scale. Free text is matched against
//! an ordered list of keyword rules; the first rule whose phrase occurs in
//! the lower-cased text wins. Buckets are tried from level 1 up to level 5,
//! except that a phrase containing a shorter phrase ("strongly agree"
//! contains "agree") is listed before it.

use crate::answer::{NormalizedAnswer, RawAnswer, RawValue};
use crate::layout::NEUTRAL;

/// Keyword rules in priority order
pub const DEFAULT_RULES: &[(&str, i64)] = &[
    ("strongly disagree", 1),
    ("never", 1),
    ("disagree", 2),
    ("rarely", 2),
    ("neutral", 3),
    ("sometimes", 3),
    ("strongly agree", 5),
    ("agree", 4),
    ("often", 4),
    ("always", 5),
];

/// Maps raw answer values to scale values
///
/// # Examples
///
/// ```
/// use concord_domain::{RawValue, ResponseNormalizer};
///
/// let normalizer = ResponseNormalizer::default();
/// assert_eq!(normalizer.normalize(&RawValue::from("Strongly Disagree")), 1);
/// assert_eq!(normalizer.normalize(&RawValue::from("I agree")), 4);
/// assert_eq!(normalizer.normalize(&RawValue::Numeric(2)), 2);
/// assert_eq!(normalizer.normalize(&RawValue::from("no idea")), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    rules: Vec<(String, i64)>,
    fallback: i64,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(NEUTRAL)
    }
}

impl ResponseNormalizer {
    /// Create a normalizer with the default rules and the given fallback
    pub fn new(fallback: i64) -> Self {
        Self {
            rules: DEFAULT_RULES
                .iter()
                .map(|(phrase, level)| (phrase.to_string(), *level))
                .collect(),
            fallback,
        }
    }

    /// Rules in the order they are evaluated
    pub fn rules(&self) -> &[(String, i64)] {
        &self.rules
    }

    /// Normalize a single raw value
    ///
    /// Numeric values pass through unchanged, even outside the scale.
    /// Text that matches no rule yields the fallback value.
    pub fn normalize(&self, value: &RawValue) -> i64 {
        match value {
            RawValue::Numeric(v) => *v,
            RawValue::Textual(text) => self.classify_text(text),
        }
    }

    /// Normalize a full answer, keeping its respondent and position
    pub fn normalize_answer(&self, answer: &RawAnswer) -> NormalizedAnswer {
        NormalizedAnswer {
            respondent: answer.respondent,
            key: answer.key,
            value: self.normalize(&answer.value),
        }
    }

    /// Normalize answers in order
    pub fn normalize_all(&self, answers: &[RawAnswer]) -> Vec<NormalizedAnswer> {
        answers.iter().map(|a| self.normalize_answer(a)).collect()
    }

    fn classify_text(&self, text: &str) -> i64 {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|(phrase, _)| lowered.contains(phrase.as_str()))
            .map(|(_, level)| *level)
            .unwrap_or(self.fallback)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: integers are never re-scaled
        #[test]
        fn test_numeric_identity(v in any::<i64>()) {
            let n = ResponseNormalizer::default();
            prop_assert_eq!(n.normalize(&RawValue::Numeric(v)), v);
        }

        /// Property: text always lands on the 1-5 scale
        #[test]
        fn test_text_in_scale(s in ".*") {
            let n = ResponseNormalizer::default();
            let level = n.normalize(&RawValue::Textual(s));
            prop_assert!((1..=5).contains(&level));
        }
    }
}
