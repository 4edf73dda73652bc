//! Relational feature computation
//!
//! Derives the couple-level dynamics metrics from the two respondents'
//! answer sequences. Every function here is total: empty or uneven input
//! yields documented neutral defaults rather than an error.

use crate::layout::FeatureLayout;
use serde::{Deserialize, Serialize};

/// Alignment reported when there are no paired answers to compare
pub const NEUTRAL_ALIGNMENT: f64 = 0.5;

/// Minimum answer difference counted as a conflict
pub const CONFLICT_THRESHOLD: i64 = 2;

/// The relationship-dynamics metrics for one couple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationalFeatures {
    /// Mean per-question agreement, [0, 1]
    pub alignment_score: f64,
    /// Fraction of paired questions in conflict, [0, 1]
    pub conflict_ratio: f64,
    /// Primary respondent's mean answer
    pub male_avg_response: f64,
    /// Secondary respondent's mean answer
    pub female_avg_response: f64,
    /// Primary respondent's inverse-variance consistency, [0, 1]
    pub male_consistency: f64,
    /// Secondary respondent's inverse-variance consistency, [0, 1]
    pub female_consistency: f64,
    /// Ratio of primary to secondary mean; 1.0 is balance
    pub power_balance: f64,
    /// Population variance of all answers
    pub response_variance: f64,
    /// Number of paired questions in conflict
    pub total_conflicts: usize,
}

/// Outcome of comparing two index-paired sequences
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    /// Mean agreement, or 0.5 with no pairs
    pub score: f64,
    /// Number of pairs differing by at least two points
    pub conflicts: usize,
    /// Number of pairs compared
    pub pairs: usize,
}

impl Alignment {
    /// Conflicts as a fraction of compared pairs (0 with no pairs)
    pub fn conflict_ratio(&self) -> f64 {
        if self.pairs == 0 {
            0.0
        } else {
            self.conflicts as f64 / self.pairs as f64
        }
    }
}

/// Compare two sequences index by index up to the shorter length
///
/// # Examples
///
/// ```
/// use concord_domain::relational::align;
/// use concord_domain::FeatureLayout;
///
/// let result = align(&[4, 2], &[4, 5], &FeatureLayout::default());
/// assert_eq!(result.pairs, 2);
/// assert_eq!(result.conflicts, 1);
/// assert!((result.score - 0.625).abs() < 1e-9);
/// ```
pub fn align(primary: &[i64], secondary: &[i64], layout: &FeatureLayout) -> Alignment {
    let pairs = primary.len().min(secondary.len());
    let max_diff = layout.max_difference();

    let mut sum = 0.0;
    let mut conflicts = 0;

    for i in 0..pairs {
        let p = primary.get(i).copied().unwrap_or(layout.neutral);
        let s = secondary.get(i).copied().unwrap_or(layout.neutral);
        let diff = (p - s).abs();

        sum += (max_diff - diff as f64) / max_diff;
        if diff >= CONFLICT_THRESHOLD {
            conflicts += 1;
        }
    }

    let score = if pairs > 0 {
        sum / pairs as f64
    } else {
        NEUTRAL_ALIGNMENT
    };

    Alignment {
        score,
        conflicts,
        pairs,
    }
}

/// Arithmetic mean, or `None` for an empty slice
pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

/// Population variance (mean squared deviation), or `None` for an empty slice
pub fn population_variance(values: &[i64]) -> Option<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum();
    Some(sum_sq / values.len() as f64)
}

/// Inverse-variance consistency of one respondent's answers
///
/// Fewer than two answers count as fully consistent. Otherwise the variance
/// is normalized by the largest possible variance on the scale and floored
/// at zero.
///
/// # Examples
///
/// ```
/// use concord_domain::relational::consistency;
/// use concord_domain::FeatureLayout;
///
/// let layout = FeatureLayout::default();
/// assert_eq!(consistency(&[], &layout), 1.0);
/// assert_eq!(consistency(&[3], &layout), 1.0);
/// assert_eq!(consistency(&[1, 5], &layout), 0.0);
/// ```
pub fn consistency(values: &[i64], layout: &FeatureLayout) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }
    let variance = population_variance(values).unwrap_or(0.0);
    (1.0 - variance / layout.max_variance()).max(0.0)
}

/// Fraction of answers at or above `threshold` (0 when empty)
pub fn ratio_at_least(values: &[i64], threshold: i64) -> f64 {
    fraction(values, |v| v >= threshold)
}

/// Fraction of answers at or below `threshold` (0 when empty)
pub fn ratio_at_most(values: &[i64], threshold: i64) -> f64 {
    fraction(values, |v| v <= threshold)
}

fn fraction(values: &[i64], pred: impl Fn(i64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| pred(v)).count() as f64 / values.len() as f64
}

impl RelationalFeatures {
    /// Compute all relational metrics
    ///
    /// # Arguments
    /// * `primary` - Primary respondent's answers
    /// * `secondary` - Secondary respondent's answers
    /// * `combined` - Both respondents' answers in retrieval order
    /// * `layout` - Scale and neutral defaults
    pub fn compute(
        primary: &[i64],
        secondary: &[i64],
        combined: &[i64],
        layout: &FeatureLayout,
    ) -> Self {
        let alignment = align(primary, secondary, layout);

        let male_avg = mean(primary).unwrap_or(layout.neutral_f64());
        let female_avg = mean(secondary).unwrap_or(layout.neutral_f64());

        // A zero secondary mean is reported as balance; the two cases are
        // indistinguishable downstream.
        let power_balance = if female_avg > 0.0 {
            male_avg / female_avg
        } else {
            1.0
        };

        let response_variance = if combined.len() < 2 {
            0.0
        } else {
            population_variance(combined).unwrap_or(0.0)
        };

        Self {
            alignment_score: alignment.score,
            conflict_ratio: alignment.conflict_ratio(),
            male_avg_response: male_avg,
            female_avg_response: female_avg,
            male_consistency: consistency(primary, layout),
            female_consistency: consistency(secondary, layout),
            power_balance,
            response_variance,
            total_conflicts: alignment.conflicts,
        }
    }
}
