//! Feature layout - the constants that shape every feature vector
//!
//! The classifier is trained against one fixed vector shape
//! (11 demographic + 59 response + 12 relational = 82 values). Keeping the
//! numbers in a single structure makes that layout auditable in one place.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of demographic values at the front of the vector
pub const DEMOGRAPHIC_LEN: usize = 11;

/// Number of relational values at the tail of the vector
pub const RELATIONAL_LEN: usize = 12;

/// Default length of the padded/truncated response block
pub const RESPONSE_BLOCK_LEN: usize = 59;

/// Vector length the classifier is trained on
pub const VECTOR_LEN: usize = DEMOGRAPHIC_LEN + RESPONSE_BLOCK_LEN + RELATIONAL_LEN;

/// Neutral answer on the 1-5 scale
pub const NEUTRAL: i64 = 3;

/// Shape and default values of the assembled feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayout {
    /// Value substituted wherever an answer is missing
    #[serde(default = "default_neutral")]
    pub neutral: i64,

    /// Lowest value on the answer scale
    #[serde(default = "default_scale_min")]
    pub scale_min: i64,

    /// Highest value on the answer scale
    #[serde(default = "default_scale_max")]
    pub scale_max: i64,

    /// Length of the combined-response block
    ///
    /// Any value other than 59 changes the vector length away from
    /// [`VECTOR_LEN`]; the classifier must be retrained for the new shape.
    #[serde(default = "default_response_block_len")]
    pub response_block_len: usize,
}

fn default_neutral() -> i64 {
    NEUTRAL
}

fn default_scale_min() -> i64 {
    1
}

fn default_scale_max() -> i64 {
    5
}

fn default_response_block_len() -> usize {
    RESPONSE_BLOCK_LEN
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self {
            neutral: NEUTRAL,
            scale_min: 1,
            scale_max: 5,
            response_block_len: RESPONSE_BLOCK_LEN,
        }
    }
}

impl FeatureLayout {
    /// Total length of an assembled vector
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_domain::FeatureLayout;
    ///
    /// assert_eq!(FeatureLayout::default().vector_len(), 82);
    /// ```
    pub fn vector_len(&self) -> usize {
        DEMOGRAPHIC_LEN + self.response_block_len + RELATIONAL_LEN
    }

    /// Whether vectors have the length the classifier is trained on
    pub fn is_standard(&self) -> bool {
        self.vector_len() == VECTOR_LEN
    }

    /// Offset of the first response value
    pub fn response_offset(&self) -> usize {
        DEMOGRAPHIC_LEN
    }

    /// Offset of the first relational value
    pub fn relational_offset(&self) -> usize {
        DEMOGRAPHIC_LEN + self.response_block_len
    }

    /// Neutral value as a float
    pub fn neutral_f64(&self) -> f64 {
        self.neutral as f64
    }

    /// Largest possible population variance on the scale
    ///
    /// For 1-5 this is 4.0: half the answers at each end.
    pub fn max_variance(&self) -> f64 {
        let half_range = (self.scale_max - self.scale_min) as f64 / 2.0;
        half_range * half_range
    }

    /// Largest possible absolute difference between two answers
    pub fn max_difference(&self) -> f64 {
        (self.scale_max - self.scale_min) as f64
    }

    /// Validate the layout
    pub fn validate(&self) -> Result<(), String> {
        if self.scale_min >= self.scale_max {
            return Err(format!(
                "scale_min {} must be below scale_max {}",
                self.scale_min, self.scale_max
            ));
        }
        if self.neutral < self.scale_min || self.neutral > self.scale_max {
            return Err(format!(
                "neutral {} outside scale [{}, {}]",
                self.neutral, self.scale_min, self.scale_max
            ));
        }
        if self.response_block_len == 0 {
            return Err("response_block_len must be greater than 0".to_string());
        }
        if !self.is_standard() {
            warn!(
                vector_len = self.vector_len(),
                expected = VECTOR_LEN,
                "Feature layout differs from the trained vector length; the classifier must be retrained"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = FeatureLayout::default();
        assert_eq!(layout.vector_len(), 82);
        assert_eq!(VECTOR_LEN, 82);
        assert!(layout.is_standard());
        assert_eq!(layout.response_offset(), 11);
        assert_eq!(layout.relational_offset(), 70);
        assert_eq!(layout.max_variance(), 4.0);
        assert_eq!(layout.max_difference(), 4.0);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_invalid_neutral() {
        let layout = FeatureLayout {
            neutral: 7,
            ..Default::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_empty_response_block() {
        let layout = FeatureLayout {
            response_block_len: 0,
            ..Default::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_resized_response_block_is_flagged() {
        let layout = FeatureLayout {
            response_block_len: 31,
            ..Default::default()
        };
        // Allowed, but no longer the trained shape
        assert!(layout.validate().is_ok());
        assert!(!layout.is_standard());
        assert_eq!(layout.vector_len(), 54);
    }
}
