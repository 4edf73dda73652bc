//! Feature vector assembly
//!
//! Concatenates the demographic, response and relational blocks into the
//! fixed-length vector the classifier expects. The length never depends on
//! how many answers a couple gave.

use crate::answer::Respondent;
use crate::category::{Category, CategoryMap};
use crate::layout::{FeatureLayout, DEMOGRAPHIC_LEN, RELATIONAL_LEN};
use crate::profile::{CivilStatus, Demographics};
use crate::relational::{align, ratio_at_least, ratio_at_most, RelationalFeatures};
use crate::splitter::RespondentSequences;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Answers at or above this value count as agreement
pub const AGREE_THRESHOLD: i64 = 4;

/// Answers at or below this value count as disagreement
pub const DISAGREE_THRESHOLD: i64 = 2;

/// Names of the demographic block entries, in vector order
pub const DEMOGRAPHIC_FEATURES: [&str; DEMOGRAPHIC_LEN] = [
    "male_age",
    "female_age",
    "age_gap",
    "years_living_together",
    "children",
    "education_level",
    "income_level",
    "education_income_gap",
    "is_single",
    "is_living_in",
    "is_separated_or_divorced",
];

/// Names of the relational block entries, in vector order
pub const RELATIONAL_FEATURES: [&str; RELATIONAL_LEN] = [
    "alignment_score",
    "conflict_ratio",
    "male_avg_response",
    "female_avg_response",
    "marriage_alignment",
    "parenthood_alignment",
    "family_planning_alignment",
    "maternal_health_alignment",
    "male_agree_ratio",
    "male_disagree_ratio",
    "female_agree_ratio",
    "female_disagree_ratio",
];

/// Assembled feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All values in order
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The leading demographic block
    pub fn demographic_block(&self) -> &[f64] {
        &self.0[..DEMOGRAPHIC_LEN.min(self.0.len())]
    }

    /// The combined-response block
    pub fn response_block(&self) -> &[f64] {
        let end = self.0.len().saturating_sub(RELATIONAL_LEN);
        &self.0[DEMOGRAPHIC_LEN.min(end)..end]
    }

    /// The trailing relational block
    pub fn relational_block(&self) -> &[f64] {
        &self.0[self.0.len().saturating_sub(RELATIONAL_LEN)..]
    }

    /// Consume into the underlying values
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Builds feature vectors for a given layout and category map
#[derive(Debug, Clone, Default)]
pub struct FeatureAssembler {
    layout: FeatureLayout,
    category_map: CategoryMap,
}

impl FeatureAssembler {
    /// Create an assembler
    pub fn new(layout: FeatureLayout, category_map: CategoryMap) -> Self {
        Self {
            layout,
            category_map,
        }
    }

    /// Layout in use
    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Category map in use
    pub fn category_map(&self) -> &CategoryMap {
        &self.category_map
    }

    /// Assemble the full vector
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_domain::{
    ///     Demographics, FeatureAssembler, RelationalFeatures, RespondentProfile,
    ///     RespondentSequences,
    /// };
    ///
    /// let assembler = FeatureAssembler::default();
    /// let demographics = Demographics::from_profiles(
    ///     &RespondentProfile::default(),
    ///     &RespondentProfile::default(),
    /// );
    /// let sequences = RespondentSequences::default();
    /// let relational = RelationalFeatures::compute(&[], &[], &[], assembler.layout());
    ///
    /// let vector = assembler.assemble(&demographics, &sequences, &relational);
    /// assert_eq!(vector.len(), 82);
    /// assert!(vector.response_block().iter().all(|&v| v == 3.0));
    /// ```
    pub fn assemble(
        &self,
        demographics: &Demographics,
        sequences: &RespondentSequences,
        relational: &RelationalFeatures,
    ) -> FeatureVector {
        let mut values = Vec::with_capacity(self.layout.vector_len());

        values.extend(self.demographic_block(demographics));
        values.extend(self.response_block(&sequences.combined_values()));
        values.extend(self.relational_block(sequences, relational));

        debug!(
            len = values.len(),
            responses = sequences.combined.len(),
            "Assembled feature vector"
        );

        FeatureVector(values)
    }

    /// The 11 demographic values
    pub fn demographic_block(&self, d: &Demographics) -> [f64; DEMOGRAPHIC_LEN] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            d.male_age as f64,
            d.female_age as f64,
            d.age_gap() as f64,
            d.years_living_together as f64,
            d.children as f64,
            d.education_level as f64,
            d.income_level as f64,
            d.education_income_gap() as f64,
            flag(d.civil_status == CivilStatus::Single),
            flag(d.civil_status == CivilStatus::LivingIn),
            flag(matches!(
                d.civil_status,
                CivilStatus::Separated | CivilStatus::Divorced
            )),
        ]
    }

    /// Combined values truncated or right-padded with neutral
    pub fn response_block(&self, combined: &[i64]) -> Vec<f64> {
        let len = self.layout.response_block_len;
        combined
            .iter()
            .map(|&v| v as f64)
            .chain(std::iter::repeat(self.layout.neutral_f64()))
            .take(len)
            .collect()
    }

    /// Alignment restricted to one counseling domain
    pub fn category_alignment(&self, sequences: &RespondentSequences, category: Category) -> f64 {
        let ids = self.category_map.ids_for(category);
        let primary = sequences.values_in(Respondent::Primary, &ids);
        let secondary = sequences.values_in(Respondent::Secondary, &ids);
        align(&primary, &secondary, &self.layout).score
    }

    /// The 12 relational values
    pub fn relational_block(
        &self,
        sequences: &RespondentSequences,
        relational: &RelationalFeatures,
    ) -> [f64; RELATIONAL_LEN] {
        let primary = sequences.primary_values();
        let secondary = sequences.secondary_values();

        let mut block = [0.0; RELATIONAL_LEN];
        block[0] = relational.alignment_score;
        block[1] = relational.conflict_ratio;
        block[2] = relational.male_avg_response;
        block[3] = relational.female_avg_response;
        for category in Category::ALL {
            block[4 + category.index()] = self.category_alignment(sequences, category);
        }
        block[8] = ratio_at_least(&primary, AGREE_THRESHOLD);
        block[9] = ratio_at_most(&primary, DISAGREE_THRESHOLD);
        block[10] = ratio_at_least(&secondary, AGREE_THRESHOLD);
        block[11] = ratio_at_most(&secondary, DISAGREE_THRESHOLD);
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{NormalizedAnswer, QuestionKey};
    use crate::profile::RespondentProfile;

    fn answer(respondent: Respondent, category: u32, question: u32, value: i64) -> NormalizedAnswer {
        NormalizedAnswer {
            respondent,
            key: QuestionKey::new(category, question, None),
            value,
        }
    }

    fn demographics() -> Demographics {
        let male = RespondentProfile {
            age: 32,
            civil_status: "Living In".to_string(),
            years_living_together: 3,
            education: "College Graduate".to_string(),
            income: "Below 10,000".to_string(),
            ..Default::default()
        };
        let female = RespondentProfile {
            age: 27,
            education: "High School".to_string(),
            income: "Below 10,000".to_string(),
            ..Default::default()
        };
        Demographics::from_profiles(&male, &female)
    }

    fn sequences(n: usize) -> RespondentSequences {
        let answers: Vec<_> = (0..n)
            .map(|i| {
                let respondent = if i % 2 == 0 {
                    Respondent::Primary
                } else {
                    Respondent::Secondary
                };
                answer(respondent, (i % 4) as u32 + 1, i as u32, (i % 5) as i64 + 1)
            })
            .collect();
        RespondentSequences::split(&answers)
    }

    fn assemble(n: usize) -> FeatureVector {
        let assembler = FeatureAssembler::default();
        let seq = sequences(n);
        let rel = RelationalFeatures::compute(
            &seq.primary_values(),
            &seq.secondary_values(),
            &seq.combined_values(),
            assembler.layout(),
        );
        assembler.assemble(&demographics(), &seq, &rel)
    }

    #[test]
    fn test_length_is_invariant() {
        for n in [0, 10, 59, 200] {
            assert_eq!(assemble(n).len(), 82, "length for {} responses", n);
        }
    }

    #[test]
    fn test_empty_responses_pad_with_neutral() {
        let v = assemble(0);
        assert_eq!(v.response_block(), &[3.0; 59][..]);
    }

    #[test]
    fn test_long_responses_truncate() {
        let assembler = FeatureAssembler::default();
        let combined: Vec<i64> = (0..100).map(|i| i % 5 + 1).collect();
        let block = assembler.response_block(&combined);
        assert_eq!(block.len(), 59);
        let expected: Vec<f64> = combined[..59].iter().map(|&v| v as f64).collect();
        assert_eq!(block, expected);
    }

    #[test]
    fn test_demographic_block() {
        let v = assemble(0);
        let d = v.demographic_block();
        assert_eq!(d.len(), 11);
        assert_eq!(&d[..8], &[32.0, 27.0, 5.0, 3.0, 0.0, 3.0, 0.0, 3.0]);
        // living in
        assert_eq!(&d[8..], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_relational_block_order() {
        let assembler = FeatureAssembler::default();
        let answers = vec![
            answer(Respondent::Primary, 1, 1, 5),
            answer(Respondent::Primary, 2, 1, 1),
            answer(Respondent::Secondary, 1, 1, 5),
            answer(Respondent::Secondary, 2, 1, 5),
        ];
        let seq = RespondentSequences::split(&answers);
        let rel = RelationalFeatures::compute(
            &seq.primary_values(),
            &seq.secondary_values(),
            &seq.combined_values(),
            assembler.layout(),
        );
        let block = assembler.relational_block(&seq, &rel);

        assert_eq!(block[0], rel.alignment_score);
        assert_eq!(block[1], rel.conflict_ratio);
        assert_eq!(block[2], 3.0);
        assert_eq!(block[3], 5.0);
        // category 1 agrees, category 2 is maximally apart, 3 and 4 are unanswered
        assert_eq!(&block[4..8], &[1.0, 0.0, 0.5, 0.5]);
        assert_eq!(&block[8..], &[0.5, 0.5, 1.0, 0.0]);
    }

    #[test]
    fn test_ratios_zero_without_answers() {
        let v = assemble(0);
        let r = v.relational_block();
        assert_eq!(&r[8..], &[0.0, 0.0, 0.0, 0.0]);
    }
}
