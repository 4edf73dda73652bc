//! Respondent splitting
//!
//! Partitions normalized answers into the primary and secondary
//! respondents' sequences plus the combined sequence.

use crate::answer::{NormalizedAnswer, Respondent};

/// The three answer sequences derived for one couple
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RespondentSequences {
    /// Primary respondent's answers, in retrieval order
    pub primary: Vec<NormalizedAnswer>,
    /// Secondary respondent's answers, in retrieval order
    pub secondary: Vec<NormalizedAnswer>,
    /// All answers, in retrieval order
    pub combined: Vec<NormalizedAnswer>,
}

impl RespondentSequences {
    /// Split answers by respondent
    ///
    /// Ordering within each sequence is the order the answers were given in.
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_domain::{NormalizedAnswer, QuestionKey, Respondent, RespondentSequences};
    ///
    /// let answer = |respondent, q, value| NormalizedAnswer {
    ///     respondent,
    ///     key: QuestionKey::new(1, q, None),
    ///     value,
    /// };
    /// let answers = vec![
    ///     answer(Respondent::Primary, 1, 4),
    ///     answer(Respondent::Secondary, 1, 2),
    ///     answer(Respondent::Primary, 2, 5),
    /// ];
    ///
    /// let split = RespondentSequences::split(&answers);
    /// assert_eq!(split.primary_values(), vec![4, 5]);
    /// assert_eq!(split.secondary_values(), vec![2]);
    /// assert_eq!(split.combined_values(), vec![4, 2, 5]);
    /// ```
    pub fn split(answers: &[NormalizedAnswer]) -> Self {
        let mut sequences = Self {
            combined: answers.to_vec(),
            ..Default::default()
        };

        for answer in answers {
            match answer.respondent {
                Respondent::Primary => sequences.primary.push(*answer),
                Respondent::Secondary => sequences.secondary.push(*answer),
            }
        }

        sequences
    }

    /// Re-split the combined sequence at its midpoint
    ///
    /// Used when the stored answers do not distinguish the two respondents:
    /// the first half is taken as primary and the second half as secondary.
    /// With fewer than two answers both sides get the whole sequence.
    pub fn split_at_midpoint(answers: &[NormalizedAnswer]) -> Self {
        if answers.len() < 2 {
            return Self {
                primary: answers.to_vec(),
                secondary: answers.to_vec(),
                combined: answers.to_vec(),
            };
        }

        let mid = answers.len() / 2;
        Self {
            primary: answers[..mid].to_vec(),
            secondary: answers[mid..].to_vec(),
            combined: answers.to_vec(),
        }
    }

    /// Whether either respondent has no answers
    pub fn is_one_sided(&self) -> bool {
        self.primary.is_empty() || self.secondary.is_empty()
    }

    /// Primary respondent's scale values
    pub fn primary_values(&self) -> Vec<i64> {
        values(&self.primary)
    }

    /// Secondary respondent's scale values
    pub fn secondary_values(&self) -> Vec<i64> {
        values(&self.secondary)
    }

    /// Combined scale values
    pub fn combined_values(&self) -> Vec<i64> {
        values(&self.combined)
    }

    /// Values of one respondent restricted to the given category ids
    pub fn values_in(&self, respondent: Respondent, category_ids: &[u32]) -> Vec<i64> {
        let source = match respondent {
            Respondent::Primary => &self.primary,
            Respondent::Secondary => &self.secondary,
        };
        source
            .iter()
            .filter(|a| category_ids.contains(&a.key.category_id))
            .map(|a| a.value)
            .collect()
    }
}

fn values(answers: &[NormalizedAnswer]) -> Vec<i64> {
    answers.iter().map(|a| a.value).collect()
}
