//! Answer module - raw and normalized questionnaire answers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a couple's questionnaire session
///
/// The Data Source is authoritative for these; the pipeline never
/// interprets their contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessId(String);

impl AccessId {
    /// Wrap an access identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccessId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccessId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One of the two people answering a shared questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Respondent {
    /// The "male" respondent
    Primary,
    /// The "female" respondent
    Secondary,
}

impl Respondent {
    /// Get the respondent name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Respondent::Primary => "primary",
            Respondent::Secondary => "secondary",
        }
    }

    /// Interpret a stored respondent label.
    ///
    /// Only "secondary" and "female" (any case) select the secondary
    /// respondent. Every other label, including an empty or unknown one,
    /// falls back to primary.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "secondary" | "female" => Respondent::Secondary,
            _ => Respondent::Primary,
        }
    }
}

impl fmt::Display for Respondent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw answer value, typed once at ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// An integer scale code
    Numeric(i64),
    /// A free-text phrase such as "Strongly Agree"
    Textual(String),
}

impl RawValue {
    /// Classify a stored text value.
    ///
    /// Text that parses as an integer (after trimming) becomes `Numeric`,
    /// everything else stays `Textual`.
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_domain::RawValue;
    ///
    /// assert_eq!(RawValue::parse(" 4 "), RawValue::Numeric(4));
    /// assert_eq!(RawValue::parse("agree"), RawValue::Textual("agree".to_string()));
    /// ```
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<i64>() {
            Ok(v) => RawValue::Numeric(v),
            Err(_) => RawValue::Textual(text.to_string()),
        }
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Numeric(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Textual(s.to_string())
    }
}

/// Position of an answer inside the questionnaire
///
/// Ordering is (category, question, sub-question) ascending, with a missing
/// sub-question sorting before any present one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionKey {
    /// Questionnaire category id
    pub category_id: u32,
    /// Question id
    pub question_id: u32,
    /// Sub-question id, if the question is split
    pub sub_question_id: Option<u32>,
}

impl QuestionKey {
    /// Create a new question key
    pub fn new(category_id: u32, question_id: u32, sub_question_id: Option<u32>) -> Self {
        Self {
            category_id,
            question_id,
            sub_question_id,
        }
    }
}

/// One questionnaire answer as produced by the Data Source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAnswer {
    /// Who answered
    pub respondent: Respondent,
    /// Which question was answered
    pub key: QuestionKey,
    /// The answer as stored
    pub value: RawValue,
}

impl RawAnswer {
    /// Create a new raw answer
    pub fn new(respondent: Respondent, key: QuestionKey, value: impl Into<RawValue>) -> Self {
        Self {
            respondent,
            key,
            value: value.into(),
        }
    }
}

/// A raw answer whose value has been mapped onto the integer scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAnswer {
    /// Who answered
    pub respondent: Respondent,
    /// Which question was answered
    pub key: QuestionKey,
    /// Scale value (1-5 for recognized input; numeric input is not clamped)
    pub value: i64,
}
