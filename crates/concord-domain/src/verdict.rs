//! Verdict module - classifier requests and the verdicts returned for them

use crate::answer::AccessId;
use crate::assembler::FeatureVector;
use crate::category::Category;
use crate::profile::Demographics;
use crate::relational::RelationalFeatures;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Overall relationship risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Preventive counseling
    Low,
    /// Proactive counseling
    Medium,
    /// Intensive counseling
    High,
}

impl RiskLevel {
    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Parse a level name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid risk level: {}", s))
    }
}

/// Counseling priority of a focus category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Score at or below 0.3
    Low,
    /// Score in (0.3, 0.6]
    Moderate,
    /// Score above 0.6
    High,
}

impl Priority {
    /// Band a category score into a priority
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            Priority::High
        } else if score > 0.3 {
            Priority::Moderate
        } else {
            Priority::Low
        }
    }

    /// Get the priority name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Moderate => "Moderate",
            Priority::High => "High",
        }
    }
}

/// A category the couple should focus on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusCategory {
    /// Category name as reported
    pub name: String,
    /// Need score in [0, 1]
    pub score: f64,
    /// Priority band
    pub priority: Priority,
}

impl FocusCategory {
    /// Create a focus category with its priority derived from the score
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
            priority: Priority::from_score(score),
        }
    }
}

/// The Classifier Service's judgment for one couple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Overall risk
    pub risk_level: RiskLevel,

    /// Classifier confidence in [0, 1]
    #[serde(alias = "ml_confidence")]
    pub confidence: f64,

    /// Category name -> need score
    #[serde(default)]
    pub category_scores: BTreeMap<String, f64>,

    /// Categories ordered by descending score
    #[serde(default)]
    pub focus_categories: Vec<FocusCategory>,

    /// Counseling recommendations in presentation order
    #[serde(default)]
    pub recommendations: Vec<String>,

    /// Name of the analysis method
    #[serde(alias = "analysis_method", default)]
    pub method: String,

    /// Why the risk level was assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_reasoning: Option<String>,

    /// Why the focus categories were chosen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counseling_reasoning: Option<String>,
}

impl Verdict {
    /// Fixed categories that received no score
    ///
    /// Names outside the fixed set are ignored rather than reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_domain::{Category, RiskLevel, Verdict};
    /// use std::collections::BTreeMap;
    ///
    /// let mut scores = BTreeMap::new();
    /// scores.insert("Marriage And Relationship".to_string(), 0.7);
    /// scores.insert("Finances".to_string(), 0.2);
    ///
    /// let verdict = Verdict {
    ///     risk_level: RiskLevel::Medium,
    ///     confidence: 0.8,
    ///     category_scores: scores,
    ///     focus_categories: vec![],
    ///     recommendations: vec![],
    ///     method: "test".to_string(),
    ///     risk_reasoning: None,
    ///     counseling_reasoning: None,
    /// };
    ///
    /// assert_eq!(verdict.unpredicted_categories().len(), 3);
    /// assert!(!verdict.unpredicted_categories().contains(&Category::MarriageAndRelationship));
    /// ```
    pub fn unpredicted_categories(&self) -> Vec<Category> {
        let predicted: BTreeSet<Category> = self
            .category_scores
            .keys()
            .filter_map(|name| Category::from_label(name))
            .collect();
        Category::ALL
            .into_iter()
            .filter(|c| !predicted.contains(c))
            .collect()
    }

    /// Whether both narrative fields are present
    pub fn has_narrative(&self) -> bool {
        self.risk_reasoning.is_some() && self.counseling_reasoning.is_some()
    }
}

/// Non-numeric context sent along with the feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Couple's access id
    pub couple_id: AccessId,
    /// Primary respondent's name
    pub male_name: String,
    /// Secondary respondent's name
    pub female_name: String,
    /// Derived demographics
    #[serde(flatten)]
    pub demographics: Demographics,
    /// Primary respondent's scale values
    pub male_responses: Vec<i64>,
    /// Secondary respondent's scale values
    pub female_responses: Vec<i64>,
    /// Combined response block as sent in the vector
    pub questionnaire_responses: Vec<i64>,
    /// Relational metrics
    pub personalized_features: RelationalFeatures,
    /// Version of the category map used for category alignments
    pub category_map_version: String,
}

/// Everything submitted to the Classifier Service for one couple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// The assembled feature vector
    pub feature_vector: FeatureVector,
    /// Narrative context
    #[serde(flatten)]
    pub context: RequestContext,
}
