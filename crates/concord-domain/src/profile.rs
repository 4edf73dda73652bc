//! Profile module - respondent profiles, couple records and demographics

use crate::answer::{AccessId, RawAnswer};
use crate::mapping::{education_level, income_level};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Civil status as recorded at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CivilStatus {
    /// Never married
    Single,
    /// Cohabiting without marriage
    #[serde(rename = "Living In")]
    LivingIn,
    /// Separated
    Separated,
    /// Divorced
    Divorced,
    /// Widowed
    Widowed,
    /// Already married
    Married,
    /// Anything else
    Other,
}

impl CivilStatus {
    /// Get the status label as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            CivilStatus::Single => "Single",
            CivilStatus::LivingIn => "Living In",
            CivilStatus::Separated => "Separated",
            CivilStatus::Divorced => "Divorced",
            CivilStatus::Widowed => "Widowed",
            CivilStatus::Married => "Married",
            CivilStatus::Other => "Other",
        }
    }

    /// Parse a stored label (case-insensitive, "living-in" and "livein" accepted)
    ///
    /// Blank text yields `None`; any other unrecognized label is `Other`.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        let status = match key.as_str() {
            "" => return None,
            "single" => CivilStatus::Single,
            "livingin" | "livein" => CivilStatus::LivingIn,
            "separated" => CivilStatus::Separated,
            "divorced" => CivilStatus::Divorced,
            "widowed" | "widow" | "widower" => CivilStatus::Widowed,
            "married" => CivilStatus::Married,
            _ => CivilStatus::Other,
        };
        Some(status)
    }

    /// Whether the status reflects an earlier relationship that has ended
    pub fn is_previous_relationship(&self) -> bool {
        matches!(
            self,
            CivilStatus::Separated | CivilStatus::Divorced | CivilStatus::Widowed
        )
    }
}

impl fmt::Display for CivilStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration details of one respondent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespondentProfile {
    /// Display name
    pub name: String,
    /// Sex label as entered ("male"/"female")
    pub sex: String,
    /// Age in years
    pub age: u32,
    /// Civil status text as entered
    pub civil_status: String,
    /// Years living together, if reported
    pub years_living_together: u32,
    /// Whether the respondent has children from before
    pub past_children: bool,
    /// Number of children, if reported
    pub children: u32,
    /// Highest education attained, free text
    pub education: String,
    /// Monthly income bracket, free text
    pub income: String,
}

/// Everything the Data Source knows about one couple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoupleRecord {
    /// Access identifier for the questionnaire session
    pub access_id: AccessId,
    /// Primary ("male") respondent's profile
    pub primary: Option<RespondentProfile>,
    /// Secondary ("female") respondent's profile
    pub secondary: Option<RespondentProfile>,
    /// Answers ordered by (category, question, sub-question)
    #[serde(default)]
    pub answers: Vec<RawAnswer>,
}

impl CoupleRecord {
    /// Create an empty record
    pub fn new(access_id: AccessId) -> Self {
        Self {
            access_id,
            primary: None,
            secondary: None,
            answers: Vec::new(),
        }
    }
}

/// Couple-level demographics feeding the demographic block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    /// Primary respondent's age
    pub male_age: u32,
    /// Secondary respondent's age
    pub female_age: u32,
    /// Shared civil status
    pub civil_status: CivilStatus,
    /// Years living together; 0 unless living in
    pub years_living_together: u32,
    /// Whether either respondent has children from before
    pub past_children: bool,
    /// Number of children; 0 without past children
    pub children: u32,
    /// Education level 0-4
    pub education_level: i64,
    /// Income level 0-3
    pub income_level: i64,
}

impl Demographics {
    /// Derive couple demographics from both profiles
    ///
    /// Civil status comes from the primary profile, or the secondary's when
    /// the primary's is blank. Counts and levels take the larger of the two
    /// values. Years living together only counts for couples living in, and
    /// children only counts when past children are reported.
    pub fn from_profiles(primary: &RespondentProfile, secondary: &RespondentProfile) -> Self {
        let civil_status = CivilStatus::parse(&primary.civil_status)
            .or_else(|| CivilStatus::parse(&secondary.civil_status))
            .unwrap_or(CivilStatus::Single);

        let past_children = primary.past_children || secondary.past_children;

        let years_living_together = if civil_status == CivilStatus::LivingIn {
            primary
                .years_living_together
                .max(secondary.years_living_together)
        } else {
            0
        };

        let children = if past_children {
            primary.children.max(secondary.children)
        } else {
            0
        };

        Self {
            male_age: primary.age,
            female_age: secondary.age,
            civil_status,
            years_living_together,
            past_children,
            children,
            education_level: education_level(&primary.education)
                .max(education_level(&secondary.education)),
            income_level: income_level(&primary.income).max(income_level(&secondary.income)),
        }
    }

    /// Absolute age difference in years
    pub fn age_gap(&self) -> u32 {
        self.male_age.abs_diff(self.female_age)
    }

    /// Absolute gap between education and income levels
    pub fn education_income_gap(&self) -> i64 {
        (self.education_level - self.income_level).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(age: u32, status: &str) -> RespondentProfile {
        RespondentProfile {
            name: "Test".to_string(),
            age,
            civil_status: status.to_string(),
            education: "College Graduate".to_string(),
            income: "10,000-20,000".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_civil_status_parse() {
        assert_eq!(CivilStatus::parse("living in"), Some(CivilStatus::LivingIn));
        assert_eq!(CivilStatus::parse("Living-In"), Some(CivilStatus::LivingIn));
        assert_eq!(CivilStatus::parse("SINGLE"), Some(CivilStatus::Single));
        assert_eq!(CivilStatus::parse("complicated"), Some(CivilStatus::Other));
        assert_eq!(CivilStatus::parse("  "), None);
    }

    #[test]
    fn test_years_zeroed_unless_living_in() {
        let mut a = profile(30, "Single");
        a.years_living_together = 4;
        let b = profile(28, "Single");
        assert_eq!(Demographics::from_profiles(&a, &b).years_living_together, 0);

        a.civil_status = "Living In".to_string();
        let d = Demographics::from_profiles(&a, &b);
        assert_eq!(d.civil_status, CivilStatus::LivingIn);
        assert_eq!(d.years_living_together, 4);
    }

    #[test]
    fn test_children_require_past_children() {
        let mut a = profile(30, "Single");
        a.children = 2;
        let mut b = profile(28, "Single");
        assert_eq!(Demographics::from_profiles(&a, &b).children, 0);

        b.past_children = true;
        let d = Demographics::from_profiles(&a, &b);
        assert!(d.past_children);
        assert_eq!(d.children, 2);
    }

    #[test]
    fn test_status_falls_back_to_secondary() {
        let a = profile(30, "");
        let b = profile(28, "Divorced");
        let d = Demographics::from_profiles(&a, &b);
        assert_eq!(d.civil_status, CivilStatus::Divorced);
        assert!(d.civil_status.is_previous_relationship());
    }

    #[test]
    fn test_levels_take_higher() {
        let a = profile(30, "Single");
        let mut b = profile(41, "Single");
        b.education = "Doctorate".to_string();
        b.income = "Below 10,000".to_string();
        let d = Demographics::from_profiles(&a, &b);
        assert_eq!(d.education_level, 4);
        assert_eq!(d.income_level, 1);
        assert_eq!(d.age_gap(), 11);
        assert_eq!(d.education_income_gap(), 3);
    }
}
