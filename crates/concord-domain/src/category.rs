//! Category module - the four counseling domains and the versioned
//! question-category map

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Version tag of the built-in category map
pub const DEFAULT_MAP_VERSION: &str = "v1";

/// One of the four fixed counseling domains
///
/// The catalog stores these as "MARRIAGE EXPECTATIONS AND INVENTORY ON X";
/// the short title-cased form is what the classifier reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Marriage And Relationship
    #[serde(rename = "Marriage And Relationship")]
    MarriageAndRelationship,

    /// Responsible Parenthood
    #[serde(rename = "Responsible Parenthood")]
    ResponsibleParenthood,

    /// Planning The Family
    #[serde(rename = "Planning The Family")]
    PlanningTheFamily,

    /// Maternal Neonatal Child Health And Nutrition
    #[serde(rename = "Maternal Neonatal Child Health And Nutrition")]
    MaternalChildHealth,
}

impl Category {
    /// All categories in their canonical order
    pub const ALL: [Category; 4] = [
        Category::MarriageAndRelationship,
        Category::ResponsibleParenthood,
        Category::PlanningTheFamily,
        Category::MaternalChildHealth,
    ];

    /// Display name as reported by the classifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MarriageAndRelationship => "Marriage And Relationship",
            Category::ResponsibleParenthood => "Responsible Parenthood",
            Category::PlanningTheFamily => "Planning The Family",
            Category::MaternalChildHealth => "Maternal Neonatal Child Health And Nutrition",
        }
    }

    /// Parse a short category name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
    }

    /// Parse either the short name or the long catalog label
    ///
    /// # Examples
    ///
    /// ```
    /// use concord_domain::Category;
    ///
    /// assert_eq!(
    ///     Category::from_label("MARRIAGE EXPECTATIONS AND INVENTORY ON RESPONSIBLE PARENTHOOD"),
    ///     Some(Category::ResponsibleParenthood)
    /// );
    /// assert_eq!(Category::from_label("planning the family"), Some(Category::PlanningTheFamily));
    /// assert_eq!(Category::from_label("Finances"), None);
    /// ```
    pub fn from_label(label: &str) -> Option<Self> {
        Self::parse(&short_name(label))
    }

    /// Position in the relational block (0-3)
    pub fn index(&self) -> usize {
        match self {
            Category::MarriageAndRelationship => 0,
            Category::ResponsibleParenthood => 1,
            Category::PlanningTheFamily => 2,
            Category::MaternalChildHealth => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Reduce a catalog label to its title-cased short form
///
/// Takes the text after the first " ON " when present, otherwise the whole
/// label, and capitalizes each word.
pub fn short_name(label: &str) -> String {
    let upper = label.to_ascii_uppercase();
    let tail = match upper.find(" ON ") {
        Some(pos) => &label[pos + 4..],
        None => label,
    };
    title_case(tail.trim())
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One row of the category map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Questionnaire category id
    pub category_id: u32,
    /// Domain the id belongs to
    pub category: Category,
}

/// Versioned mapping from questionnaire category id to counseling domain
///
/// Drives the four category-level alignment scores. Ids absent from the map
/// contribute to no category.
///
/// In TOML:
///
/// ```toml
/// version = "v1"
///
/// [[entries]]
/// category_id = 1
/// category = "Marriage And Relationship"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    /// Version tag recorded alongside computed features
    pub version: String,

    /// category_id -> domain rows
    pub entries: Vec<CategoryEntry>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        let entries = Category::ALL
            .into_iter()
            .enumerate()
            .map(|(i, category)| CategoryEntry {
                category_id: i as u32 + 1,
                category,
            })
            .collect();
        Self {
            version: DEFAULT_MAP_VERSION.to_string(),
            entries,
        }
    }
}

impl CategoryMap {
    /// Domain for a questionnaire category id
    pub fn category_of(&self, category_id: u32) -> Option<Category> {
        self.entries
            .iter()
            .find(|e| e.category_id == category_id)
            .map(|e| e.category)
    }

    /// Questionnaire category ids mapped to a domain
    pub fn ids_for(&self, category: Category) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|e| e.category == category)
            .map(|e| e.category_id)
            .collect()
    }

    /// Validate the map
    ///
    /// The version must be non-empty and no category id may appear twice.
    pub fn validate(&self) -> Result<(), String> {
        if self.version.trim().is_empty() {
            return Err("category map version must not be empty".to_string());
        }
        let mut seen = BTreeSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.category_id) {
                return Err(format!(
                    "category id {} mapped more than once",
                    entry.category_id
                ));
            }
        }
        Ok(())
    }
}
