//! Configuration for pipeline runs
//!
//! Defines batch concurrency, the feature layout and the category map.

use crate::PipelineError;
use concord_domain::{CategoryMap, FeatureLayout};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the pipeline orchestrator
///
/// # Examples
///
/// ```
/// use concord_pipeline::PipelineConfig;
///
/// // Default configuration
/// let config = PipelineConfig::default();
/// assert_eq!(config.max_concurrency, 4);
/// assert_eq!(config.layout.vector_len(), 82);
///
/// // One couple at a time
/// let config = PipelineConfig::sequential();
/// assert_eq!(config.max_concurrency, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of couples classified at once in a batch
    /// Default: 4
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Split the combined answers at their midpoint when one respondent
    /// has no answers of their own
    /// Default: false
    #[serde(default)]
    pub midpoint_fallback: bool,

    /// Fill in reasoning and recommendations the classifier left out
    /// Default: true
    #[serde(default = "default_complete_narrative")]
    pub complete_narrative: bool,

    /// Seconds between batches in watch mode
    /// Default: 60
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,

    /// Shape of the feature vector
    #[serde(default)]
    pub layout: FeatureLayout,

    /// Question-category to counseling-domain map
    #[serde(default)]
    pub category_map: CategoryMap,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_complete_narrative() -> bool {
    true
}

fn default_watch_interval_secs() -> u64 {
    60
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            midpoint_fallback: false,
            complete_narrative: true,
            watch_interval_secs: default_watch_interval_secs(),
            layout: FeatureLayout::default(),
            category_map: CategoryMap::default(),
        }
    }
}

impl PipelineConfig {
    /// Process one couple at a time
    ///
    /// Suitable when the classifier cannot take concurrent requests.
    pub fn sequential() -> Self {
        Self {
            max_concurrency: 1,
            ..Default::default()
        }
    }

    /// Get the watch interval as Duration
    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_concurrency == 0 {
            return Err(PipelineError::Config(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }
        if self.watch_interval_secs == 0 {
            return Err(PipelineError::Config(
                "watch_interval_secs must be greater than 0".to_string(),
            ));
        }
        self.layout.validate().map_err(PipelineError::Config)?;
        self.category_map.validate().map_err(PipelineError::Config)?;
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self, PipelineError> {
        let config: Self =
            toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_domain::Category;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrency, 4);
        assert!(!config.midpoint_fallback);
        assert!(config.complete_narrative);
        assert_eq!(config.watch_interval(), Duration::from_secs(60));
        assert_eq!(config.category_map.version, "v1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sequential_config() {
        let config = PipelineConfig::sequential();
        assert_eq!(config.max_concurrency, 1);
        assert!(config.max_concurrency < PipelineConfig::default().max_concurrency);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = PipelineConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PipelineConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml() {
        let text = r#"
            max_concurrency = 8
            midpoint_fallback = true

            [layout]
            response_block_len = 31

            [category_map]
            version = "v2"

            [[category_map.entries]]
            category_id = 10
            category = "Planning The Family"
        "#;
        let config = PipelineConfig::from_toml(text).unwrap();
        assert_eq!(config.max_concurrency, 8);
        assert!(config.midpoint_fallback);
        assert_eq!(config.layout.response_block_len, 31);
        assert!(!config.layout.is_standard());
        assert_eq!(config.layout.neutral, 3);
        assert_eq!(config.category_map.version, "v2");
        assert_eq!(
            config.category_map.category_of(10),
            Some(Category::PlanningTheFamily)
        );
    }

    #[test]
    fn test_invalid_layout_in_toml() {
        let text = "[layout]\nneutral = 9\n";
        assert!(PipelineConfig::from_toml(text).is_err());
    }
}
