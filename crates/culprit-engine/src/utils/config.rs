//! Engine configuration and constants.
//!
//! Loaded from TOML. Every table rejects unknown keys.

use crate::classifier::{ComponentClassifierConfig, ProjectClassifierConfig};
use crate::feature::min_distance::DEFAULT_MAX_DISTANCE;
use crate::feature::top_frame_index::DEFAULT_MAX_FRAME_INDEX;
use crate::filters::{FilterLessLikelySuspects, RobotAuthorFilter, DEFAULT_ROBOT_AUTHOR_PATTERNS};
use crate::utils::error::ConfigError;
use crate::weight::MetaWeight;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Weights below this are treated as zero
pub const DEFAULT_EPSILON: f64 = 1e-5;

pub const DEFAULT_CONFIDENCE_RATIO: f64 = 0.5;

pub const DEFAULT_TOP_N_SUSPECTS: usize = 7;

/// Revision the ignore-list is read at when none is configured
pub const DEFAULT_IGNORE_LIST_REVISION: &str = "master";

/// Weights used when a config carries none.
///
/// Only the crashed-file features: the directory, component and IDF
/// features need classifier or index data that a bare config lacks.
pub fn default_weights() -> MetaWeight {
    MetaWeight::default().with(
        "TouchCrashedFileMeta",
        MetaWeight::default()
            .with("MinDistance", 2.0)
            .with("TopFrameIndex", 1.0)
            .with("TouchCrashedFile", 1.0),
    )
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_max_distance() -> f64 {
    DEFAULT_MAX_DISTANCE
}

fn default_max_frame_index() -> f64 {
    DEFAULT_MAX_FRAME_INDEX
}

fn default_true() -> bool {
    true
}

fn default_confidence_ratio() -> f64 {
    DEFAULT_CONFIDENCE_RATIO
}

fn default_robot_author_patterns() -> Vec<String> {
    DEFAULT_ROBOT_AUTHOR_PATTERNS
        .iter()
        .map(|pattern| pattern.to_string())
        .collect()
}

fn default_top_n_suspects() -> usize {
    DEFAULT_TOP_N_SUSPECTS
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Trained weights, shaped like the feature tree
    #[serde(default = "default_weights")]
    pub weights: MetaWeight,

    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    /// Suspects reported after filtering
    #[serde(default = "default_top_n_suspects")]
    pub top_n_suspects: usize,

    /// Scoring threads, 0 lets the pool decide
    #[serde(default)]
    pub workers: usize,

    #[serde(default)]
    pub project_classifier: Option<ProjectClassifierConfig>,

    #[serde(default)]
    pub component_classifier: Option<ComponentClassifierConfig>,
}

/// Feature parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureConfig {
    /// Line distance mapped to zero confidence
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,

    /// Frame index mapped to zero confidence
    #[serde(default = "default_max_frame_index")]
    pub max_frame_index: f64,

    /// Whether test files count towards crashed directories
    #[serde(default = "default_true")]
    pub include_test_files: bool,

    /// Also match renamed files by their old path
    #[serde(default)]
    pub match_renamed_old_path: bool,
}

/// Suspect filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Minimum confidence relative to the best suspect
    #[serde(default = "default_confidence_ratio")]
    pub confidence_ratio: f64,

    /// Regexes matched against the whole author email
    #[serde(default = "default_robot_author_patterns")]
    pub robot_author_patterns: Vec<String>,

    /// Repository path of the ignore-list file
    #[serde(default)]
    pub ignore_list_path: Option<String>,

    /// Revision the ignore-list is read at
    #[serde(default)]
    pub ignore_list_revision: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            epsilon: DEFAULT_EPSILON,
            features: FeatureConfig::default(),
            filters: FilterConfig::default(),
            top_n_suspects: DEFAULT_TOP_N_SUSPECTS,
            workers: 0,
            project_classifier: None,
            component_classifier: None,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            max_frame_index: DEFAULT_MAX_FRAME_INDEX,
            include_test_files: true,
            match_renamed_old_path: false,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            confidence_ratio: DEFAULT_CONFIDENCE_RATIO,
            robot_author_patterns: default_robot_author_patterns(),
            ignore_list_path: None,
            ignore_list_revision: None,
        }
    }
}

impl FilterConfig {
    /// `(path, revision)` of the ignore-list, if one is configured
    pub fn ignore_list_location(&self) -> Option<(&str, &str)> {
        let path = self.ignore_list_path.as_deref()?;
        let revision = self
            .ignore_list_revision
            .as_deref()
            .unwrap_or(DEFAULT_IGNORE_LIST_REVISION);
        Some((path, revision))
    }
}

impl EngineConfig {
    /// Check values serde cannot check on its own
    ///
    /// # Errors
    /// * `ConfigError::Invalid` - A numeric setting is out of range, or every
    ///   weight is zero
    /// * `ConfigError::InvalidPattern` - A regex does not compile
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "epsilon must be non-negative, got {}",
                self.epsilon
            )));
        }
        if self.weights.is_zero(self.epsilon) {
            return Err(ConfigError::Invalid(
                "weights must contain at least one non-zero weight".to_string(),
            ));
        }
        if self.features.max_distance.is_nan() || self.features.max_distance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "features.max_distance must be positive, got {}",
                self.features.max_distance
            )));
        }
        if self.features.max_frame_index.is_nan() || self.features.max_frame_index <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "features.max_frame_index must be positive, got {}",
                self.features.max_frame_index
            )));
        }
        if self.filters.ignore_list_revision.is_some() && self.filters.ignore_list_path.is_none() {
            return Err(ConfigError::Invalid(
                "filters.ignore_list_revision requires filters.ignore_list_path".to_string(),
            ));
        }

        FilterLessLikelySuspects::new(self.filters.confidence_ratio)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        RobotAuthorFilter::new(&self.filters.robot_author_patterns)?;

        if let Some(component_classifier) = &self.component_classifier {
            component_classifier.validate()?;
        }

        Ok(())
    }
}

/// Load and validate engine configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the TOML configuration file
///
/// # Returns
/// Parsed EngineConfig
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::TomlParse` - If TOML is invalid or has unknown keys
/// * `ConfigError::Invalid` / `ConfigError::InvalidPattern` - If a value is out of range
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate engine configuration from TOML text
pub fn parse_config(contents: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight::{Weight, WeightEntry};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.features.max_distance, 50.0);
        assert_eq!(config.filters.confidence_ratio, 0.5);
        assert_eq!(config.top_n_suspects, 7);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            top_n_suspects = 3

            [weights]
            TouchCrashedDirectory = 1.0

            [weights.TouchCrashedFileMeta]
            MinDistance = 2.0

            [features]
            max_distance = 30
            include_test_files = false

            [filters]
            confidence_ratio = 0.7
            ignore_list_path = "tools/ignore_revs.txt"
            ignore_list_revision = "master"

            [project_classifier]
            host_directories = ["src/"]

            [component_classifier]
            top_n = 2

            [[component_classifier.component_info]]
            dirs = ["src/cc/"]
            component = "Internals>Compositing"
            "#,
        )
        .unwrap();

        assert_eq!(config.top_n_suspects, 3);
        assert_eq!(config.features.max_distance, 30.0);
        assert!(!config.features.include_test_files);
        assert_eq!(
            config.weights.get("TouchCrashedDirectory"),
            Some(&WeightEntry::Leaf(Weight(1.0)))
        );
        assert_eq!(
            config.component_classifier.unwrap().component_info[0].component,
            "Internals>Compositing"
        );
        assert_eq!(
            config.project_classifier.unwrap().root_project_name,
            "chromium"
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            parse_config("[features]\nmax_distanse = 3"),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_default_weights_cover_crashed_files() {
        let config = parse_config("top_n_suspects = 3").unwrap();
        assert_eq!(config.weights, default_weights());
        assert!(!config.weights.is_zero(config.epsilon));
    }

    #[test]
    fn test_zero_weights_are_rejected() {
        assert!(matches!(
            parse_config("[weights]\nTouchCrashedDirectory = 0.0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            parse_config("[weights]"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_negative_ratio_is_rejected() {
        assert!(matches!(
            parse_config("[filters]\nconfidence_ratio = -1.0"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
