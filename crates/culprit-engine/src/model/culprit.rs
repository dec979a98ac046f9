//! Final verdict of an analysis run and its wire format.
//!
//! `Culprit::to_dicts` produces the result/tag pair consumed downstream. Field
//! names and nesting of [`CulpritResult`] and [`CulpritTags`] are a contract:
//! do not rename them.

use super::suspect::Suspect;
use crate::feature::ChangedFile;
use serde::{Deserialize, Serialize};

/// Solution tag for the full feature-scoring path
pub const ALGORITHM_CORE: &str = "core_algorithm";

/// Solution tag used when no regression range was available
pub const ALGORITHM_BLAME: &str = "blame";

/// Ranked attribution result
#[derive(Debug, Clone, PartialEq)]
pub struct Culprit {
    /// Most suspected project, possibly empty
    pub project: String,

    /// Most suspected components, best first
    pub components: Vec<String>,

    /// Suspects ranked by descending confidence
    pub suspected_cls: Vec<Suspect>,

    pub regression_range: Option<(String, String)>,

    /// Which scoring path produced this result
    pub algorithm: String,
}

/// Result dict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulpritResult {
    pub found: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regression_range: Option<(String, String)>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspected_project: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspected_components: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspected_cls: Option<Vec<SuspectReport>>,
}

/// One suspected changelist in the result dict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspectReport {
    pub revision: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_url: Option<String>,

    pub project_path: String,
    pub author: String,
    pub time: String,
    pub reasons: Vec<String>,
    pub changed_files: Vec<ChangedFileReport>,
    pub confidence: f64,
}

/// One evidence file in the result dict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedFileReport {
    pub file: String,
    pub blame_url: Option<String>,
    pub info: String,
}

/// Tag dict used for metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulpritTags {
    pub found_suspects: bool,
    pub has_regression_range: bool,
    pub found_project: bool,
    pub found_components: bool,
    pub solution: String,
}

impl From<&ChangedFile> for ChangedFileReport {
    fn from(changed_file: &ChangedFile) -> Self {
        Self {
            file: changed_file.name.clone(),
            blame_url: changed_file.blame_url.clone(),
            info: changed_file.reasons.join("\n"),
        }
    }
}

impl From<&Suspect> for SuspectReport {
    fn from(suspect: &Suspect) -> Self {
        let changelog = &suspect.changelog;
        Self {
            revision: changelog.revision.clone(),
            url: changelog.commit_url.clone(),
            review_url: changelog.code_review_url.clone(),
            project_path: suspect.dep_path.clone(),
            author: changelog.author.email.clone(),
            time: changelog.author_time_string(),
            reasons: suspect.reasons.clone(),
            changed_files: suspect.changed_files.iter().map(ChangedFileReport::from).collect(),
            confidence: suspect.confidence,
        }
    }
}

impl Culprit {
    /// Whether anything at all was found
    pub fn found(&self) -> bool {
        !self.project.is_empty()
            || !self.components.is_empty()
            || !self.suspected_cls.is_empty()
            || self.regression_range.is_some()
    }

    /// Serialize into the `(result, tags)` pair
    pub fn to_dicts(&self) -> (CulpritResult, CulpritTags) {
        let result = CulpritResult {
            found: self.found(),
            regression_range: self.regression_range.clone(),
            suspected_project: (!self.project.is_empty()).then(|| self.project.clone()),
            suspected_components: (!self.components.is_empty()).then(|| self.components.clone()),
            suspected_cls: (!self.suspected_cls.is_empty())
                .then(|| self.suspected_cls.iter().map(SuspectReport::from).collect()),
        };

        let tags = CulpritTags {
            found_suspects: !self.suspected_cls.is_empty(),
            has_regression_range: self.regression_range.is_some(),
            found_project: !self.project.is_empty(),
            found_components: !self.components.is_empty(),
            solution: self.algorithm.clone(),
        };

        (result, tags)
    }
}
