//! Candidate changelists under evaluation.

use super::changelog::ChangeLog;
use crate::feature::ChangedFile;
use crate::stacktrace::StackFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-file analysis cached on a suspect by whoever built it
///
/// When present, distance-based features use it instead of blaming the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisInfo {
    /// Minimum line distance between the suspect's changes and a crashed line
    pub min_distance: f64,

    /// Frame achieving `min_distance`
    #[serde(default)]
    pub min_distance_frame: Option<StackFrame>,
}

/// A changelist suspected of causing the crash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspect {
    pub changelog: ChangeLog,

    /// Dependency the changelist was found in, e.g. `src/`
    pub dep_path: String,

    /// Linear-domain confidence, written only by the ranking step
    #[serde(default, skip_deserializing)]
    pub confidence: f64,

    /// Formatted feature reasons, written by the ranking step
    #[serde(default, skip_deserializing)]
    pub reasons: Vec<String>,

    /// Evidence files, written by the ranking step
    #[serde(default, skip_deserializing)]
    pub changed_files: Vec<ChangedFile>,

    /// Touched file path -> cached analysis
    #[serde(default)]
    pub file_to_analysis_info: BTreeMap<String, AnalysisInfo>,
}

impl Suspect {
    pub fn new(changelog: ChangeLog, dep_path: impl Into<String>) -> Self {
        Self {
            changelog,
            dep_path: dep_path.into(),
            confidence: 0.0,
            reasons: Vec::new(),
            changed_files: Vec::new(),
            file_to_analysis_info: BTreeMap::new(),
        }
    }

    /// Builder: cache analysis for one touched file
    pub fn with_analysis_info(mut self, path: impl Into<String>, info: AnalysisInfo) -> Self {
        self.file_to_analysis_info.insert(path.into(), info);
        self
    }

    pub fn revision(&self) -> &str {
        &self.changelog.revision
    }
}
