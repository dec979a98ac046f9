//! Self-contained input of an offline analysis run.
//!
//! Bundles the crash, the suspects and everything the in-memory
//! collaborators need, so a run can be replayed from a single JSON file.

use super::suspect::Suspect;
use crate::collaborators::{Blame, InMemoryInvertedIndex};
use crate::dependency::{Dependency, DependencyRoll};
use crate::stacktrace::Stacktrace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisInput {
    pub crashed_version: String,

    #[serde(default)]
    pub signature: String,

    #[serde(default)]
    pub platform: String,

    pub stacktrace: Stacktrace,

    /// `[last good, first bad]`
    #[serde(default)]
    pub regression_range: Option<(String, String)>,

    /// Every dependency pinned at `crashed_version`
    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,

    /// Every roll within `regression_range`
    #[serde(default)]
    pub dependency_rolls: BTreeMap<String, DependencyRoll>,

    #[serde(default)]
    pub suspects: Vec<Suspect>,

    #[serde(default)]
    pub inverted_index: Option<InMemoryInvertedIndex>,

    /// Ignore-list text served at the configured ignore-list location
    #[serde(default)]
    pub ignore_list: Option<String>,

    #[serde(default)]
    pub blames: Vec<Blame>,
}
