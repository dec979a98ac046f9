//! Everything known about one crash at scoring time.

use crate::dependency::{Dependency, DependencyRoll};
use crate::stacktrace::Stacktrace;
use std::collections::BTreeMap;

/// Crash report handed to features
///
/// `dependencies` and `dependency_rolls` are already restricted to the
/// dependencies that appear in the stacktrace.
#[derive(Debug, Clone, PartialEq)]
pub struct CrashReport {
    /// Version the crash was reported at (the regression version)
    pub crashed_version: String,

    pub signature: String,

    pub platform: String,

    pub stacktrace: Stacktrace,

    /// `(last good, first bad)` versions
    pub regression_range: Option<(String, String)>,

    /// dep_path -> dependency at `crashed_version`
    pub dependencies: BTreeMap<String, Dependency>,

    /// dep_path -> roll within `regression_range`
    pub dependency_rolls: BTreeMap<String, DependencyRoll>,
}

impl CrashReport {
    /// Report with no dependency information
    pub fn new(
        crashed_version: impl Into<String>,
        signature: impl Into<String>,
        platform: impl Into<String>,
        stacktrace: Stacktrace,
        regression_range: Option<(String, String)>,
    ) -> Self {
        Self {
            crashed_version: crashed_version.into(),
            signature: signature.into(),
            platform: platform.into(),
            stacktrace,
            regression_range,
            dependencies: BTreeMap::new(),
            dependency_rolls: BTreeMap::new(),
        }
    }

    /// Builder: attach in-scope dependencies
    pub fn with_dependencies(mut self, dependencies: BTreeMap<String, Dependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Builder: attach in-scope dependency rolls
    pub fn with_dependency_rolls(mut self, rolls: BTreeMap<String, DependencyRoll>) -> Self {
        self.dependency_rolls = rolls;
        self
    }

    /// Revision of `dep_path` at the crashed version, if known
    pub fn dependency_revision(&self, dep_path: &str) -> Option<&str> {
        self.dependencies
            .get(dep_path)
            .map(|dependency| dependency.revision.as_str())
    }
}
