//! Dependency model and the analyzer that scopes dependencies to a crash.
//!
//! A host project pins many dependencies (`src/`, `src/v8/`, ...). Only the
//! dependencies that show up in the stacktrace matter for attribution, and
//! only rolls inside the regression range can explain a regression.

pub mod analyzer;

pub use analyzer::{DependencyAnalyzer, DependencyFetcher};

use serde::{Deserialize, Serialize};

/// A dependency pinned at a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    /// Checkout path, e.g. `src/v8/`
    pub path: String,

    pub repo_url: String,

    pub revision: String,
}

impl Dependency {
    pub fn new(
        path: impl Into<String>,
        repo_url: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            repo_url: repo_url.into(),
            revision: revision.into(),
        }
    }
}

/// A change of a dependency's pinned revision between two versions
///
/// `old_revision` is `None` when the dependency was added, `new_revision`
/// is `None` when it was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyRoll {
    pub path: String,

    pub repo_url: String,

    #[serde(default)]
    pub old_revision: Option<String>,

    #[serde(default)]
    pub new_revision: Option<String>,
}

impl DependencyRoll {
    pub fn new(
        path: impl Into<String>,
        repo_url: impl Into<String>,
        old_revision: Option<String>,
        new_revision: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            repo_url: repo_url.into(),
            old_revision,
            new_revision,
        }
    }

    /// Whether both ends of the roll are known
    pub fn is_complete(&self) -> bool {
        self.old_revision.is_some() && self.new_revision.is_some()
    }
}
