//! Scopes a version's dependencies to the ones a crash actually touches.

use super::{Dependency, DependencyRoll};
use crate::stacktrace::CallStack;
use crate::utils::error::CollaboratorError;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

/// Source of dependency pins, e.g. a DEPS file parser
pub trait DependencyFetcher: Send + Sync {
    /// Full dependency set of `version` on `platform`, keyed by path
    fn get_dependency(
        &self,
        version: &str,
        platform: &str,
    ) -> Result<BTreeMap<String, Dependency>, CollaboratorError>;

    /// Rolls between two versions on `platform`, keyed by path
    fn get_dependency_rolls(
        &self,
        old_version: &str,
        new_version: &str,
        platform: &str,
    ) -> Result<BTreeMap<String, DependencyRoll>, CollaboratorError>;
}

/// Computes in-scope dependencies and rolls for one crash
///
/// The full dependency set of the regression version is fetched at most
/// once per analyzer.
pub struct DependencyAnalyzer {
    platform: String,
    regression_version: String,
    regression_range: Option<(String, String)>,
    fetcher: Arc<dyn DependencyFetcher>,
    full_dependencies: OnceLock<BTreeMap<String, Dependency>>,
}

impl DependencyAnalyzer {
    pub fn new(
        platform: impl Into<String>,
        regression_version: impl Into<String>,
        regression_range: Option<(String, String)>,
        fetcher: Arc<dyn DependencyFetcher>,
    ) -> Self {
        Self {
            platform: platform.into(),
            regression_version: regression_version.into(),
            regression_range,
            fetcher,
            full_dependencies: OnceLock::new(),
        }
    }

    /// Every dependency of the regression version, fetched on first use
    pub fn full_dependencies(&self) -> &BTreeMap<String, Dependency> {
        self.full_dependencies.get_or_init(|| {
            match self
                .fetcher
                .get_dependency(&self.regression_version, &self.platform)
            {
                Ok(dependencies) => dependencies,
                Err(e) => {
                    warn!(
                        "Failed to fetch dependencies of {} on {}: {}",
                        self.regression_version, self.platform, e
                    );
                    BTreeMap::new()
                }
            }
        })
    }

    /// Dependencies of the regression version that appear in some frame
    pub fn dependencies(&self, stacks: &[CallStack]) -> BTreeMap<String, Dependency> {
        if stacks.is_empty() {
            return BTreeMap::new();
        }

        let frame_dep_paths: BTreeSet<&str> = stacks
            .iter()
            .flat_map(|stack| stack.frames.iter())
            .map(|frame| frame.dep_path.as_str())
            .filter(|dep_path| !dep_path.is_empty())
            .collect();

        let dependencies: BTreeMap<String, Dependency> = self
            .full_dependencies()
            .iter()
            .filter(|(path, _)| frame_dep_paths.contains(path.as_str()))
            .map(|(path, dependency)| (path.clone(), dependency.clone()))
            .collect();

        debug!(
            "{} of {} dependencies appear in the stacktrace",
            dependencies.len(),
            self.full_dependencies().len()
        );
        dependencies
    }

    /// Rolls of in-scope dependencies within the regression range
    ///
    /// Rolls that add or remove a dependency are left out.
    pub fn dependency_rolls(&self, stacks: &[CallStack]) -> BTreeMap<String, DependencyRoll> {
        let Some((old_version, new_version)) = &self.regression_range else {
            return BTreeMap::new();
        };
        if stacks.is_empty() {
            return BTreeMap::new();
        }

        let dependencies = self.dependencies(stacks);
        if dependencies.is_empty() {
            return BTreeMap::new();
        }

        let rolls = match self
            .fetcher
            .get_dependency_rolls(old_version, new_version, &self.platform)
        {
            Ok(rolls) => rolls,
            Err(e) => {
                warn!(
                    "Failed to fetch dependency rolls {}..{} on {}: {}",
                    old_version, new_version, self.platform, e
                );
                return BTreeMap::new();
            }
        };

        rolls
            .into_iter()
            .filter(|(path, roll)| dependencies.contains_key(path) && roll.is_complete())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacktrace::{CallStackFormat, StackFrame};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl DependencyFetcher for CountingFetcher {
        fn get_dependency(
            &self,
            _version: &str,
            _platform: &str,
        ) -> Result<BTreeMap<String, Dependency>, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut deps = BTreeMap::new();
            deps.insert("src/".to_string(), Dependency::new("src/", "https://cr", "1"));
            deps.insert("src/v8/".to_string(), Dependency::new("src/v8/", "https://v8", "2"));
            deps.insert("src/skia/".to_string(), Dependency::new("src/skia/", "https://sk", "3"));
            Ok(deps)
        }

        fn get_dependency_rolls(
            &self,
            _old_version: &str,
            _new_version: &str,
            _platform: &str,
        ) -> Result<BTreeMap<String, DependencyRoll>, CollaboratorError> {
            let mut rolls = BTreeMap::new();
            rolls.insert(
                "src/".to_string(),
                DependencyRoll::new("src/", "https://cr", Some("0".into()), Some("1".into())),
            );
            rolls.insert(
                "src/v8/".to_string(),
                DependencyRoll::new("src/v8/", "https://v8", None, Some("2".into())),
            );
            rolls.insert(
                "src/skia/".to_string(),
                DependencyRoll::new("src/skia/", "https://sk", Some("2".into()), Some("3".into())),
            );
            Ok(rolls)
        }
    }

    fn stacks() -> Vec<CallStack> {
        vec![CallStack::new(
            0,
            vec![
                StackFrame::new(0, "src/", "f", "a.cc", "src/a.cc", vec![1]),
                StackFrame::new(1, "src/v8/", "g", "b.cc", "src/v8/b.cc", vec![2]),
            ],
            CallStackFormat::Default,
        )]
    }

    fn analyzer(range: Option<(String, String)>) -> (DependencyAnalyzer, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let analyzer = DependencyAnalyzer::new("linux", "51.0.1", range, fetcher.clone());
        (analyzer, fetcher)
    }

    #[test]
    fn test_dependencies_restricted_to_frames() {
        let (analyzer, _) = analyzer(None);
        let deps = analyzer.dependencies(&stacks());
        let keys: Vec<&str> = deps.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["src/", "src/v8/"]);
        assert!(analyzer.dependencies(&[]).is_empty());
    }

    #[test]
    fn test_full_dependency_set_is_cached() {
        let (analyzer, fetcher) = analyzer(None);
        analyzer.dependencies(&stacks());
        analyzer.dependencies(&stacks());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rolls_require_range_and_both_revisions() {
        let (no_range, _) = analyzer(None);
        assert!(no_range.dependency_rolls(&stacks()).is_empty());

        let (analyzer, _) = analyzer(Some(("51.0.0".into(), "51.0.1".into())));
        let rolls = analyzer.dependency_rolls(&stacks());
        let keys: Vec<&str> = rolls.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["src/"]);
        assert!(analyzer.dependency_rolls(&[]).is_empty());
    }
}
