//! Maps frames and suspects to the project they belong to.

use super::default_top_n;
use super::occurrence::{default_rank, rank_by_occurrence, Occurrence};
use crate::model::Suspect;
use crate::stacktrace::{CallStack, LanguageType, StackFrame};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Project the host directories belong to
pub const DEFAULT_ROOT_PROJECT: &str = "chromium";

fn default_root_project() -> String {
    DEFAULT_ROOT_PROJECT.to_string()
}

/// Project classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectClassifierConfig {
    /// Checkout roots of the root project, e.g. `src/`
    #[serde(default)]
    pub host_directories: Vec<String>,

    /// Function-name prefix -> project
    #[serde(default)]
    pub function_marker_to_project_name: BTreeMap<String, String>,

    /// Raw file path substring -> project
    #[serde(default)]
    pub file_path_marker_to_project_name: BTreeMap<String, String>,

    /// Crash-stack frames consulted when there are no suspects
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Rank of non-root projects in Java crashes, lower is more suspicious
    #[serde(default)]
    pub non_chromium_project_rank_priority: BTreeMap<String, i64>,

    #[serde(default = "default_root_project")]
    pub root_project_name: String,
}

impl Default for ProjectClassifierConfig {
    fn default() -> Self {
        Self {
            host_directories: Vec::new(),
            function_marker_to_project_name: BTreeMap::new(),
            file_path_marker_to_project_name: BTreeMap::new(),
            top_n: default_top_n(),
            non_chromium_project_rank_priority: BTreeMap::new(),
            root_project_name: default_root_project(),
        }
    }
}

/// Determines the most suspected project of a crash
pub struct ProjectClassifier {
    config: Option<ProjectClassifierConfig>,
}

impl ProjectClassifier {
    /// Host directories are tried most specific first
    pub fn new(config: Option<ProjectClassifierConfig>) -> Self {
        let config = config.map(|mut config| {
            config
                .host_directories
                .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            config
        });
        Self { config }
    }

    /// Project named by a dependency path
    ///
    /// `src/` (a host directory) is the root project, `src/v8/` becomes
    /// `chromium-v8` and an unknown `third_party/foo/` becomes
    /// `third_party_foo`.
    pub fn project_from_dep_path(&self, dep_path: &str) -> Option<String> {
        let config = self.config.as_ref()?;
        if dep_path.is_empty() {
            return None;
        }

        let join = |path: &str| {
            path.split('/')
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join("_")
        };

        for host_directory in &config.host_directories {
            if let Some(rest) = dep_path.strip_prefix(host_directory.as_str()) {
                let rest = join(rest);
                return Some(if rest.is_empty() {
                    config.root_project_name.clone()
                } else {
                    format!("{}-{}", config.root_project_name, rest)
                });
            }
        }

        let name = join(dep_path);
        (!name.is_empty()).then_some(name)
    }

    /// Project of a single frame
    pub fn classify_frame(&self, frame: &StackFrame) -> Option<String> {
        let config = self.config.as_ref()?;

        for (marker, project) in &config.function_marker_to_project_name {
            if frame.function.starts_with(marker.as_str()) {
                return Some(project.clone());
            }
        }

        for (marker, project) in &config.file_path_marker_to_project_name {
            if frame.raw_file_path.contains(marker.as_str()) {
                return Some(project.clone());
            }
        }

        self.project_from_dep_path(&frame.dep_path)
    }

    /// Project of a suspect, from the dependency it landed in
    pub fn classify_suspect(&self, suspect: &Suspect) -> Option<String> {
        self.project_from_dep_path(&suspect.dep_path)
    }

    fn java_rank(&self, occurrence: &Occurrence) -> (i64, Reverse<usize>, usize) {
        let priority = match &self.config {
            Some(config) if occurrence.name == config.root_project_name => 0,
            Some(config) => config
                .non_chromium_project_rank_priority
                .get(&occurrence.name)
                .copied()
                .unwrap_or(i64::MAX),
            None => i64::MAX,
        };
        (
            priority,
            Reverse(occurrence.count()),
            occurrence.first_index(),
        )
    }

    /// Most suspected project, or an empty string
    ///
    /// Suspects are classified when there are any; otherwise the top frames
    /// of `crash_stack` are.
    pub fn classify(&self, suspects: &[Suspect], crash_stack: Option<&CallStack>) -> String {
        let Some(config) = &self.config else {
            warn!("Project classifier is not configured");
            return String::new();
        };

        let ranked = if !suspects.is_empty() {
            let names: Vec<Option<String>> = suspects
                .iter()
                .map(|suspect| self.classify_suspect(suspect))
                .collect();
            rank_by_occurrence(&names, 1, default_rank)
        } else {
            let Some(stack) = crash_stack else {
                return String::new();
            };
            let names: Vec<Option<String>> = stack
                .frames
                .iter()
                .take(config.top_n)
                .map(|frame| self.classify_frame(frame))
                .collect();

            match stack.language_type() {
                LanguageType::Java => {
                    rank_by_occurrence(&names, 1, |occurrence| self.java_rank(occurrence))
                }
                LanguageType::Cpp => rank_by_occurrence(&names, 1, default_rank),
            }
        };

        let project = ranked.into_iter().next().unwrap_or_default();
        debug!("Suspected project: {:?}", project);
        project
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacktrace::CallStackFormat;

    fn classifier() -> ProjectClassifier {
        let mut config = ProjectClassifierConfig {
            host_directories: vec!["src/".to_string(), "src/chrome/browser/resources/".to_string()],
            ..ProjectClassifierConfig::default()
        };
        config
            .function_marker_to_project_name
            .insert("org.chromium".to_string(), "chromium".to_string());
        config
            .function_marker_to_project_name
            .insert("android.".to_string(), "android_os".to_string());
        config
            .file_path_marker_to_project_name
            .insert("googleplex-android/".to_string(), "android_os".to_string());
        config
            .non_chromium_project_rank_priority
            .insert("android_os".to_string(), -1);
        ProjectClassifier::new(Some(config))
    }

    fn frame(dep_path: &str, function: &str, raw_file_path: &str) -> StackFrame {
        StackFrame::new(0, dep_path, function, "f.cc", raw_file_path, vec![1])
    }

    #[test]
    fn test_project_from_dep_path() {
        let classifier = classifier();
        assert_eq!(classifier.project_from_dep_path("src/").as_deref(), Some("chromium"));
        assert_eq!(
            classifier.project_from_dep_path("src/v8/").as_deref(),
            Some("chromium-v8")
        );
        assert_eq!(
            classifier.project_from_dep_path("src/chrome/browser/resources/").as_deref(),
            Some("chromium")
        );
        assert_eq!(
            classifier.project_from_dep_path("third_party/foo/").as_deref(),
            Some("third_party_foo")
        );
        assert_eq!(classifier.project_from_dep_path(""), None);
    }

    #[test]
    fn test_markers_take_precedence() {
        let classifier = classifier();
        assert_eq!(
            classifier
                .classify_frame(&frame("src/", "android.app.Activity", "x"))
                .as_deref(),
            Some("android_os")
        );
        assert_eq!(
            classifier
                .classify_frame(&frame("src/", "f", "/googleplex-android/a.java"))
                .as_deref(),
            Some("android_os")
        );
        assert_eq!(
            classifier.classify_frame(&frame("src/v8/", "f", "x")).as_deref(),
            Some("chromium-v8")
        );
    }

    #[test]
    fn test_unconfigured_classifier_is_empty() {
        let classifier = ProjectClassifier::new(None);
        let stack = CallStack::new(0, vec![frame("src/", "f", "x")], CallStackFormat::Default);
        assert_eq!(classifier.classify(&[], Some(&stack)), "");
    }

    #[test]
    fn test_java_prefers_ranked_projects() {
        let classifier = classifier();
        let stack = CallStack::new(
            0,
            vec![
                frame("src/", "org.chromium.a", "x"),
                frame("src/", "org.chromium.b", "x"),
                frame("", "android.os.Looper", "x"),
            ],
            CallStackFormat::Java,
        );
        assert_eq!(classifier.classify(&[], Some(&stack)), "android_os");

        let cpp = CallStack::new(0, stack.frames.clone(), CallStackFormat::Default);
        assert_eq!(classifier.classify(&[], Some(&cpp)), "chromium");
    }
}
