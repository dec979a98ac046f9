//! Maps frames and touched files to bug-tracker components.

use super::default_top_n;
use super::occurrence::{default_rank, rank_by_occurrence};
use crate::model::Suspect;
use crate::stacktrace::{CallStack, StackFrame};
use crate::utils::error::ConfigError;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One component rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentInfo {
    /// Path prefixes (including the dependency root) owned by the component
    pub dirs: Vec<String>,

    /// Regex a frame's function must match from its start
    #[serde(default)]
    pub function: Option<String>,

    /// e.g. `Blink>DOM`
    pub component: String,

    #[serde(default)]
    pub team: Option<String>,
}

/// Component classifier settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentClassifierConfig {
    #[serde(default)]
    pub component_info: Vec<ComponentInfo>,

    /// Number of components reported, and of crash-stack frames consulted
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ComponentClassifierConfig {
    fn default() -> Self {
        Self {
            component_info: Vec::new(),
            top_n: default_top_n(),
        }
    }
}

impl ComponentClassifierConfig {
    /// Check that every function pattern compiles
    ///
    /// # Errors
    /// * `ConfigError::InvalidPattern` - A `function` regex is malformed
    pub fn validate(&self) -> Result<(), ConfigError> {
        for info in &self.component_info {
            if let Some(function) = &info.function {
                compile_function_pattern(function)?;
            }
        }
        Ok(())
    }
}

fn compile_function_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}

struct Component {
    name: String,
    dirs: Vec<String>,
    function: Option<Regex>,
}

impl Component {
    fn matches_path(&self, path: &str) -> bool {
        self.dirs.iter().any(|dir| path.starts_with(dir.as_str()))
    }

    fn matches_frame(&self, frame: &StackFrame) -> bool {
        let function_matches = self
            .function
            .as_ref()
            .map_or(true, |function| function.is_match(&frame.function));
        function_matches && self.matches_path(&frame.full_path())
    }
}

/// Determines the most suspected components of a crash
pub struct ComponentClassifier {
    components: Vec<Component>,
    top_n: usize,
}

impl ComponentClassifier {
    /// Rules with a malformed function pattern are dropped with a warning
    pub fn new(config: Option<ComponentClassifierConfig>) -> Self {
        let Some(config) = config else {
            return Self {
                components: Vec::new(),
                top_n: default_top_n(),
            };
        };

        let components = config
            .component_info
            .into_iter()
            .filter_map(|info| {
                let function = match info.function.as_deref().map(compile_function_pattern) {
                    Some(Ok(regex)) => Some(regex),
                    Some(Err(e)) => {
                        warn!("Dropping component {}: {}", info.component, e);
                        return None;
                    }
                    None => None,
                };
                Some(Component {
                    name: info.component,
                    dirs: info.dirs,
                    function,
                })
            })
            .collect();

        Self {
            components,
            top_n: config.top_n,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.components.is_empty()
    }

    /// Component of a frame; an explicit frame component wins
    pub fn classify_frame(&self, frame: &StackFrame) -> Option<String> {
        if !frame.component.is_empty() {
            return Some(frame.component.clone());
        }
        self.components
            .iter()
            .find(|component| component.matches_frame(frame))
            .map(|component| component.name.clone())
    }

    /// Component owning a full path, e.g. `src/third_party/WebKit/a.cc`
    pub fn classify_path(&self, path: &str) -> Option<String> {
        self.components
            .iter()
            .find(|component| component.matches_path(path))
            .map(|component| component.name.clone())
    }

    /// Components of every file a suspect touched, in changelog order
    pub fn classify_suspect(&self, suspect: &Suspect) -> Vec<Option<String>> {
        suspect
            .changelog
            .touched_files
            .iter()
            .map(|touched| self.classify_path(&format!("{}{}", suspect.dep_path, touched.path())))
            .collect()
    }

    /// Most suspected components, best first
    ///
    /// Suspects are classified when there are any; otherwise the top frames
    /// of `crash_stack` are.
    pub fn classify(&self, suspects: &[Suspect], crash_stack: Option<&CallStack>) -> Vec<String> {
        if !self.is_configured() {
            warn!("Component classifier is not configured");
            return Vec::new();
        }

        let names: Vec<Option<String>> = if !suspects.is_empty() {
            suspects
                .iter()
                .flat_map(|suspect| self.classify_suspect(suspect))
                .collect()
        } else {
            match crash_stack {
                Some(stack) => stack
                    .frames
                    .iter()
                    .take(self.top_n)
                    .map(|frame| self.classify_frame(frame))
                    .collect(),
                None => Vec::new(),
            }
        };

        let components = rank_by_occurrence(&names, self.top_n, default_rank);
        debug!("Suspected components: {:?}", components);
        components
    }
}
