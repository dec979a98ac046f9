//! A single frame of a crash call stack.

use crate::utils::error::ParseError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One frame in a call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackFrame {
    /// Frame number shown in the stack text (`#3`), else its position
    pub index: u32,

    /// Root of the dependency this frame belongs to, e.g. `src/` or `src/v8/`
    #[serde(default)]
    pub dep_path: String,

    /// Bug-tracker component, if the crash parser knew it
    #[serde(default)]
    pub component: String,

    /// Function display name
    #[serde(default)]
    pub function: String,

    /// Normalized path, relative to `dep_path`
    #[serde(default)]
    pub file_path: String,

    /// Path as it appeared in the stack text
    #[serde(default)]
    pub raw_file_path: String,

    /// Crashed lines in ascending order; accepts `[61, 62]` or `"61:1"`
    #[serde(default, deserialize_with = "deserialize_crashed_lines")]
    pub crashed_line_numbers: Vec<u32>,

    /// Repository URL of the frame's dependency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

impl StackFrame {
    /// Create a frame without component or repository information
    pub fn new(
        index: u32,
        dep_path: impl Into<String>,
        function: impl Into<String>,
        file_path: impl Into<String>,
        raw_file_path: impl Into<String>,
        crashed_line_numbers: Vec<u32>,
    ) -> Self {
        Self {
            index,
            dep_path: dep_path.into(),
            component: String::new(),
            function: function.into(),
            file_path: file_path.into(),
            raw_file_path: raw_file_path.into(),
            crashed_line_numbers,
            repo_url: None,
        }
    }

    /// Builder: attach a repository URL
    pub fn with_repo_url(mut self, repo_url: impl Into<String>) -> Self {
        self.repo_url = Some(repo_url.into());
        self
    }

    /// Builder: attach a component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    /// Copy of this frame rooted at a (newly resolved) dependency
    pub fn with_dependency(
        &self,
        dep_path: impl Into<String>,
        file_path: impl Into<String>,
        repo_url: Option<String>,
    ) -> Self {
        Self {
            dep_path: dep_path.into(),
            file_path: file_path.into(),
            repo_url,
            ..self.clone()
        }
    }

    /// Inclusive `(first, last)` crashed line range, if any line is known
    pub fn crashed_line_range(&self) -> Option<(u32, u32)> {
        let first = *self.crashed_line_numbers.first()?;
        let last = *self.crashed_line_numbers.last()?;
        Some((first, last))
    }

    /// Full path of the file, including its dependency root
    pub fn full_path(&self) -> String {
        format!("{}{}", self.dep_path, self.file_path)
    }

    /// Blame URL for this frame's file at `revision`
    ///
    /// Example: `https://repo/+blame/rev/a/f.cc#177`
    pub fn blame_url(&self, revision: &str) -> Option<String> {
        let repo_url = self.repo_url.as_deref()?;
        if self.dep_path.is_empty() {
            return None;
        }

        let mut url = format!("{}/+blame/{}/{}", repo_url, revision, self.file_path);
        if let Some(line) = self.crashed_line_numbers.first() {
            url.push_str(&format!("#{}", line));
        }
        Some(url)
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} in {} @ {}", self.index, self.function, self.file_path)?;
        if let Some(first) = self.crashed_line_numbers.first() {
            write!(f, ":{}", first)?;
        }
        // [61, 62] renders as `f.cc:61:1`
        if self.crashed_line_numbers.len() > 1 {
            write!(f, ":{}", self.crashed_line_numbers.len() - 1)?;
        }
        Ok(())
    }
}

/// Largest `count` accepted in a `line:count` spec
pub const MAX_CRASHED_LINE_COUNT: u32 = 10_000;

/// Expand a `line[:count]` spec into the contiguous crashed lines.
///
/// `"61"` is `[61]`, `"61:2"` is `[61, 62, 63]`. Counts above
/// [`MAX_CRASHED_LINE_COUNT`] are rejected.
pub fn parse_crashed_line_range(spec: &str) -> Result<Vec<u32>, ParseError> {
    let mut parts = spec.trim().splitn(2, ':');
    let invalid = || ParseError::InvalidLineSpec(spec.to_string());

    let start: u32 = parts
        .next()
        .ok_or_else(invalid)?
        .trim()
        .parse()
        .map_err(|_| invalid())?;

    let extra: u32 = match parts.next() {
        Some(count) => count.trim().parse().map_err(|_| invalid())?,
        None => 0,
    };
    if extra > MAX_CRASHED_LINE_COUNT {
        return Err(invalid());
    }

    let end = start.checked_add(extra).ok_or_else(invalid)?;
    Ok((start..=end).collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LineSpec {
    Lines(Vec<u32>),
    Range(String),
}

fn deserialize_crashed_lines<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match LineSpec::deserialize(deserializer)? {
        LineSpec::Lines(lines) => Ok(lines),
        LineSpec::Range(spec) => parse_crashed_line_range(&spec).map_err(serde::de::Error::custom),
    }
}
