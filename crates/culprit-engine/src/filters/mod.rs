//! Post-scoring suspect filters.
//!
//! Every filter keeps the relative order of the suspects it lets through.
//! The engine applies them in this order: robot authors, ignored revisions,
//! less likely suspects.

use crate::collaborators::Repository;
use crate::model::Suspect;
use crate::utils::error::{ConfigError, EngineError};
use log::{debug, info, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Author emails of automated rollers and release bots
pub const DEFAULT_ROBOT_AUTHOR_PATTERNS: &[&str] = &[
    r".*-autoroll@.*",
    r".*@chops-service-accounts\.iam\.gserviceaccount\.com",
    r"chrome-release-bot@chromium\.org",
    r"blink-reformat@chromium\.org",
];

/// A step that narrows the ranked suspect list
pub trait SuspectFilter: Send + Sync {
    fn name(&self) -> &str;

    fn filter(&self, suspects: Vec<Suspect>) -> Vec<Suspect>;
}

/// Drop suspects authored by robots
pub fn filter_suspect_from_robot_author(
    suspects: Vec<Suspect>,
    patterns: &[Regex],
) -> Vec<Suspect> {
    suspects
        .into_iter()
        .filter(|suspect| {
            let email = &suspect.changelog.author.email;
            let is_robot = patterns.iter().any(|pattern| pattern.is_match(email));
            if is_robot {
                debug!("Dropping {} by robot author {}", suspect.revision(), email);
            }
            !is_robot
        })
        .collect()
}

/// Robot-author filter with precompiled, fully anchored patterns
pub struct RobotAuthorFilter {
    patterns: Vec<Regex>,
}

impl RobotAuthorFilter {
    /// # Errors
    /// * `ConfigError::InvalidPattern` - A pattern is not a valid regex
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| Regex::new(&format!("^(?:{})$", pattern.as_ref())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl SuspectFilter for RobotAuthorFilter {
    fn name(&self) -> &str {
        "FilterSuspectFromRobotAuthor"
    }

    fn filter(&self, suspects: Vec<Suspect>) -> Vec<Suspect> {
        filter_suspect_from_robot_author(suspects, &self.patterns)
    }
}

/// Revisions listed in an ignore-list file
///
/// One revision per line; blank lines and `#` comments are skipped.
pub fn parse_ignore_list(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Drop suspects whose revision is on the repository's ignore-list
///
/// Any failure to fetch the list makes this filter a no-op.
pub struct FilterIgnoredRevisions {
    repository: Arc<dyn Repository>,
    path: String,
    revision: String,
}

impl FilterIgnoredRevisions {
    pub fn new(
        repository: Arc<dyn Repository>,
        path: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            path: path.into(),
            revision: revision.into(),
        }
    }

    fn ignored_revisions(&self) -> Option<BTreeSet<String>> {
        match self.repository.get_source(&self.path, &self.revision) {
            Ok(Some(content)) => Some(parse_ignore_list(&content)),
            Ok(None) => {
                warn!("Ignore list {}@{} not found", self.path, self.revision);
                None
            }
            Err(e) => {
                warn!(
                    "Failed to fetch ignore list {}@{}: {}",
                    self.path, self.revision, e
                );
                None
            }
        }
    }
}

impl SuspectFilter for FilterIgnoredRevisions {
    fn name(&self) -> &str {
        "FilterIgnoredRevisions"
    }

    fn filter(&self, suspects: Vec<Suspect>) -> Vec<Suspect> {
        let Some(ignored) = self.ignored_revisions() else {
            return suspects;
        };

        suspects
            .into_iter()
            .filter(|suspect| !ignored.contains(suspect.revision()))
            .collect()
    }
}

/// Keep suspects whose confidence is within `ratio` of the best one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterLessLikelySuspects {
    ratio: f64,
}

impl FilterLessLikelySuspects {
    /// # Errors
    /// * `EngineError::InvalidRatio` - `ratio` is negative or NaN
    pub fn new(ratio: f64) -> Result<Self, EngineError> {
        if ratio.is_nan() || ratio < 0.0 {
            return Err(EngineError::InvalidRatio(ratio));
        }
        Ok(Self { ratio })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl SuspectFilter for FilterLessLikelySuspects {
    fn name(&self) -> &str {
        "FilterLessLikelySuspects"
    }

    fn filter(&self, suspects: Vec<Suspect>) -> Vec<Suspect> {
        let max_confidence = suspects
            .iter()
            .map(|suspect| suspect.confidence)
            .fold(f64::NEG_INFINITY, f64::max);

        if max_confidence.is_nan() || max_confidence <= 0.0 {
            return suspects;
        }

        suspects
            .into_iter()
            .filter(|suspect| suspect.confidence / max_confidence >= self.ratio)
            .collect()
    }
}

/// Run `filters` in order, logging how many suspects each one removed
pub fn apply_filters(
    filters: &[Box<dyn SuspectFilter>],
    suspects: Vec<Suspect>,
) -> Vec<Suspect> {
    filters.iter().fold(suspects, |suspects, filter| {
        let before = suspects.len();
        let kept = filter.filter(suspects);
        if kept.len() != before {
            info!("{} removed {} suspect(s)", filter.name(), before - kept.len());
        }
        kept
    })
}
