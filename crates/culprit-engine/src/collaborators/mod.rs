//! External collaborators consumed by the engine.
//!
//! The engine never talks to a source-control host or a search backend
//! itself. Callers inject implementations of these traits (the in-memory
//! ones in [`memory`] cover tests and offline CLI runs).

pub mod memory;

pub use memory::{InMemoryInvertedIndex, InMemoryRepository, StaticDependencyFetcher};

use crate::model::ChangeLog;
use crate::utils::error::CollaboratorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous block of lines last changed by one revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Region {
    /// First line, 1-based
    pub start: u32,

    /// Number of lines, at least 1
    pub count: u32,

    pub revision: String,

    #[serde(default)]
    pub author_name: String,

    #[serde(default)]
    pub author_email: String,

    #[serde(default)]
    pub author_time: Option<DateTime<Utc>>,
}

impl Region {
    pub fn new(start: u32, count: u32, revision: impl Into<String>) -> Self {
        Self {
            start,
            count,
            revision: revision.into(),
            author_name: String::new(),
            author_email: String::new(),
            author_time: None,
        }
    }

    /// Last line of the region, inclusive
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.count.saturating_sub(1))
    }
}

/// Line attribution of a file at a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blame {
    pub path: String,
    pub revision: String,
    pub regions: Vec<Region>,
}

impl Blame {
    pub fn new(path: impl Into<String>, revision: impl Into<String>, regions: Vec<Region>) -> Self {
        Self {
            path: path.into(),
            revision: revision.into(),
            regions,
        }
    }

    /// Regions last touched by `revision`
    pub fn regions_of<'a>(&'a self, revision: &'a str) -> impl Iterator<Item = &'a Region> + 'a {
        self.regions
            .iter()
            .filter(move |region| region.revision == revision)
    }
}

/// Read access to a source repository
pub trait Repository: Send + Sync {
    fn get_change_log(&self, revision: &str) -> Result<Option<ChangeLog>, CollaboratorError>;

    /// File contents at `revision`, `None` when the file does not exist
    fn get_source(&self, path: &str, revision: &str) -> Result<Option<String>, CollaboratorError>;

    /// Blame of `path` at `revision`
    ///
    /// Repositories that cannot blame report `None`.
    fn get_blame(&self, _path: &str, _revision: &str) -> Result<Option<Blame>, CollaboratorError> {
        Ok(None)
    }
}

/// Document-frequency lookups over a corpus of file paths
pub trait InvertedIndex: Send + Sync {
    /// Number of documents containing `keyword`
    fn get(&self, keyword: &str) -> Option<u64>;

    /// Total number of documents
    fn get_root(&self) -> Option<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_end_is_inclusive() {
        assert_eq!(Region::new(10, 1, "r").end(), 10);
        assert_eq!(Region::new(10, 5, "r").end(), 14);
        assert_eq!(Region::new(10, 0, "r").end(), 10);
        assert_eq!(Region::new(u32::MAX - 1, 10, "r").end(), u32::MAX);
    }

    #[test]
    fn test_regions_of_revision() {
        let blame = Blame::new(
            "a.cc",
            "head",
            vec![
                Region::new(1, 3, "r1"),
                Region::new(4, 2, "r2"),
                Region::new(6, 1, "r1"),
            ],
        );
        let starts: Vec<u32> = blame.regions_of("r1").map(|r| r.start).collect();
        assert_eq!(starts, vec![1, 6]);
    }
}
