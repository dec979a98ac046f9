//! In-memory collaborator implementations.

use super::{Blame, InvertedIndex, Repository};
use crate::dependency::{Dependency, DependencyFetcher, DependencyRoll};
use crate::model::ChangeLog;
use crate::utils::error::CollaboratorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dependency fetcher answering every version with the same pins
#[derive(Debug, Clone, Default)]
pub struct StaticDependencyFetcher {
    dependencies: BTreeMap<String, Dependency>,
    rolls: BTreeMap<String, DependencyRoll>,
}

impl StaticDependencyFetcher {
    pub fn new(
        dependencies: BTreeMap<String, Dependency>,
        rolls: BTreeMap<String, DependencyRoll>,
    ) -> Self {
        Self {
            dependencies,
            rolls,
        }
    }
}

impl DependencyFetcher for StaticDependencyFetcher {
    fn get_dependency(
        &self,
        _version: &str,
        _platform: &str,
    ) -> Result<BTreeMap<String, Dependency>, CollaboratorError> {
        Ok(self.dependencies.clone())
    }

    fn get_dependency_rolls(
        &self,
        _old_version: &str,
        _new_version: &str,
        _platform: &str,
    ) -> Result<BTreeMap<String, DependencyRoll>, CollaboratorError> {
        Ok(self.rolls.clone())
    }
}

/// Document frequencies held in a map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InMemoryInvertedIndex {
    /// Total number of documents
    pub root: Option<u64>,

    /// keyword -> number of documents containing it
    #[serde(default)]
    pub docs: BTreeMap<String, u64>,
}

impl InMemoryInvertedIndex {
    pub fn new(root: u64) -> Self {
        Self {
            root: Some(root),
            docs: BTreeMap::new(),
        }
    }

    /// Builder: record how many documents contain `keyword`
    pub fn with_keyword(mut self, keyword: impl Into<String>, n_of_doc: u64) -> Self {
        self.docs.insert(keyword.into(), n_of_doc);
        self
    }
}

impl InvertedIndex for InMemoryInvertedIndex {
    fn get(&self, keyword: &str) -> Option<u64> {
        self.docs.get(keyword).copied()
    }

    fn get_root(&self) -> Option<u64> {
        self.root
    }
}

/// Repository backed by maps keyed by revision and `(path, revision)`
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    change_logs: BTreeMap<String, ChangeLog>,
    sources: BTreeMap<(String, String), String>,
    blames: BTreeMap<(String, String), Blame>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_change_log(mut self, change_log: ChangeLog) -> Self {
        self.change_logs
            .insert(change_log.revision.clone(), change_log);
        self
    }

    pub fn with_source(
        mut self,
        path: impl Into<String>,
        revision: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.sources
            .insert((path.into(), revision.into()), content.into());
        self
    }

    /// Builder: register a blame under its own path and revision
    pub fn with_blame(mut self, blame: Blame) -> Self {
        self.blames
            .insert((blame.path.clone(), blame.revision.clone()), blame);
        self
    }
}

impl Repository for InMemoryRepository {
    fn get_change_log(&self, revision: &str) -> Result<Option<ChangeLog>, CollaboratorError> {
        Ok(self.change_logs.get(revision).cloned())
    }

    fn get_source(&self, path: &str, revision: &str) -> Result<Option<String>, CollaboratorError> {
        Ok(self
            .sources
            .get(&(path.to_string(), revision.to_string()))
            .cloned())
    }

    fn get_blame(&self, path: &str, revision: &str) -> Result<Option<Blame>, CollaboratorError> {
        Ok(self
            .blames
            .get(&(path.to_string(), revision.to_string()))
            .cloned())
    }
}
