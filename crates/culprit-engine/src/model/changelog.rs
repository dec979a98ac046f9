//! Changelog records of candidate changelists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a changelist touched a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Delete,
    Modify,
    Rename,
    Copy,
}

/// A single touched-file record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileChangeInfo {
    pub change_type: ChangeType,

    #[serde(default)]
    pub old_path: Option<String>,

    #[serde(default)]
    pub new_path: Option<String>,
}

impl FileChangeInfo {
    pub fn modify(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            change_type: ChangeType::Modify,
            old_path: Some(path.clone()),
            new_path: Some(path),
        }
    }

    pub fn add(path: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Add,
            old_path: None,
            new_path: Some(path.into()),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Delete,
            old_path: Some(path.into()),
            new_path: None,
        }
    }

    pub fn rename(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Rename,
            old_path: Some(old_path.into()),
            new_path: Some(new_path.into()),
        }
    }

    pub fn copy(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self {
            change_type: ChangeType::Copy,
            old_path: Some(old_path.into()),
            new_path: Some(new_path.into()),
        }
    }

    /// The path the file lives at after the change (old path for deletions)
    pub fn path(&self) -> &str {
        match self.change_type {
            ChangeType::Delete => self.old_path.as_deref().unwrap_or(""),
            _ => self
                .new_path
                .as_deref()
                .or(self.old_path.as_deref())
                .unwrap_or(""),
        }
    }

    pub fn is_delete(&self) -> bool {
        self.change_type == ChangeType::Delete
    }
}

/// Author or committer of a changelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub time: DateTime<Utc>,
}

impl Contributor {
    pub fn new(name: impl Into<String>, email: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            time,
        }
    }
}

/// A changelist as reported by source control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeLog {
    pub author: Contributor,
    pub committer: Contributor,
    pub revision: String,

    #[serde(default)]
    pub commit_position: Option<u64>,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub touched_files: Vec<FileChangeInfo>,

    pub commit_url: String,

    #[serde(default)]
    pub code_review_url: Option<String>,

    #[serde(default)]
    pub reverted_revision: Option<String>,
}

impl ChangeLog {
    /// Author time formatted the way culprit reports show it
    pub fn author_time_string(&self) -> String {
        self.author.time.format("%a %b %d %H:%M:%S %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_factories() {
        assert_eq!(FileChangeInfo::modify("a.cc").path(), "a.cc");
        assert_eq!(FileChangeInfo::add("b.cc").old_path, None);
        assert_eq!(FileChangeInfo::delete("c.cc").path(), "c.cc");
        assert!(FileChangeInfo::delete("c.cc").is_delete());

        let renamed = FileChangeInfo::rename("old.cc", "new.cc");
        assert_eq!(renamed.path(), "new.cc");
        assert_eq!(renamed.old_path.as_deref(), Some("old.cc"));
    }

    #[test]
    fn test_changelog_rejects_unknown_fields() {
        let json = r#"{
            "author": {"name": "a", "email": "a@x.org", "time": "2016-03-31T21:24:43Z"},
            "committer": {"name": "a", "email": "a@x.org", "time": "2016-03-31T21:28:39Z"},
            "revision": "1",
            "commit_url": "https://repo/+/1",
            "surprise": true
        }"#;
        assert!(serde_json::from_str::<ChangeLog>(json).is_err());
    }

    #[test]
    fn test_author_time_string() {
        let time = Utc.with_ymd_and_hms(2016, 3, 31, 21, 24, 43).unwrap();
        let changelog = ChangeLog {
            author: Contributor::new("a", "a@x.org", time),
            committer: Contributor::new("a", "a@x.org", time),
            revision: "1".to_string(),
            commit_position: None,
            message: String::new(),
            touched_files: vec![],
            commit_url: "https://repo/+/1".to_string(),
            code_review_url: None,
            reverted_revision: None,
        };
        assert_eq!(changelog.author_time_string(), "Thu Mar 31 21:24:43 2016");
    }
}
