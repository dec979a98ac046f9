//! Joins stacktrace frames with the files a suspect touched.
//!
//! Frames are first indexed once per crash by "crashed group" (a crashed
//! file, directory or component) and dependency. Each suspect is then
//! matched against the groups of its own dependency.

use crate::dependency::Dependency;
use crate::model::{FileChangeInfo, Suspect};
use crate::stacktrace::{StackFrame, Stacktrace};
use crate::utils::paths::{dirname, is_same_file_path};
use std::collections::BTreeMap;
use std::fmt;

/// The locus of a crash a touched file can be matched against
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CrashedGroup {
    File(String),
    Directory(String),
    Component(String),
}

impl CrashedGroup {
    pub fn value(&self) -> &str {
        match self {
            CrashedGroup::File(value)
            | CrashedGroup::Directory(value)
            | CrashedGroup::Component(value) => value,
        }
    }

    /// Group a frame by its crashed file
    pub fn file(frame: &StackFrame) -> Option<CrashedGroup> {
        (!frame.file_path.is_empty()).then(|| CrashedGroup::File(frame.file_path.clone()))
    }

    /// Group a frame by the directory of its crashed file
    pub fn directory(frame: &StackFrame) -> Option<CrashedGroup> {
        let directory = dirname(&frame.file_path);
        (!directory.is_empty()).then(|| CrashedGroup::Directory(directory.to_string()))
    }
}

impl fmt::Display for CrashedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// A frame together with the priority of the stack it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame: StackFrame,
    pub priority: u32,
}

/// Touched files and frames that met in one crashed group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashMatch {
    pub crashed_group: CrashedGroup,

    /// In changelog order
    pub touched_files: Vec<FileChangeInfo>,

    /// In stacktrace order
    pub frame_infos: Vec<FrameInfo>,
}

/// crashed group -> match, for one suspect
pub type CrashMatches = BTreeMap<CrashedGroup, CrashMatch>;

/// crashed group -> frames, in stacktrace order
pub type GroupedFrameInfos = BTreeMap<CrashedGroup, Vec<FrameInfo>>;

/// dep_path -> grouped frames
pub type DependencyFrameIndex = BTreeMap<String, GroupedFrameInfos>;

/// Index every frame of a known dependency by its crashed group
///
/// # Arguments
/// * `stacktrace` - All call stacks of the crash
/// * `group_factory` - Maps a frame to its group, or `None` to skip it
/// * `dependencies` - In-scope dependencies; frames elsewhere are skipped
///
/// # Returns
/// dep_path -> crashed group -> frames, preserving stacktrace order
pub fn index_frames_with_crashed_group<F>(
    stacktrace: &Stacktrace,
    group_factory: F,
    dependencies: &BTreeMap<String, Dependency>,
) -> DependencyFrameIndex
where
    F: Fn(&StackFrame) -> Option<CrashedGroup>,
{
    let mut index = DependencyFrameIndex::new();

    for (frame, priority) in stacktrace.frames() {
        if !dependencies.contains_key(&frame.dep_path) {
            continue;
        }
        let Some(group) = group_factory(frame) else {
            continue;
        };

        index
            .entry(frame.dep_path.clone())
            .or_default()
            .entry(group)
            .or_default()
            .push(FrameInfo {
                frame: frame.clone(),
                priority,
            });
    }

    index
}

/// Match a suspect's touched files against the frames of its dependency
///
/// Every crashed group is tested against every touched file with
/// `match_fn`. Groups that no touched file matches are left out.
pub fn match_suspect_with_frame_infos<F>(
    suspect: &Suspect,
    index: &DependencyFrameIndex,
    match_fn: F,
) -> CrashMatches
where
    F: Fn(&FileChangeInfo, &CrashedGroup) -> bool,
{
    let mut matches = CrashMatches::new();
    let Some(grouped) = index.get(&suspect.dep_path) else {
        return matches;
    };

    for (group, frame_infos) in grouped {
        let touched_files: Vec<FileChangeInfo> = suspect
            .changelog
            .touched_files
            .iter()
            .filter(|touched| match_fn(touched, group))
            .cloned()
            .collect();

        if touched_files.is_empty() {
            continue;
        }

        matches.insert(
            group.clone(),
            CrashMatch {
                crashed_group: group.clone(),
                touched_files,
                frame_infos: frame_infos.clone(),
            },
        );
    }

    matches
}

/// Whether a touched file is the crashed file of `group`
///
/// Deletions are compared by their old path. Renames are also compared by
/// their old path when `match_renamed_old_path` is set.
pub fn touches_crashed_file(
    touched: &FileChangeInfo,
    group: &CrashedGroup,
    match_renamed_old_path: bool,
) -> bool {
    let CrashedGroup::File(crashed_file) = group else {
        return false;
    };

    if is_same_file_path(touched.path(), crashed_file) {
        return true;
    }

    match_renamed_old_path
        && touched.change_type == crate::model::ChangeType::Rename
        && touched
            .old_path
            .as_deref()
            .is_some_and(|old_path| is_same_file_path(old_path, crashed_file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacktrace::{CallStack, CallStackFormat};

    fn deps() -> BTreeMap<String, Dependency> {
        let mut deps = BTreeMap::new();
        deps.insert("src/".to_string(), Dependency::new("src/", "https://repo", "8"));
        deps
    }

    fn stacktrace() -> Stacktrace {
        Stacktrace::new(vec![
            CallStack::new(
                0,
                vec![
                    StackFrame::new(0, "src/", "f", "a/f.cc", "src/a/f.cc", vec![1]),
                    StackFrame::new(1, "src/", "g", "a/g.cc", "src/a/g.cc", vec![2]),
                    StackFrame::new(2, "src/v8/", "h", "h.cc", "src/v8/h.cc", vec![3]),
                ],
                CallStackFormat::Default,
            ),
            CallStack::new(
                1,
                vec![StackFrame::new(0, "src/", "f", "a/f.cc", "src/a/f.cc", vec![9])],
                CallStackFormat::Default,
            ),
        ])
    }

    #[test]
    fn test_index_skips_unknown_dependencies() {
        let index = index_frames_with_crashed_group(&stacktrace(), CrashedGroup::file, &deps());
        assert_eq!(index.len(), 1);

        let grouped = &index["src/"];
        let f_infos = &grouped[&CrashedGroup::File("a/f.cc".to_string())];
        let priorities: Vec<u32> = f_infos.iter().map(|info| info.priority).collect();
        assert_eq!(priorities, vec![0, 1]);
    }

    #[test]
    fn test_index_by_directory() {
        let index =
            index_frames_with_crashed_group(&stacktrace(), CrashedGroup::directory, &deps());
        let grouped = &index["src/"];
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&CrashedGroup::Directory("a".to_string())].len(), 3);
    }

    #[test]
    fn test_touches_crashed_file_with_renames() {
        let group = CrashedGroup::File("a/old.cc".to_string());
        let renamed = FileChangeInfo::rename("a/old.cc", "a/new.cc");

        assert!(!touches_crashed_file(&renamed, &group, false));
        assert!(touches_crashed_file(&renamed, &group, true));
        assert!(touches_crashed_file(&FileChangeInfo::delete("a/old.cc"), &group, false));
        assert!(!touches_crashed_file(
            &FileChangeInfo::modify("a/old.cc"),
            &CrashedGroup::Directory("a".to_string()),
            false
        ));
    }
}
