//! Binary signal at directory granularity.

use super::{Feature, FeatureValue, PreparedFeature};
use crate::matcher::{
    index_frames_with_crashed_group, match_suspect_with_frame_infos, CrashMatches, CrashedGroup,
    DependencyFrameIndex,
};
use crate::model::{CrashReport, FileChangeInfo, Suspect};
use crate::utils::paths::{dirname, is_same_file_path, is_test_file};

pub const TOUCH_CRASHED_DIRECTORY: &str = "TouchCrashedDirectory";

/// Did the suspect touch a file in a crashed directory
pub struct TouchCrashedDirectoryFeature {
    include_test_files: bool,
}

impl TouchCrashedDirectoryFeature {
    pub fn new(include_test_files: bool) -> Self {
        Self { include_test_files }
    }
}

/// Deleted files never match; test files only when `include_test_files`
fn touches_crashed_directory(
    touched: &FileChangeInfo,
    group: &CrashedGroup,
    include_test_files: bool,
) -> bool {
    let CrashedGroup::Directory(crashed_directory) = group else {
        return false;
    };
    if touched.is_delete() {
        return false;
    }

    let path = touched.path();
    if !include_test_files && is_test_file(path) {
        return false;
    }

    let directory = dirname(path);
    !directory.is_empty() && is_same_file_path(directory, crashed_directory)
}

impl Feature for TouchCrashedDirectoryFeature {
    fn name(&self) -> &str {
        TOUCH_CRASHED_DIRECTORY
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedFeature + 'r> {
        Box::new(PreparedTouchCrashedDirectory {
            index: index_frames_with_crashed_group(
                &report.stacktrace,
                CrashedGroup::directory,
                &report.dependencies,
            ),
            include_test_files: self.include_test_files,
        })
    }
}

struct PreparedTouchCrashedDirectory {
    index: DependencyFrameIndex,
    include_test_files: bool,
}

impl PreparedFeature for PreparedTouchCrashedDirectory {
    fn score(&self, suspect: &Suspect, _matches: Option<&CrashMatches>) -> FeatureValue {
        let matches = match_suspect_with_frame_infos(suspect, &self.index, |touched, group| {
            touches_crashed_directory(touched, group, self.include_test_files)
        });

        if matches.is_empty() {
            return FeatureValue::zero(TOUCH_CRASHED_DIRECTORY);
        }

        let directories: Vec<&str> = matches.keys().map(CrashedGroup::value).collect();
        FeatureValue::new(TOUCH_CRASHED_DIRECTORY, 0.0).with_reason(format!(
            "Touched files in crashed directory {}",
            directories.join(", ")
        ))
    }
}
