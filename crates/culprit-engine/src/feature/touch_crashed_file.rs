//! Crashed-file features and the meta feature that shares their matching.

use super::{
    Feature, FeatureValue, MetaFeature, MetaFeatureValue, PreparedFeature, PreparedMetaFeature,
};
use crate::matcher::{
    index_frames_with_crashed_group, match_suspect_with_frame_infos, touches_crashed_file,
    CrashMatches, CrashedGroup, DependencyFrameIndex,
};
use crate::model::{CrashReport, Suspect};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const TOUCH_CRASHED_FILE: &str = "TouchCrashedFile";
pub const TOUCH_CRASHED_FILE_META: &str = "TouchCrashedFileMeta";

/// Crashed-file matching for one report, indexed on first use
///
/// File-level features receive matches from [`TouchCrashedFileMetaFeature`];
/// the index is only built when one is scored on its own.
pub(crate) struct CrashedFileMatcher<'r> {
    report: &'r CrashReport,
    match_renamed_old_path: bool,
    index: OnceLock<DependencyFrameIndex>,
}

impl<'r> CrashedFileMatcher<'r> {
    pub(crate) fn new(report: &'r CrashReport, match_renamed_old_path: bool) -> Self {
        Self {
            report,
            match_renamed_old_path,
            index: OnceLock::new(),
        }
    }

    pub(crate) fn report(&self) -> &'r CrashReport {
        self.report
    }

    fn compute(&self, suspect: &Suspect) -> CrashMatches {
        let index = self.index.get_or_init(|| {
            index_frames_with_crashed_group(
                &self.report.stacktrace,
                CrashedGroup::file,
                &self.report.dependencies,
            )
        });
        match_suspect_with_frame_infos(suspect, index, |touched, group| {
            touches_crashed_file(touched, group, self.match_renamed_old_path)
        })
    }

    /// Use `given` matches when present, else compute them
    pub(crate) fn resolve<'a>(
        &self,
        suspect: &Suspect,
        given: Option<&'a CrashMatches>,
    ) -> Cow<'a, CrashMatches> {
        match given {
            Some(matches) => Cow::Borrowed(matches),
            None => Cow::Owned(self.compute(suspect)),
        }
    }
}

/// Binary signal: did the suspect touch a crashed file
pub struct TouchCrashedFileFeature {
    match_renamed_old_path: bool,
}

impl TouchCrashedFileFeature {
    pub fn new(match_renamed_old_path: bool) -> Self {
        Self {
            match_renamed_old_path,
        }
    }
}

impl Feature for TouchCrashedFileFeature {
    fn name(&self) -> &str {
        TOUCH_CRASHED_FILE
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedFeature + 'r> {
        Box::new(PreparedTouchCrashedFile {
            matcher: CrashedFileMatcher::new(report, self.match_renamed_old_path),
        })
    }
}

struct PreparedTouchCrashedFile<'r> {
    matcher: CrashedFileMatcher<'r>,
}

impl PreparedFeature for PreparedTouchCrashedFile<'_> {
    fn score(&self, suspect: &Suspect, matches: Option<&CrashMatches>) -> FeatureValue {
        let matches = self.matcher.resolve(suspect, matches);
        if matches.is_empty() {
            return FeatureValue::zero(TOUCH_CRASHED_FILE);
        }

        let touched: BTreeSet<&str> = matches
            .values()
            .flat_map(|crash_match| crash_match.touched_files.iter())
            .map(|touched| touched.path())
            .collect();
        let touched: Vec<&str> = touched.into_iter().collect();

        FeatureValue::new(TOUCH_CRASHED_FILE, 0.0)
            .with_reason(format!("Touched crashed file {}", touched.join(", ")))
    }
}

/// Groups the features that depend on crashed-file matches
///
/// Matches are computed once per suspect and handed to every child.
pub struct TouchCrashedFileMetaFeature {
    features: Vec<Box<dyn Feature>>,
    match_renamed_old_path: bool,
}

impl TouchCrashedFileMetaFeature {
    pub fn new(features: Vec<Box<dyn Feature>>, match_renamed_old_path: bool) -> Self {
        Self {
            features,
            match_renamed_old_path,
        }
    }
}

impl MetaFeature for TouchCrashedFileMetaFeature {
    fn name(&self) -> &str {
        TOUCH_CRASHED_FILE_META
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedMetaFeature + 'r> {
        let index = index_frames_with_crashed_group(
            &report.stacktrace,
            CrashedGroup::file,
            &report.dependencies,
        );

        Box::new(PreparedTouchCrashedFileMeta {
            index,
            match_renamed_old_path: self.match_renamed_old_path,
            features: self
                .features
                .iter()
                .map(|feature| feature.prepare(report))
                .collect(),
        })
    }
}

struct PreparedTouchCrashedFileMeta<'r> {
    index: DependencyFrameIndex,
    match_renamed_old_path: bool,
    features: Vec<Box<dyn PreparedFeature + 'r>>,
}

impl PreparedMetaFeature for PreparedTouchCrashedFileMeta<'_> {
    fn score(&self, suspect: &Suspect) -> MetaFeatureValue {
        let matches = match_suspect_with_frame_infos(suspect, &self.index, |touched, group| {
            touches_crashed_file(touched, group, self.match_renamed_old_path)
        });

        self.features
            .iter()
            .fold(MetaFeatureValue::new(TOUCH_CRASHED_FILE_META), |meta, feature| {
                meta.with_value(feature.score(suspect, Some(&matches)))
            })
    }
}
