//! How close to the top of the stack the suspect's crashed file appears.

use super::touch_crashed_file::CrashedFileMatcher;
use super::{log_linearly_scaled, Feature, FeatureValue, PreparedFeature};
use crate::matcher::CrashMatches;
use crate::model::{CrashReport, Suspect};

pub const TOP_FRAME_INDEX: &str = "TopFrameIndex";

/// Default frame index at and beyond which the signal vanishes
pub const DEFAULT_MAX_FRAME_INDEX: f64 = 7.0;

/// Index of the topmost matched frame, scaled against `max_frame_index`
pub struct TopFrameIndexFeature {
    max_frame_index: f64,
    match_renamed_old_path: bool,
}

impl TopFrameIndexFeature {
    pub fn new(max_frame_index: f64, match_renamed_old_path: bool) -> Self {
        Self {
            max_frame_index,
            match_renamed_old_path,
        }
    }
}

impl Feature for TopFrameIndexFeature {
    fn name(&self) -> &str {
        TOP_FRAME_INDEX
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedFeature + 'r> {
        Box::new(PreparedTopFrameIndex {
            matcher: CrashedFileMatcher::new(report, self.match_renamed_old_path),
            max_frame_index: self.max_frame_index,
        })
    }
}

struct PreparedTopFrameIndex<'r> {
    matcher: CrashedFileMatcher<'r>,
    max_frame_index: f64,
}

impl PreparedFeature for PreparedTopFrameIndex<'_> {
    fn score(&self, suspect: &Suspect, matches: Option<&CrashMatches>) -> FeatureValue {
        let matches = self.matcher.resolve(suspect, matches);

        let top_frame_index = matches
            .values()
            .flat_map(|crash_match| crash_match.frame_infos.iter())
            .map(|frame_info| frame_info.frame.index)
            .min();

        match top_frame_index {
            Some(index) => FeatureValue::new(
                TOP_FRAME_INDEX,
                log_linearly_scaled(f64::from(index), self.max_frame_index),
            )
            .with_reason(format!("Top frame is #{}", index)),
            None => FeatureValue::zero(TOP_FRAME_INDEX),
        }
    }
}
