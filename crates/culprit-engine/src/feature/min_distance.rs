//! Distance between a suspect's changed lines and the crashed lines.

use super::touch_crashed_file::CrashedFileMatcher;
use super::{log_linearly_scaled, ChangedFile, Feature, FeatureValue, PreparedFeature};
use crate::collaborators::Repository;
use crate::matcher::{CrashMatches, FrameInfo};
use crate::model::{CrashReport, FileChangeInfo, Suspect};
use crate::stacktrace::StackFrame;
use crate::utils::error::EngineError;
use log::{debug, warn};
use std::sync::Arc;

pub const MIN_DISTANCE: &str = "MinDistance";

/// Default distance at and beyond which the signal vanishes
pub const DEFAULT_MAX_DISTANCE: f64 = 50.0;

/// Gap between two inclusive line ranges, 0 when they overlap
///
/// # Errors
/// * `EngineError::InvalidLineRange` - Either range ends before it starts
pub fn distance_between_line_ranges(
    range_1: (u32, u32),
    range_2: (u32, u32),
) -> Result<u32, EngineError> {
    for (start, end) in [range_1, range_2] {
        if start > end {
            return Err(EngineError::InvalidLineRange { start, end });
        }
    }

    let max_start = range_1.0.max(range_2.0);
    let min_end = range_1.1.min(range_2.1);
    Ok(max_start.saturating_sub(min_end))
}

/// Minimum line distance over all crashed files the suspect touched
pub struct MinDistanceFeature {
    max_distance: f64,
    repository: Option<Arc<dyn Repository>>,
    match_renamed_old_path: bool,
}

impl MinDistanceFeature {
    /// # Arguments
    /// * `max_distance` - Distance mapped to zero confidence
    /// * `repository` - Blame source for files without cached analysis
    /// * `match_renamed_old_path` - Also match renamed files by old path
    pub fn new(
        max_distance: f64,
        repository: Option<Arc<dyn Repository>>,
        match_renamed_old_path: bool,
    ) -> Self {
        Self {
            max_distance,
            repository,
            match_renamed_old_path,
        }
    }
}

impl Feature for MinDistanceFeature {
    fn name(&self) -> &str {
        MIN_DISTANCE
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedFeature + 'r> {
        Box::new(PreparedMinDistance {
            matcher: CrashedFileMatcher::new(report, self.match_renamed_old_path),
            max_distance: self.max_distance,
            repository: self.repository.as_deref(),
        })
    }
}

struct PreparedMinDistance<'r> {
    matcher: CrashedFileMatcher<'r>,
    max_distance: f64,
    repository: Option<&'r dyn Repository>,
}

struct Closest<'a> {
    distance: f64,
    touched: &'a FileChangeInfo,
    frame: &'a StackFrame,
}

impl PreparedMinDistance<'_> {
    /// Distance of one touched file to the closest of `frame_infos`
    fn file_distance<'a>(
        &self,
        suspect: &'a Suspect,
        touched: &FileChangeInfo,
        frame_infos: &'a [FrameInfo],
    ) -> Option<(f64, &'a StackFrame)> {
        if let Some(info) = suspect.file_to_analysis_info.get(touched.path()) {
            let frame = info
                .min_distance_frame
                .as_ref()
                .or_else(|| frame_infos.first().map(|frame_info| &frame_info.frame))?;
            return Some((info.min_distance, frame));
        }

        if touched.is_delete() {
            return None;
        }
        let repository = self.repository?;
        let report = self.matcher.report();
        let revision = report.dependency_revision(&suspect.dep_path)?;

        let blame = match repository.get_blame(touched.path(), revision) {
            Ok(Some(blame)) => blame,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to blame {}@{}: {}", touched.path(), revision, e);
                return None;
            }
        };

        let mut closest: Option<(f64, &StackFrame)> = None;
        for frame_info in frame_infos {
            let Some(crashed_range) = frame_info.frame.crashed_line_range() else {
                continue;
            };
            for region in blame.regions_of(suspect.revision()) {
                let distance =
                    match distance_between_line_ranges((region.start, region.end()), crashed_range)
                    {
                        Ok(distance) => f64::from(distance),
                        Err(e) => {
                            warn!("Skipping frame {}: {}", frame_info.frame, e);
                            continue;
                        }
                    };
                if closest.map_or(true, |(best, _)| distance < best) {
                    closest = Some((distance, &frame_info.frame));
                }
            }
        }
        closest
    }
}

impl PreparedFeature for PreparedMinDistance<'_> {
    fn score(&self, suspect: &Suspect, matches: Option<&CrashMatches>) -> FeatureValue {
        let matches = self.matcher.resolve(suspect, matches);
        if matches.is_empty() {
            warn!("No crashed file touched by {}", suspect.revision());
            return FeatureValue::zero(MIN_DISTANCE)
                .with_reason("No touched file matches a crashed file");
        }

        let mut closest: Option<Closest<'_>> = None;
        for crash_match in matches.values() {
            for touched in &crash_match.touched_files {
                let Some((distance, frame)) =
                    self.file_distance(suspect, touched, &crash_match.frame_infos)
                else {
                    continue;
                };
                if closest.as_ref().map_or(true, |best| distance < best.distance) {
                    closest = Some(Closest {
                        distance,
                        touched,
                        frame,
                    });
                }
            }
        }

        let Some(closest) = closest else {
            warn!("No line distance available for {}", suspect.revision());
            return FeatureValue::zero(MIN_DISTANCE)
                .with_reason("No changed line could be located near a crashed line");
        };

        let value = log_linearly_scaled(closest.distance, self.max_distance);
        debug!(
            "{}: min distance {} in frame #{}",
            suspect.revision(),
            closest.distance,
            closest.frame.index
        );

        let reason = format!("Minimum distance is {}", closest.distance);
        if value == f64::NEG_INFINITY {
            return FeatureValue::zero(MIN_DISTANCE).with_reason(reason);
        }

        let report = self.matcher.report();
        let revision = report
            .dependency_revision(&closest.frame.dep_path)
            .unwrap_or(&report.crashed_version);
        let changed_file = ChangedFile::new(
            closest.touched.path(),
            closest.frame.blame_url(revision),
            vec![format!(
                "Distance between touched lines and stacktrace lines is {}, in frame #{}",
                closest.distance, closest.frame.index
            )],
        );

        FeatureValue::new(MIN_DISTANCE, value)
            .with_reason(reason)
            .with_changed_files(vec![changed_file])
    }
}
