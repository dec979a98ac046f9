//! Binary signal at component granularity.

use super::{Feature, FeatureValue, PreparedFeature};
use crate::classifier::ComponentClassifier;
use crate::matcher::{
    index_frames_with_crashed_group, match_suspect_with_frame_infos, CrashMatches, CrashedGroup,
    DependencyFrameIndex,
};
use crate::model::{CrashReport, Suspect};
use log::warn;
use std::sync::Arc;

pub const TOUCH_CRASHED_COMPONENT: &str = "TouchCrashedComponent";

/// Did the suspect touch a file owned by a crashed component
pub struct TouchCrashedComponentFeature {
    classifier: Arc<ComponentClassifier>,
}

impl TouchCrashedComponentFeature {
    pub fn new(classifier: Arc<ComponentClassifier>) -> Self {
        Self { classifier }
    }
}

impl Feature for TouchCrashedComponentFeature {
    fn name(&self) -> &str {
        TOUCH_CRASHED_COMPONENT
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedFeature + 'r> {
        let classifier = self.classifier.as_ref();
        let index = if classifier.is_configured() {
            index_frames_with_crashed_group(
                &report.stacktrace,
                |frame| classifier.classify_frame(frame).map(CrashedGroup::Component),
                &report.dependencies,
            )
        } else {
            warn!("No component mapping, {} carries no signal", TOUCH_CRASHED_COMPONENT);
            DependencyFrameIndex::new()
        };

        Box::new(PreparedTouchCrashedComponent { classifier, index })
    }
}

struct PreparedTouchCrashedComponent<'r> {
    classifier: &'r ComponentClassifier,
    index: DependencyFrameIndex,
}

impl PreparedFeature for PreparedTouchCrashedComponent<'_> {
    fn score(&self, suspect: &Suspect, _matches: Option<&CrashMatches>) -> FeatureValue {
        if !self.classifier.is_configured() {
            return FeatureValue::zero(TOUCH_CRASHED_COMPONENT)
                .with_reason("No component mapping configured");
        }

        let matches = match_suspect_with_frame_infos(suspect, &self.index, |touched, group| {
            let CrashedGroup::Component(crashed_component) = group else {
                return false;
            };
            let full_path = format!("{}{}", suspect.dep_path, touched.path());
            self.classifier.classify_path(&full_path).as_deref() == Some(crashed_component.as_str())
        });

        if matches.is_empty() {
            return FeatureValue::zero(TOUCH_CRASHED_COMPONENT);
        }

        let components: Vec<&str> = matches.keys().map(CrashedGroup::value).collect();
        FeatureValue::new(TOUCH_CRASHED_COMPONENT, 0.0).with_reason(format!(
            "Touched files in crashed component {}",
            components.join(", ")
        ))
    }
}
