//! Features: named signals of how well a suspect explains a crash.
//!
//! Every feature value lives in the log domain, `(-inf, 0]`: `0` is full
//! confidence and `-inf` means no signal at all. Features are used in two
//! steps. [`Feature::prepare`] runs once per crash report and does the
//! expensive indexing; the resulting [`PreparedFeature`] is then scored once
//! per suspect, possibly from many threads.

pub mod file_path_idf;
pub mod min_distance;
pub mod top_frame_index;
pub mod touch_crashed_component;
pub mod touch_crashed_directory;
pub mod touch_crashed_file;

pub use file_path_idf::FilePathIdfFeature;
pub use min_distance::{distance_between_line_ranges, MinDistanceFeature};
pub use top_frame_index::TopFrameIndexFeature;
pub use touch_crashed_component::TouchCrashedComponentFeature;
pub use touch_crashed_directory::TouchCrashedDirectoryFeature;
pub use touch_crashed_file::{TouchCrashedFileFeature, TouchCrashedFileMetaFeature};

use crate::matcher::CrashMatches;
use crate::model::{CrashReport, Suspect};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Name of the top-level meta feature built by the engine
pub const WRAPPER_META_FEATURE: &str = "WrapperMetaFeature";

/// An evidence file shown next to a suspect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub name: String,
    pub blame_url: Option<String>,
    pub reasons: Vec<String>,
}

impl ChangedFile {
    pub fn new(name: impl Into<String>, blame_url: Option<String>, reasons: Vec<String>) -> Self {
        Self {
            name: name.into(),
            blame_url,
            reasons,
        }
    }
}

/// Output of a single feature for a single suspect
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureValue {
    pub name: String,

    /// Log-domain value in `(-inf, 0]`
    pub value: f64,

    pub reason: Option<Vec<String>>,

    pub changed_files: Vec<ChangedFile>,
}

impl FeatureValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            reason: None,
            changed_files: Vec::new(),
        }
    }

    /// The log-domain zero: no signal
    pub fn zero(name: impl Into<String>) -> Self {
        Self::new(name, f64::NEG_INFINITY)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason.get_or_insert_with(Vec::new).push(reason.into());
        self
    }

    pub fn with_changed_files(mut self, changed_files: Vec<ChangedFile>) -> Self {
        self.changed_files = changed_files;
        self
    }

    /// Whether the value carries zero linear-domain probability
    pub fn is_log_zero(&self) -> bool {
        self.value == f64::NEG_INFINITY
    }
}

/// One entry of a [`MetaFeatureValue`]
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureEntry {
    Value(FeatureValue),
    Meta(MetaFeatureValue),
}

/// Named, possibly nested feature values
#[derive(Debug, Clone, PartialEq)]
pub struct MetaFeatureValue {
    pub name: String,
    values: BTreeMap<String, FeatureEntry>,
}

impl MetaFeatureValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder: add a leaf value under its own name
    pub fn with_value(mut self, value: FeatureValue) -> Self {
        self.values
            .insert(value.name.clone(), FeatureEntry::Value(value));
        self
    }

    /// Builder: add a nested meta value under its own name
    pub fn with_meta(mut self, meta: MetaFeatureValue) -> Self {
        self.values.insert(meta.name.clone(), FeatureEntry::Meta(meta));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureEntry> {
        self.values.get(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FeatureEntry> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Every leaf value, depth first in name order
    pub fn leaves(&self) -> Vec<&FeatureValue> {
        let mut leaves = Vec::new();
        for entry in self.values.values() {
            match entry {
                FeatureEntry::Value(value) => leaves.push(value),
                FeatureEntry::Meta(meta) => leaves.extend(meta.leaves()),
            }
        }
        leaves
    }
}

/// A single signal
pub trait Feature: Send + Sync {
    fn name(&self) -> &str;

    /// Precompute whatever depends only on the crash report
    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedFeature + 'r>;
}

/// A feature closed over one crash report
pub trait PreparedFeature: Send + Sync {
    /// Score one suspect
    ///
    /// `matches` are crashed-file matches already computed by an enclosing
    /// meta feature; features that need them compute their own when `None`.
    fn score(&self, suspect: &Suspect, matches: Option<&CrashMatches>) -> FeatureValue;
}

/// A named group of features scored together
pub trait MetaFeature: Send + Sync {
    fn name(&self) -> &str;

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedMetaFeature + 'r>;
}

/// A meta feature closed over one crash report
pub trait PreparedMetaFeature: Send + Sync {
    fn score(&self, suspect: &Suspect) -> MetaFeatureValue;
}

/// Child of a [`WrapperMetaFeature`]
pub enum FeatureNode {
    Leaf(Box<dyn Feature>),
    Meta(Box<dyn MetaFeature>),
}

impl FeatureNode {
    pub fn name(&self) -> &str {
        match self {
            FeatureNode::Leaf(feature) => feature.name(),
            FeatureNode::Meta(feature) => feature.name(),
        }
    }
}

enum PreparedNode<'r> {
    Leaf(Box<dyn PreparedFeature + 'r>),
    Meta(Box<dyn PreparedMetaFeature + 'r>),
}

/// Meta feature that simply groups its children under their names
pub struct WrapperMetaFeature {
    name: String,
    children: Vec<FeatureNode>,
}

impl WrapperMetaFeature {
    pub fn new(name: impl Into<String>, children: Vec<FeatureNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

impl MetaFeature for WrapperMetaFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedMetaFeature + 'r> {
        let children = self
            .children
            .iter()
            .map(|child| match child {
                FeatureNode::Leaf(feature) => PreparedNode::Leaf(feature.prepare(report)),
                FeatureNode::Meta(feature) => PreparedNode::Meta(feature.prepare(report)),
            })
            .collect();

        Box::new(PreparedWrapper {
            name: &self.name,
            children,
        })
    }
}

struct PreparedWrapper<'r> {
    name: &'r str,
    children: Vec<PreparedNode<'r>>,
}

impl PreparedMetaFeature for PreparedWrapper<'_> {
    fn score(&self, suspect: &Suspect) -> MetaFeatureValue {
        self.children
            .iter()
            .fold(MetaFeatureValue::new(self.name), |meta, child| match child {
                PreparedNode::Leaf(feature) => meta.with_value(feature.score(suspect, None)),
                PreparedNode::Meta(feature) => meta.with_meta(feature.score(suspect)),
            })
    }
}

/// `ln(1 - min(value, max_value) / max_value)`
///
/// Maps a non-negative "smaller is better" quantity onto `(-inf, 0]`:
/// `0` gives `0`, anything at or past `max_value` gives `-inf`.
pub fn log_linearly_scaled(value: f64, max_value: f64) -> f64 {
    if max_value <= 0.0 || value.is_nan() {
        return f64::NEG_INFINITY;
    }

    let clamped = value.max(0.0).min(max_value);
    (1.0 - clamped / max_value).ln()
}

/// Logistic function, used to squash unbounded signals into `(0, 1)`
pub fn log_regress_normalize(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_linearly_scaled_bounds() {
        assert_eq!(log_linearly_scaled(0.0, 50.0), 0.0);
        assert_eq!(log_linearly_scaled(50.0, 50.0), f64::NEG_INFINITY);
        assert_eq!(log_linearly_scaled(80.0, 50.0), f64::NEG_INFINITY);
        assert_eq!(log_linearly_scaled(f64::INFINITY, 50.0), f64::NEG_INFINITY);
        assert!((log_linearly_scaled(25.0, 50.0) - 0.5f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_linearly_scaled_is_monotonic() {
        let values: Vec<f64> = (0..=60).map(|d| log_linearly_scaled(d as f64, 50.0)).collect();
        assert!(values.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_log_regress_normalize() {
        assert_eq!(log_regress_normalize(0.0), 0.5);
        assert!(log_regress_normalize(10.0) > 0.99);
        assert!(log_regress_normalize(-10.0) < 0.01);
    }

    #[test]
    fn test_meta_feature_value_leaves() {
        let inner = MetaFeatureValue::new("inner").with_value(FeatureValue::new("b", -1.0));
        let outer = MetaFeatureValue::new("outer")
            .with_value(FeatureValue::new("a", 0.0))
            .with_meta(inner);

        let names: Vec<&str> = outer.leaves().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
