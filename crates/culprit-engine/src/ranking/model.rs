//! Log-linear combination of feature values.
//!
//! `score(suspect) = Σ weight_i · value_i`, where every `value_i` is a
//! log-domain feature value and every `weight_i` is a linear-domain weight.

use crate::feature::{
    ChangedFile, FeatureEntry, FeatureValue, MetaFeature, MetaFeatureValue, PreparedMetaFeature,
};
use crate::model::{CrashReport, Suspect};
use crate::utils::error::EngineError;
use crate::weight::{MetaWeight, WeightEntry};
use std::collections::BTreeMap;

/// A meta feature paired with the weights that combine its values
pub struct LogLinearModel {
    meta_feature: Box<dyn MetaFeature>,
    weights: MetaWeight,
    epsilon: f64,
}

impl LogLinearModel {
    /// Zero weights (below `epsilon`) are dropped up front
    pub fn new(meta_feature: Box<dyn MetaFeature>, mut weights: MetaWeight, epsilon: f64) -> Self {
        weights.drop_zero_weights(epsilon);
        Self {
            meta_feature,
            weights,
            epsilon,
        }
    }

    pub fn weights(&self) -> &MetaWeight {
        &self.weights
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Close the model over one crash report
    pub fn prepare<'r>(&'r self, report: &'r CrashReport) -> PreparedModel<'r> {
        PreparedModel {
            features: self.meta_feature.prepare(report),
            weights: &self.weights,
        }
    }

    /// Number of non-zero weights
    pub fn l0(&self) -> f64 {
        self.weights.l0()
    }

    pub fn l1(&self) -> f64 {
        self.weights.l1()
    }

    pub fn quadrance(&self) -> f64 {
        self.weights.quadrance()
    }

    pub fn l2(&self) -> f64 {
        self.weights.l2()
    }
}

/// A model closed over one crash report
pub struct PreparedModel<'r> {
    features: Box<dyn PreparedMetaFeature + 'r>,
    weights: &'r MetaWeight,
}

impl PreparedModel<'_> {
    /// Feature values of one suspect
    pub fn features(&self, suspect: &Suspect) -> MetaFeatureValue {
        self.features.score(suspect)
    }

    /// Log-domain score of precomputed feature values
    ///
    /// # Errors
    /// * `EngineError::WeightShapeMismatch` - Weights and features disagree
    pub fn score(&self, features: &MetaFeatureValue) -> Result<f64, EngineError> {
        self.weights.dot(features)
    }

    /// One line per weighted feature with a reason, sorted by feature name
    ///
    /// Features at log-zero are left out.
    pub fn format_reasons(&self, features: &MetaFeatureValue) -> Vec<String> {
        let mut reasons = Vec::new();
        collect_reasons(self.weights, features, &mut reasons);
        reasons.sort_by(|a, b| a.0.cmp(&b.0));
        reasons
            .into_iter()
            .map(|(name, score, reason)| format!("{}: {:.2} -- {}", name, score, reason))
            .collect()
    }

    /// Evidence files of all weighted features, merged by file name
    ///
    /// # Errors
    /// * `EngineError::BlameUrlMismatch` - Two features disagree on the blame
    ///   URL of the same file
    pub fn aggregate_changed_files(
        &self,
        features: &MetaFeatureValue,
    ) -> Result<Vec<ChangedFile>, EngineError> {
        let mut weighted = Vec::new();
        collect_weighted(self.weights, features, &mut weighted);

        let mut merged: BTreeMap<String, ChangedFile> = BTreeMap::new();
        for value in weighted {
            for changed_file in &value.changed_files {
                let Some(existing) = merged.get_mut(&changed_file.name) else {
                    merged.insert(changed_file.name.clone(), changed_file.clone());
                    continue;
                };

                match (&existing.blame_url, &changed_file.blame_url) {
                    (Some(first), Some(second)) if first != second => {
                        return Err(EngineError::BlameUrlMismatch {
                            file: changed_file.name.clone(),
                            first: Some(first.clone()),
                            second: Some(second.clone()),
                        });
                    }
                    (None, Some(second)) => existing.blame_url = Some(second.clone()),
                    _ => {}
                }
                existing.reasons.extend(changed_file.reasons.iter().cloned());
            }
        }

        Ok(merged.into_values().collect())
    }
}

/// Leaf feature values that carry a weight
fn collect_weighted<'a>(
    weights: &MetaWeight,
    features: &'a MetaFeatureValue,
    out: &mut Vec<&'a FeatureValue>,
) {
    for (name, entry) in weights.iter() {
        match (entry, features.get(name)) {
            (WeightEntry::Leaf(_), Some(FeatureEntry::Value(value))) => out.push(value),
            (WeightEntry::Meta(weights), Some(FeatureEntry::Meta(features))) => {
                collect_weighted(weights, features, out)
            }
            _ => {}
        }
    }
}

fn collect_reasons(
    weights: &MetaWeight,
    features: &MetaFeatureValue,
    out: &mut Vec<(String, f64, String)>,
) {
    for (name, entry) in weights.iter() {
        match (entry, features.get(name)) {
            (WeightEntry::Leaf(weight), Some(FeatureEntry::Value(value))) => {
                if value.is_log_zero() {
                    continue;
                }
                if let Some(reason) = &value.reason {
                    out.push((name.clone(), *weight * value.value, reason.join("\n")));
                }
            }
            (WeightEntry::Meta(weights), Some(FeatureEntry::Meta(features))) => {
                collect_reasons(weights, features, out)
            }
            _ => {}
        }
    }
}
