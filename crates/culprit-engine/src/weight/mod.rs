//! Weight algebra for the log-linear model.
//!
//! A [`MetaWeight`] mirrors the shape of a [`MetaFeatureValue`]: leaves are
//! linear-domain [`Weight`]s, inner nodes are named sub-trees. Scoring is a
//! keyed dot product over the two trees.

use crate::feature::{FeatureEntry, MetaFeatureValue};
use crate::utils::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Mul;

/// A scalar weight in the linear domain
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weight(pub f64);

impl Weight {
    pub fn value(self) -> f64 {
        self.0
    }

    /// `|w| < epsilon`
    pub fn is_zero(self, epsilon: f64) -> bool {
        self.0.abs() < epsilon
    }

    pub fn l0(self) -> f64 {
        if self.0 == 0.0 {
            0.0
        } else {
            1.0
        }
    }

    pub fn l1(self) -> f64 {
        self.0.abs()
    }

    pub fn quadrance(self) -> f64 {
        self.0 * self.0
    }
}

impl From<f64> for Weight {
    fn from(value: f64) -> Self {
        Weight(value)
    }
}

impl Mul for Weight {
    type Output = f64;

    fn mul(self, other: Weight) -> f64 {
        self.0 * other.0
    }
}

impl Mul<f64> for Weight {
    type Output = f64;

    fn mul(self, other: f64) -> f64 {
        // 0 * -inf is NaN; a zero weight silences the feature instead
        if self.0 == 0.0 {
            0.0
        } else {
            self.0 * other
        }
    }
}

/// One entry of a [`MetaWeight`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightEntry {
    Leaf(Weight),
    Meta(MetaWeight),
}

impl WeightEntry {
    pub fn is_zero(&self, epsilon: f64) -> bool {
        match self {
            WeightEntry::Leaf(weight) => weight.is_zero(epsilon),
            WeightEntry::Meta(meta) => meta.is_zero(epsilon),
        }
    }

    fn fold(&self, leaf: &impl Fn(Weight) -> f64) -> f64 {
        match self {
            WeightEntry::Leaf(weight) => leaf(*weight),
            WeightEntry::Meta(meta) => meta.fold(leaf),
        }
    }
}

impl From<Weight> for WeightEntry {
    fn from(weight: Weight) -> Self {
        WeightEntry::Leaf(weight)
    }
}

impl From<f64> for WeightEntry {
    fn from(value: f64) -> Self {
        WeightEntry::Leaf(Weight(value))
    }
}

impl From<MetaWeight> for WeightEntry {
    fn from(meta: MetaWeight) -> Self {
        WeightEntry::Meta(meta)
    }
}

/// Named, possibly nested weights
///
/// Deserializes from a plain nested table:
///
/// ```toml
/// [weights]
/// TouchCrashedDirectory = 1.0
///
/// [weights.TouchCrashedFileMeta]
/// MinDistance = 2.0
/// TopFrameIndex = 1.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaWeight(BTreeMap<String, WeightEntry>);

impl MetaWeight {
    pub fn new(weights: BTreeMap<String, WeightEntry>) -> Self {
        Self(weights)
    }

    pub fn get(&self, name: &str) -> Option<&WeightEntry> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<WeightEntry>) {
        self.0.insert(name.into(), entry.into());
    }

    /// Builder form of [`MetaWeight::insert`]
    pub fn with(mut self, name: impl Into<String>, entry: impl Into<WeightEntry>) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, WeightEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keyed dot product against a feature tree
    ///
    /// Keys missing on either side contribute 0. Neither operand is modified.
    ///
    /// # Errors
    /// * `EngineError::WeightShapeMismatch` - A leaf weight faces a nested
    ///   feature value, or the other way around
    pub fn dot(&self, features: &MetaFeatureValue) -> Result<f64, EngineError> {
        let mut total = 0.0;

        for (name, entry) in &self.0 {
            let Some(feature) = features.get(name) else {
                continue;
            };

            total += match (entry, feature) {
                (WeightEntry::Leaf(weight), FeatureEntry::Value(value)) => *weight * value.value,
                (WeightEntry::Meta(weights), FeatureEntry::Meta(values)) => weights.dot(values)?,
                _ => {
                    return Err(EngineError::WeightShapeMismatch { key: name.clone() });
                }
            };
        }

        Ok(total)
    }

    /// Whether every weight in the tree is below `epsilon`
    pub fn is_zero(&self, epsilon: f64) -> bool {
        self.0.values().all(|entry| entry.is_zero(epsilon))
    }

    /// Remove zero weights, and sub-trees left empty by that, in place
    pub fn drop_zero_weights(&mut self, epsilon: f64) {
        self.0.retain(|_, entry| match entry {
            WeightEntry::Leaf(weight) => !weight.is_zero(epsilon),
            WeightEntry::Meta(meta) => {
                meta.drop_zero_weights(epsilon);
                !meta.is_empty()
            }
        });
    }

    fn fold(&self, leaf: &impl Fn(Weight) -> f64) -> f64 {
        self.0.values().map(|entry| entry.fold(leaf)).sum()
    }

    /// Number of non-zero leaf weights
    pub fn l0(&self) -> f64 {
        self.fold(&Weight::l0)
    }

    pub fn l1(&self) -> f64 {
        self.fold(&Weight::l1)
    }

    pub fn quadrance(&self) -> f64 {
        self.fold(&Weight::quadrance)
    }

    pub fn l2(&self) -> f64 {
        self.quadrance().sqrt()
    }
}

impl<K: Into<String>, E: Into<WeightEntry>> FromIterator<(K, E)> for MetaWeight {
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, entry)| (name.into(), entry.into()))
                .collect(),
        )
    }
}
