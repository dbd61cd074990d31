use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One example: an optional hard label, a sparse named-feature map, the
/// integer-indexed vector derived from it, a soft distribution over
/// classes, a scratch slot for a hidden label, and the sampler's label
/// trace.
///
/// The vector is only meaningful relative to the feature alphabet it was
/// built against; [`Dataset::make_vectors`](super::Dataset::make_vectors)
/// rebuilds it after any alphabet change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    label: Option<String>,
    /// Kept sorted by name so alphabet construction is deterministic.
    features: BTreeMap<String, f64>,
    vector: BTreeMap<usize, f64>,
    class_probabilities: HashMap<String, f64>,
    scratch: Option<String>,
    sequence: Vec<usize>,
}

impl Instance {
    /// Creates an empty unlabeled instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unlabeled instance (alias of [`Instance::new`]).
    #[must_use]
    pub fn unlabeled() -> Self {
        Self::default()
    }

    /// Creates an instance with a hard label.
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Adds a feature, builder style.
    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Adds or overwrites a feature.
    pub fn add_feature(&mut self, name: impl Into<String>, value: f64) {
        self.features.insert(name.into(), value);
    }

    /// The value of a named feature, if present.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }

    /// The sparse named-feature map, ordered by feature name.
    #[must_use]
    pub fn features(&self) -> &BTreeMap<String, f64> {
        &self.features
    }

    /// Mutable access to the feature map (feature selection trims it).
    pub fn features_mut(&mut self) -> &mut BTreeMap<String, f64> {
        &mut self.features
    }

    /// The hard label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets or clears the hard label.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Moves the label into the scratch slot, clearing it.
    pub(crate) fn hide_label(&mut self) {
        self.scratch = self.label.take();
    }

    /// Moves the scratch slot back into the label.
    pub(crate) fn restore_label(&mut self) {
        self.label = self.scratch.take();
    }

    /// The hidden true label, if one was stashed by `hide_labels`.
    #[must_use]
    pub fn scratch(&self) -> Option<&str> {
        self.scratch.as_deref()
    }

    /// The value at a vector dimension, if set.
    #[must_use]
    pub fn dimension(&self, index: usize) -> Option<f64> {
        self.vector.get(&index).copied()
    }

    /// The sparse index-ordered vector.
    #[must_use]
    pub fn vector(&self) -> &BTreeMap<usize, f64> {
        &self.vector
    }

    /// Clears the vector; it must be rebuilt before the next use.
    pub fn reset_vector(&mut self) {
        self.vector.clear();
    }

    /// Sets a vector dimension.
    pub fn set_dimension(&mut self, index: usize, value: f64) {
        self.vector.insert(index, value);
    }

    /// The soft distribution over class names.
    #[must_use]
    pub fn class_probabilities(&self) -> &HashMap<String, f64> {
        &self.class_probabilities
    }

    /// The probability assigned to one class, 0 if the class is unknown.
    #[must_use]
    pub fn class_probability(&self, label: &str) -> f64 {
        self.class_probabilities.get(label).copied().unwrap_or(0.0)
    }

    /// Hard one-hot assignment derived from this instance's label.
    ///
    /// Every listed class gets probability 0 except the instance's own
    /// label, which gets 1. No-op on unlabeled instances.
    pub fn set_one_hot_distribution(&mut self, labels: &[String]) {
        let Some(own) = self.label.clone() else {
            return;
        };
        for label in labels {
            let p = if *label == own { 1.0 } else { 0.0 };
            self.class_probabilities.insert(label.clone(), p);
        }
    }

    /// Soft assignment, e.g. obtained from a classifier's E-step.
    pub fn set_class_distribution(&mut self, distribution: HashMap<String, f64>) {
        self.class_probabilities = distribution;
    }

    /// The latent-label trace recorded during Gibbs sampling.
    #[must_use]
    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    /// Appends a sampled label to the trace.
    pub fn push_sample(&mut self, label: usize) {
        self.sequence.push(label);
    }

    /// Sum of all feature values.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.features.values().sum()
    }

    /// Euclidean norm of the feature map.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.features.values().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scales the feature map to unit length.
    ///
    /// Operates on the named features; regenerate the vector afterwards.
    pub fn normalize(&mut self) {
        let length = self.length();
        if length > 0.0 {
            for value in self.features.values_mut() {
                *value /= length;
            }
        }
    }
}
