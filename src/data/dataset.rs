use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Alphabet, Instance};
use crate::error::{Result, SemisupError};

/// Ordered collection of instances plus the alphabets that index them.
///
/// Every instance's vector is only valid against the dataset's *current*
/// alphabets; call [`Dataset::make_vectors`] after any alphabet change.
///
/// # Examples
///
/// ```
/// use semisup::data::{Dataset, Instance};
///
/// let mut dataset = Dataset::new();
/// dataset.add(Instance::labeled("yes").with_feature("fever", 1.0));
/// dataset.add(Instance::labeled("no").with_feature("cough", 2.0));
/// dataset.make_alphabets();
/// dataset.make_vectors();
/// assert_eq!(dataset.num_dimensions(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    instances: Vec<Instance>,
    feature_alphabet: Alphabet,
    label_alphabet: Alphabet,
}

/// One fold of an n-fold partition: everything outside the fold (`pool`)
/// and the fold itself (`test`).
#[derive(Debug, Clone)]
pub struct Split {
    /// Instances not assigned to the fold; training/selection pool.
    pub pool: Dataset,
    /// Instances assigned to the fold; held-out test set.
    pub test: Dataset,
}

impl Dataset {
    /// Creates an empty dataset with empty alphabets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dataset owning the given instances.
    ///
    /// Alphabets start empty; call [`Dataset::make_alphabets`].
    #[must_use]
    pub fn from_instances(instances: Vec<Instance>) -> Self {
        Self {
            instances,
            ..Self::default()
        }
    }

    /// Creates a dataset by deep-copying the instances of several sources,
    /// in order. Alphabets start empty.
    #[must_use]
    pub fn from_parts(parts: &[&Dataset]) -> Self {
        let mut instances = Vec::new();
        for part in parts {
            instances.extend(part.instances.iter().cloned());
        }
        Self::from_instances(instances)
    }

    /// Appends a single instance.
    pub fn add(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    /// Appends copies of the given instances.
    pub fn extend(&mut self, instances: &[Instance]) {
        self.instances.extend(instances.iter().cloned());
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// True if the dataset holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of distinct classes in the label alphabet.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.label_alphabet.len()
    }

    /// Number of distinct features in the feature alphabet.
    #[must_use]
    pub fn num_dimensions(&self) -> usize {
        self.feature_alphabet.len()
    }

    /// The instances, in order.
    #[must_use]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Mutable access to the instances.
    pub fn instances_mut(&mut self) -> &mut [Instance] {
        &mut self.instances
    }

    /// The label alphabet.
    #[must_use]
    pub fn label_alphabet(&self) -> &Alphabet {
        &self.label_alphabet
    }

    /// The feature alphabet.
    #[must_use]
    pub fn feature_alphabet(&self) -> &Alphabet {
        &self.feature_alphabet
    }

    /// Installs alphabets generated elsewhere (e.g. from a larger dataset
    /// during training). Invalidates existing vectors.
    pub fn set_alphabets(&mut self, label_alphabet: &Alphabet, feature_alphabet: &Alphabet) {
        self.label_alphabet = label_alphabet.clone();
        self.feature_alphabet = feature_alphabet.clone();
    }

    /// Installs only the label alphabet.
    pub fn set_label_alphabet(&mut self, label_alphabet: &Alphabet) {
        self.label_alphabet = label_alphabet.clone();
    }

    /// Installs only the feature alphabet. Invalidates existing vectors.
    pub fn set_feature_alphabet(&mut self, feature_alphabet: &Alphabet) {
        self.feature_alphabet = feature_alphabet.clone();
    }

    /// Rebuilds both alphabets from the current instances.
    ///
    /// Always starts from empty alphabets: labels are collected in a first
    /// pass, feature names in a second. Unlabeled instances contribute no
    /// label token. Feature names arrive in sorted order within each
    /// instance, so structurally identical datasets build identical
    /// alphabets.
    pub fn make_alphabets(&mut self) {
        self.label_alphabet = Alphabet::new();
        self.feature_alphabet = Alphabet::new();

        for instance in &self.instances {
            if let Some(label) = instance.label() {
                self.label_alphabet.add(label);
            }
        }
        for instance in &self.instances {
            for feature in instance.features().keys() {
                self.feature_alphabet.add(feature);
            }
        }
    }

    /// Rebuilds only the label alphabet, for callers that already hold
    /// sparse vectors and do not need feature indexing.
    pub fn make_label_alphabet(&mut self) {
        self.label_alphabet = Alphabet::new();
        for instance in &self.instances {
            if let Some(label) = instance.label() {
                self.label_alphabet.add(label);
            }
        }
    }

    /// Rebuilds every instance's sparse vector against the current feature
    /// alphabet. Features absent from the alphabet are silently dropped.
    pub fn make_vectors(&mut self) {
        for instance in &mut self.instances {
            instance.reset_vector();
            let mut entries: Vec<(usize, f64)> = Vec::with_capacity(instance.features().len());
            for (feature, &value) in instance.features() {
                if let Ok(index) = self.feature_alphabet.index(feature) {
                    entries.push((index, value));
                }
            }
            for (index, value) in entries {
                instance.set_dimension(index, value);
            }
        }
    }

    /// Removes and returns `n` instances after a deterministic shuffle
    /// under `seed`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` if `n` exceeds the dataset size.
    pub fn pop_random(&mut self, n: usize, seed: u64) -> Result<Vec<Instance>> {
        if n > self.instances.len() {
            return Err(SemisupError::insufficient_data(n, self.instances.len()));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        self.instances.shuffle(&mut rng);
        Ok(self.instances.drain(..n).collect())
    }

    /// Splits into `n` folds with deterministic round-robin assignment.
    ///
    /// Every instance lands in exactly one fold and fold sizes differ by at
    /// most 1. Each [`Split`]'s pool is everything outside the fold.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `n` is zero.
    pub fn split(&self, n: usize) -> Result<Vec<Split>> {
        let assignment: Vec<usize> = (0..self.instances.len()).map(|i| i % n.max(1)).collect();
        self.splits_from_assignment(n, &assignment)
    }

    /// Splits into `n` folds with seeded random assignment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `n` is zero.
    pub fn split_seeded(&self, n: usize, seed: u64) -> Result<Vec<Split>> {
        if n == 0 {
            return Err(SemisupError::invalid_hyperparameter(
                "folds",
                n.to_string(),
                ">= 1",
            ));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let assignment: Vec<usize> = (0..self.instances.len())
            .map(|_| rng.gen_range(0..n))
            .collect();
        self.splits_from_assignment(n, &assignment)
    }

    fn splits_from_assignment(&self, n: usize, assignment: &[usize]) -> Result<Vec<Split>> {
        if n == 0 {
            return Err(SemisupError::invalid_hyperparameter(
                "folds",
                n.to_string(),
                ">= 1",
            ));
        }

        let mut splits = Vec::with_capacity(n);
        for fold in 0..n {
            let mut pool = Vec::new();
            let mut test = Vec::new();
            for (instance, &assigned) in self.instances.iter().zip(assignment) {
                if assigned == fold {
                    test.push(instance.clone());
                } else {
                    pool.push(instance.clone());
                }
            }
            splits.push(Split {
                pool: Dataset::from_instances(pool),
                test: Dataset::from_instances(test),
            });
        }
        Ok(splits)
    }

    /// Extracts two disjoint random subsets of the given sizes.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` if `n1 + n2` exceeds the dataset size.
    pub fn split_sizes(&self, n1: usize, n2: usize, seed: u64) -> Result<(Dataset, Dataset)> {
        if n1 + n2 > self.instances.len() {
            return Err(SemisupError::insufficient_data(
                n1 + n2,
                self.instances.len(),
            ));
        }
        let mut shuffled: Vec<Instance> = self.instances.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        let second = shuffled.split_off(n1).into_iter().take(n2).collect();
        Ok((
            Dataset::from_instances(shuffled),
            Dataset::from_instances(second),
        ))
    }

    /// Moves every instance's label into its scratch slot, blinding the
    /// dataset while keeping ground truth retrievable.
    pub fn hide_labels(&mut self) {
        for instance in &mut self.instances {
            instance.hide_label();
        }
    }

    /// Restores labels hidden by [`Dataset::hide_labels`].
    pub fn restore_labels(&mut self) {
        for instance in &mut self.instances {
            instance.restore_label();
        }
    }

    /// Seeds a one-hot class distribution on every instance that carries a
    /// hard label, over the given label set. Used to bootstrap EM.
    pub fn set_one_hot_distributions(&mut self, labels: &[String]) {
        for instance in &mut self.instances {
            instance.set_one_hot_distribution(labels);
        }
    }

    /// Scales every instance's feature map to unit length.
    pub fn normalize(&mut self) {
        for instance in &mut self.instances {
            instance.normalize();
        }
    }

    /// Discards features whose document frequency falls outside
    /// `[min_df, max_df]`.
    ///
    /// Alphabets are not touched and may need to be regenerated.
    pub fn discard_features(&mut self, min_df: usize, max_df: usize) {
        let mut dfs: HashMap<String, usize> = HashMap::new();
        for instance in &self.instances {
            for feature in instance.features().keys() {
                *dfs.entry(feature.clone()).or_insert(0) += 1;
            }
        }

        for instance in &mut self.instances {
            instance.features_mut().retain(|feature, _| {
                let df = dfs.get(feature).copied().unwrap_or(0);
                df >= min_df && df <= max_df
            });
        }
    }
}
