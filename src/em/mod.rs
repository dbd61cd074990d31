//! Multinomial Naive Bayes under soft labels, and the EM training loop.
//!
//! The model follows Nigam et al. (1999), "Text Classification from Labeled
//! and Unlabeled Documents using EM": word counts are weighted by each
//! instance's soft class probability, unlabeled mass is down-weighted by a
//! configurable factor, and add-one smoothing keeps every in-vocabulary
//! word probability strictly positive.
//!
//! # Quick Start
//!
//! ```
//! use semisup::prelude::*;
//!
//! let mut dataset = Dataset::new();
//! dataset.add(Instance::labeled("A").with_feature("f1", 1.0));
//! dataset.add(Instance::labeled("A").with_feature("f1", 1.0).with_feature("f2", 1.0));
//! dataset.add(Instance::labeled("B").with_feature("f2", 1.0));
//! dataset.add(Instance::labeled("B").with_feature("f2", 2.0));
//! dataset.make_alphabets();
//! dataset.make_vectors();
//! let labels = dataset.label_alphabet().tokens().to_vec();
//! dataset.set_one_hot_distributions(&labels);
//!
//! let mut model = EmModel::new(dataset.label_alphabet().clone(), EmConfig::new()).unwrap();
//! model.train(&dataset).unwrap();
//! assert!(model.test(&dataset).unwrap() >= 0.75);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::{Alphabet, Dataset, Instance};
use crate::error::{Result, SemisupError};
use crate::logprob::normalize_log10;

/// Configuration for the EM engine.
///
/// # Examples
///
/// ```
/// use semisup::em::EmConfig;
///
/// let config = EmConfig::new().with_lambda(0.1).with_iterations(25);
/// assert_eq!(config.iterations, 25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmConfig {
    /// Down-weighting factor applied to unlabeled instances' contribution
    /// to the sufficient statistics.
    pub lambda: f64,
    /// Number of E/M iterations in [`run_em`]. Zero reduces the loop to
    /// the labeled-only baseline.
    pub iterations: usize,
}

impl EmConfig {
    /// Creates the default configuration: `lambda = 1.0`, 50 iterations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lambda: 1.0,
            iterations: 50,
        }
    }

    /// Sets the unlabeled down-weighting factor.
    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Sets the number of EM iterations.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `lambda` is not a positive
    /// finite number.
    pub fn validate(&self) -> Result<()> {
        if !(self.lambda > 0.0 && self.lambda.is_finite()) {
            return Err(SemisupError::invalid_hyperparameter(
                "lambda",
                self.lambda.to_string(),
                "> 0 and finite",
            ));
        }
        Ok(())
    }
}

impl Default for EmConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Multinomial Naive Bayes model trained from soft class assignments.
///
/// The label alphabet is fixed at construction rather than taken from the
/// training dataset, because the training data may not contain every label
/// that exists in the test data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmModel {
    label_alphabet: Alphabet,
    config: EmConfig,
    num_classes: usize,
    num_words: usize,
    /// `theta[class][word]`: smoothed p(w|c).
    theta: Vec<Vec<f64>>,
    /// `priors[class]`: smoothed p(c).
    priors: Vec<f64>,
}

impl EmModel {
    /// Creates an untrained model over the given label alphabet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if the configuration is invalid.
    pub fn new(label_alphabet: Alphabet, config: EmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            label_alphabet,
            config,
            num_classes: 0,
            num_words: 0,
            theta: Vec::new(),
            priors: Vec::new(),
        })
    }

    /// Number of classes the model was built over.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Vocabulary size at training time.
    #[must_use]
    pub fn num_words(&self) -> usize {
        self.num_words
    }

    /// Smoothed p(word|class). Strictly inside (0, 1) after training.
    #[must_use]
    pub fn theta(&self, class: usize, word: usize) -> f64 {
        self.theta[class][word]
    }

    /// Smoothed p(class). Strictly positive after training.
    #[must_use]
    pub fn prior(&self, class: usize) -> f64 {
        self.priors[class]
    }

    /// Fits the model from a dataset whose instances carry class
    /// probability distributions (one-hot for labeled instances, soft for
    /// unlabeled ones). Assumes alphabets and vectors are generated.
    ///
    /// Unlabeled instances contribute with weight `lambda`, labeled ones
    /// with weight 1.
    ///
    /// # Errors
    ///
    /// Returns `InvalidModelState` if the label alphabet or the dataset's
    /// feature alphabet is empty, or if a class index has no token.
    pub fn train(&mut self, dataset: &Dataset) -> Result<()> {
        self.num_classes = self.label_alphabet.len();
        self.num_words = dataset.num_dimensions();

        if self.num_classes == 0 {
            return Err(SemisupError::invalid_model_state("label alphabet is empty"));
        }
        if self.num_words == 0 {
            return Err(SemisupError::invalid_model_state(
                "feature alphabet is empty",
            ));
        }

        let mut word_counts = vec![vec![0.0; self.num_words]; self.num_classes];
        let mut prob_mass = vec![0.0; self.num_classes];
        let mut total_weight = 0.0;

        for instance in dataset.instances() {
            let weight = if instance.label().is_none() {
                self.config.lambda
            } else {
                1.0
            };
            total_weight += weight;

            for class in 0..self.num_classes {
                let token = self.label_alphabet.token(class)?;
                let p = instance.class_probability(token);
                prob_mass[class] += weight * p;
                if p == 0.0 {
                    continue;
                }
                for (&word, &value) in instance.vector() {
                    if word < self.num_words {
                        word_counts[class][word] += weight * value * p;
                    }
                }
            }
        }

        self.theta = vec![vec![0.0; self.num_words]; self.num_classes];
        self.priors = vec![0.0; self.num_classes];

        for class in 0..self.num_classes {
            let total_class_words: f64 = word_counts[class].iter().sum();
            for word in 0..self.num_words {
                // Add-one smoothing: no in-vocabulary word may have zero
                // probability in any class.
                let p = (1.0 + word_counts[class][word])
                    / (self.num_words as f64 + total_class_words);
                debug_assert!(p.is_finite() && p > 0.0 && p <= 1.0);
                self.theta[class][word] = p;
            }

            let prior =
                (1.0 + prob_mass[class]) / (self.num_classes as f64 + total_weight);
            debug_assert!(prior.is_finite() && prior > 0.0);
            self.priors[class] = prior;
        }

        Ok(())
    }

    /// Unnormalized class log scores for one instance:
    /// `log10 p(c) + sum_w v[w] * log10 p(w|c)`.
    ///
    /// Words outside the training vocabulary are skipped, not an error.
    #[must_use]
    pub fn class_log_scores(&self, instance: &Instance) -> Vec<f64> {
        let mut scores = Vec::with_capacity(self.num_classes);
        for class in 0..self.num_classes {
            let mut score = self.priors[class].log10();
            for (&word, &value) in instance.vector() {
                if word < self.num_words {
                    score += value * self.theta[class][word].log10();
                }
            }
            debug_assert!(!score.is_nan());
            scores.push(score);
        }
        scores
    }

    /// The arg-max class index for one instance.
    #[must_use]
    pub fn classify(&self, instance: &Instance) -> usize {
        arg_max(&self.class_log_scores(instance))
    }

    /// E-step: sets every instance's soft class distribution from its
    /// normalized class log scores.
    ///
    /// # Errors
    ///
    /// Returns `InvalidModelState` if a class index has no token (model
    /// never trained).
    pub fn label(&self, dataset: &mut Dataset) -> Result<()> {
        let tokens: Vec<String> = (0..self.num_classes)
            .map(|c| self.label_alphabet.token(c).map(String::from))
            .collect::<Result<_>>()?;

        for instance in dataset.instances_mut() {
            let probs = normalize_log10(&self.class_log_scores(instance));
            let mut distribution = HashMap::with_capacity(self.num_classes);
            for (token, p) in tokens.iter().zip(&probs) {
                distribution.insert(token.clone(), *p);
            }
            instance.set_class_distribution(distribution);
        }
        Ok(())
    }

    /// Classifies every instance and returns the fraction whose arg-max
    /// class matches the hard label.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` on an empty dataset and
    /// `InvalidModelState` if an instance carries no hard label.
    pub fn test(&self, dataset: &Dataset) -> Result<f64> {
        if dataset.is_empty() {
            return Err(SemisupError::insufficient_data(1, 0));
        }

        let mut correct = 0;
        for instance in dataset.instances() {
            let gold = instance.label().ok_or_else(|| {
                SemisupError::invalid_model_state("test instance has no hard label")
            })?;
            let prediction = self.classify(instance);
            if self.label_alphabet.token(prediction)? == gold {
                correct += 1;
            }
        }
        Ok(f64::from(correct) / dataset.len() as f64)
    }
}

/// Runs the full EM loop and returns accuracy on the test set.
///
/// Trains on labeled data alone, then `config.iterations` times relabels
/// the unlabeled pool (E-step) and retrains on labeled plus relabeled
/// unlabeled data with unlabeled mass weighted by `config.lambda`
/// (M-step). With zero iterations this reduces exactly to the
/// labeled-only baseline.
///
/// All three datasets are vectorized in place against the given alphabets;
/// the unlabeled pool additionally receives soft class distributions.
///
/// # Errors
///
/// Propagates configuration and model-state errors from the engine.
pub fn run_em(
    labeled: &mut Dataset,
    unlabeled: &mut Dataset,
    test: &mut Dataset,
    label_alphabet: &Alphabet,
    feature_alphabet: &Alphabet,
    config: &EmConfig,
) -> Result<f64> {
    labeled.set_alphabets(label_alphabet, feature_alphabet);
    labeled.set_one_hot_distributions(label_alphabet.tokens());
    labeled.make_vectors();

    let mut model = EmModel::new(label_alphabet.clone(), config.clone())?;
    model.train(labeled)?;

    for _ in 0..config.iterations {
        // E-step: relabel the unlabeled pool with the current model.
        unlabeled.set_alphabets(label_alphabet, feature_alphabet);
        unlabeled.make_vectors();
        model.label(unlabeled)?;

        // M-step: retrain on labeled plus soft-labeled unlabeled data.
        let mut combined = Dataset::from_parts(&[&*labeled, &*unlabeled]);
        combined.set_alphabets(label_alphabet, feature_alphabet);
        combined.make_vectors();
        model.train(&combined)?;
    }

    test.set_alphabets(label_alphabet, feature_alphabet);
    test.make_vectors();
    model.test(test)
}

/// Index of the largest element; first wins on ties.
pub(crate) fn arg_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate() {
        if value > values[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests;
