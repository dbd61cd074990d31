//! Collapsed Gibbs sampler for the multinomial mixture model.
//!
//! Sampling-based alternative to EM inference over the same generative
//! model, after Resnik and Hardisty, "Gibbs Sampling for the Uninitiated"
//! (2010): a Beta (generalized Dirichlet) prior over the class marginal and
//! a symmetric Dirichlet prior over each class's word multinomial. The
//! sampler initializes from a one-shot EM model, then repeatedly redraws
//! each unlabeled or test instance's latent label from its full
//! conditional and resamples the word distributions from their Dirichlet
//! posterior after every single reassignment.
//!
//! All randomness flows from one seeded generator, so runs are
//! reproducible given the configuration.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma};
use serde::{Deserialize, Serialize};

use crate::data::{Alphabet, Dataset, Instance};
use crate::em::{EmConfig, EmModel};
use crate::error::{Result, SemisupError};
use crate::logprob::normalize_log10;

/// Configuration for the Gibbs sampler.
///
/// # Examples
///
/// ```
/// use semisup::gibbs::GibbsConfig;
///
/// let config = GibbsConfig::new().with_num_samples(100).with_seed(7);
/// assert_eq!(config.num_samples, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GibbsConfig {
    /// Number of full sampling sweeps. A fixed budget substitutes for
    /// burn-in and convergence diagnostics.
    pub num_samples: usize,
    /// Draw the initial word distributions from the Dirichlet posterior
    /// instead of taking the smoothed point estimate.
    pub sample_theta_at_init: bool,
    /// Hyperparameters of the prior over the class marginal, one per
    /// class (all 1 = uniform).
    pub beta: Vec<f64>,
    /// Symmetric Dirichlet hyperparameter over each class's word
    /// multinomial.
    pub alpha: f64,
    /// Unlabeled down-weighting factor for the initializing EM model.
    pub lambda: f64,
    /// Seed for every draw the sampler makes.
    pub seed: u64,
}

impl GibbsConfig {
    /// Creates the default configuration: 50 sweeps, sampled initial
    /// theta, uniform priors, seed 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            num_samples: 50,
            sample_theta_at_init: true,
            beta: vec![1.0, 1.0],
            alpha: 1.0,
            lambda: 1.0,
            seed: 0,
        }
    }

    /// Sets the number of sampling sweeps.
    #[must_use]
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Sets whether the initial theta is sampled or point-estimated.
    #[must_use]
    pub fn with_sample_theta_at_init(mut self, sample: bool) -> Self {
        self.sample_theta_at_init = sample;
        self
    }

    /// Sets the class-marginal prior hyperparameters (one per class).
    #[must_use]
    pub fn with_beta(mut self, beta: Vec<f64>) -> Self {
        self.beta = beta;
        self
    }

    /// Sets the symmetric Dirichlet hyperparameter over words.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the unlabeled down-weighting factor for initialization.
    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` for an empty or non-positive
    /// `beta` vector, or non-positive `alpha` or `lambda`.
    pub fn validate(&self) -> Result<()> {
        if self.beta.is_empty() || self.beta.iter().any(|&b| !(b > 0.0 && b.is_finite())) {
            return Err(SemisupError::invalid_hyperparameter(
                "beta",
                format!("{:?}", self.beta),
                "non-empty, all > 0 and finite",
            ));
        }
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return Err(SemisupError::invalid_hyperparameter(
                "alpha",
                self.alpha.to_string(),
                "> 0 and finite",
            ));
        }
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

impl Default for GibbsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Incrementally maintained sufficient statistics of the mixture model.
#[derive(Debug, Clone, PartialEq)]
struct SuffStats {
    /// Number of instances currently assigned to each class.
    label_counts: Vec<usize>,
    /// `word_counts[class][word]`: summed word mass per class.
    word_counts: Vec<Vec<f64>>,
    /// Total word mass per class.
    total_class_words: Vec<f64>,
}

impl SuffStats {
    fn new(num_classes: usize, num_words: usize) -> Self {
        Self {
            label_counts: vec![0; num_classes],
            word_counts: vec![vec![0.0; num_words]; num_classes],
            total_class_words: vec![0.0; num_classes],
        }
    }

    fn add(&mut self, class: usize, instance: &Instance) {
        self.label_counts[class] += 1;
        for (&word, &value) in instance.vector() {
            self.word_counts[class][word] += value;
            self.total_class_words[class] += value;
        }
    }

    fn remove(&mut self, class: usize, instance: &Instance) {
        debug_assert!(self.label_counts[class] > 0);
        self.label_counts[class] -= 1;
        for (&word, &value) in instance.vector() {
            self.word_counts[class][word] -= value;
            self.total_class_words[class] -= value;
        }
    }
}

/// Collapsed Gibbs sampler over latent labels and word distributions.
///
/// Ground truth stays on the instances (`label`, or `scratch` for blinded
/// test data); the sampler's current hard assignment lives in an
/// engine-owned vector, and each blinded instance accumulates its trace of
/// drawn labels for the final averaged prediction.
#[derive(Debug)]
pub struct GibbsSampler {
    config: GibbsConfig,
    label_alphabet: Alphabet,
    num_classes: usize,
    num_words: usize,
    /// Labeled, unlabeled, and test instances combined.
    num_instances: usize,
    labeled: Dataset,
    /// Unlabeled and test instances, in fixed sampling order.
    pool: Dataset,
    /// Current latent label of every pool instance.
    assignments: Vec<usize>,
    stats: SuffStats,
    /// `theta[class][word]`: current word distribution per class.
    theta: Vec<Vec<f64>>,
    rng: StdRng,
    initialized: bool,
}

impl GibbsSampler {
    /// Creates a sampler over labeled, unlabeled, and (blinded) test data.
    ///
    /// The test dataset is expected to have been blinded with
    /// [`Dataset::hide_labels`] so that ground truth sits in the scratch
    /// slot; instances with a retrievable truth are the ones evaluated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidModelState` if either alphabet is empty and
    /// `InvalidHyperparameter` if the configuration is invalid or `beta`
    /// does not match the number of classes.
    pub fn new(
        labeled: Dataset,
        unlabeled: Dataset,
        test: Dataset,
        label_alphabet: Alphabet,
        feature_alphabet: Alphabet,
        config: GibbsConfig,
    ) -> Result<Self> {
        config.validate()?;

        let num_classes = label_alphabet.len();
        let num_words = feature_alphabet.len();
        if num_classes == 0 {
            return Err(SemisupError::invalid_model_state("label alphabet is empty"));
        }
        if num_words == 0 {
            return Err(SemisupError::invalid_model_state(
                "feature alphabet is empty",
            ));
        }
        if config.beta.len() != num_classes {
            return Err(SemisupError::invalid_hyperparameter(
                "beta",
                format!("{} entries", config.beta.len()),
                "one entry per class",
            ));
        }

        let num_instances = labeled.len() + unlabeled.len() + test.len();

        let mut labeled = labeled;
        labeled.set_alphabets(&label_alphabet, &feature_alphabet);

        let mut pool = Dataset::from_parts(&[&unlabeled, &test]);
        pool.set_alphabets(&label_alphabet, &feature_alphabet);

        let rng = StdRng::seed_from_u64(config.seed);
        let stats = SuffStats::new(num_classes, num_words);

        Ok(Self {
            config,
            label_alphabet,
            num_classes,
            num_words,
            num_instances,
            labeled,
            pool,
            assignments: Vec::new(),
            stats,
            theta: vec![vec![0.0; num_words]; num_classes],
            rng,
            initialized: false,
        })
    }

    /// Sets the initial state: trains a one-shot EM model on the labeled
    /// data, hard-assigns every pool instance to its arg-max class, and
    /// accumulates sufficient statistics over all instances. The initial
    /// word distributions are a Dirichlet posterior draw or the smoothed
    /// point estimate, per configuration.
    ///
    /// # Errors
    ///
    /// Propagates model-state errors from the inner EM model.
    pub fn initialize(&mut self) -> Result<()> {
        self.labeled
            .set_one_hot_distributions(self.label_alphabet.tokens());
        self.labeled.make_vectors();

        let em_config = EmConfig::new().with_lambda(self.config.lambda);
        let mut classifier = EmModel::new(self.label_alphabet.clone(), em_config)?;
        classifier.train(&self.labeled)?;

        self.pool.make_vectors();
        self.assignments = self
            .pool
            .instances()
            .iter()
            .map(|instance| classifier.classify(instance))
            .collect();

        self.stats = SuffStats::new(self.num_classes, self.num_words);
        for instance in self.labeled.instances() {
            let label = instance.label().ok_or_else(|| {
                SemisupError::invalid_model_state("labeled instance has no hard label")
            })?;
            let class = self.label_alphabet.index(label)?;
            self.stats.add(class, instance);
        }
        for (index, instance) in self.pool.instances().iter().enumerate() {
            self.stats.add(self.assignments[index], instance);
        }

        if self.config.sample_theta_at_init {
            self.sample_theta()?;
        } else {
            self.compute_theta();
        }

        self.initialized = true;
        Ok(())
    }

    /// One full sweep: resamples every pool instance's latent label from
    /// its conditional posterior, in fixed order, resampling the word
    /// distributions after every single reassignment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidModelState` if the sampler was never initialized,
    /// or if every class conditional collapses to zero (possible only when
    /// removing an instance leaves no assigned mass anywhere, e.g. a
    /// one-instance pool with no labeled data under uniform priors).
    pub fn sweep(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(SemisupError::invalid_model_state(
                "sampler has not been initialized",
            ));
        }

        for index in 0..self.pool.len() {
            let old_label = self.assignments[index];
            self.stats.remove(old_label, &self.pool.instances()[index]);

            let scores = self.conditional_log_scores(&self.pool.instances()[index]);
            if scores.iter().all(|&s| s == f64::NEG_INFINITY) {
                return Err(SemisupError::invalid_model_state(
                    "every class conditional is zero; no assigned mass remains",
                ));
            }
            let probs = normalize_log10(&scores);
            let new_label = self.draw_categorical(&probs);

            self.assignments[index] = new_label;
            // Only blinded test instances keep a trace; their truth sits
            // in the scratch slot.
            if self.pool.instances()[index].scratch().is_some() {
                self.pool.instances_mut()[index].push_sample(new_label);
            }

            self.stats.add(new_label, &self.pool.instances()[index]);
            self.sample_theta()?;
        }
        Ok(())
    }

    /// Initializes, then executes the configured number of sweeps.
    ///
    /// # Errors
    ///
    /// Propagates initialization and sweep errors.
    pub fn run(&mut self) -> Result<()> {
        self.initialize()?;
        for _ in 0..self.config.num_samples {
            self.sweep()?;
        }
        Ok(())
    }

    /// Averages each blinded test instance's sampled labels into a final
    /// prediction and returns accuracy against the hidden truth.
    ///
    /// The prediction is the majority label of the trace, with ties going
    /// to the higher class index (for two classes this is exactly the
    /// "mean at least 0.5" rule). An instance with an empty trace (zero
    /// sweeps) falls back to its initial EM assignment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidModelState` if the sampler never ran and
    /// `InsufficientData` if no instance carries a retrievable truth.
    pub fn evaluate(&self) -> Result<f64> {
        if !self.initialized {
            return Err(SemisupError::invalid_model_state(
                "sampler has not been initialized",
            ));
        }

        let mut correct = 0;
        let mut total = 0;
        for (index, instance) in self.pool.instances().iter().enumerate() {
            let Some(truth) = instance.scratch() else {
                continue;
            };
            total += 1;

            let prediction = if instance.sequence().is_empty() {
                self.assignments[index]
            } else {
                majority_label(instance.sequence(), self.num_classes)
            };
            if self.label_alphabet.token(prediction)? == truth {
                correct += 1;
            }
        }

        if total == 0 {
            return Err(SemisupError::insufficient_data(1, 0));
        }
        Ok(f64::from(correct) / f64::from(total))
    }

    /// Conditional log posterior of each class for one held-out instance,
    /// with that instance's counts already subtracted:
    /// `log10((n_c + beta_c - 1) / (n + sum(beta) - 1)) +
    /// sum_w v[w] * log10 theta[c][w]`.
    fn conditional_log_scores(&self, instance: &Instance) -> Vec<f64> {
        let sum_beta: f64 = self.config.beta.iter().sum();
        let denominator = self.num_instances as f64 + sum_beta - 1.0;

        let mut scores = Vec::with_capacity(self.num_classes);
        for class in 0..self.num_classes {
            let numerator =
                self.stats.label_counts[class] as f64 + self.config.beta[class] - 1.0;
            // A class can empty out under a uniform prior; its conditional
            // mass is exactly zero, which log space represents as -inf.
            let mut score = if numerator > 0.0 {
                (numerator / denominator).log10()
            } else {
                f64::NEG_INFINITY
            };
            if score.is_finite() {
                for (&word, &value) in instance.vector() {
                    score += value * self.theta[class][word].log10();
                }
            }
            scores.push(score);
        }
        scores
    }

    /// Draws a class from a normalized probability vector.
    fn draw_categorical(&mut self, probs: &[f64]) -> usize {
        let draw: f64 = self.rng.gen();
        let mut cumulative = 0.0;
        for (class, &p) in probs.iter().enumerate() {
            cumulative += p;
            if draw < cumulative {
                return class;
            }
        }
        probs.len() - 1
    }

    /// Point-estimates every class's word distribution with add-one style
    /// smoothing over the current counts.
    fn compute_theta(&mut self) {
        for class in 0..self.num_classes {
            for word in 0..self.num_words {
                self.theta[class][word] = (self.stats.word_counts[class][word] + 1.0)
                    / (self.stats.total_class_words[class] + self.num_words as f64);
            }
        }
    }

    /// Resamples every class's word distribution from its Dirichlet
    /// posterior, `Dirichlet(word_counts[class] + alpha)`, via normalized
    /// Gamma draws.
    fn sample_theta(&mut self) -> Result<()> {
        for class in 0..self.num_classes {
            let mut draws = Vec::with_capacity(self.num_words);
            let mut sum = 0.0;
            for word in 0..self.num_words {
                let shape = self.stats.word_counts[class][word] + self.config.alpha;
                let gamma = Gamma::new(shape, 1.0).map_err(|e| {
                    SemisupError::Other(format!("gamma draw failed for shape {shape}: {e}"))
                })?;
                let draw = gamma.sample(&mut self.rng);
                draws.push(draw);
                sum += draw;
            }
            for (word, draw) in draws.into_iter().enumerate() {
                self.theta[class][word] = draw / sum;
            }
        }
        Ok(())
    }

    /// Number of instances currently assigned to each class.
    #[must_use]
    pub fn label_counts(&self) -> &[usize] {
        &self.stats.label_counts
    }

    /// Summed word mass per class and word.
    #[must_use]
    pub fn word_counts(&self) -> &[Vec<f64>] {
        &self.stats.word_counts
    }

    /// Total word mass per class.
    #[must_use]
    pub fn total_class_words(&self) -> &[f64] {
        &self.stats.total_class_words
    }

    /// Current p(word|class) parameters.
    #[must_use]
    pub fn theta(&self, class: usize, word: usize) -> f64 {
        self.theta[class][word]
    }

    /// Current latent label of every pool instance.
    #[must_use]
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }
}

/// Most frequent label in a trace; ties go to the higher class index,
/// which reproduces the two-class "mean at least 0.5" rule.
fn majority_label(sequence: &[usize], num_classes: usize) -> usize {
    let mut counts = vec![0usize; num_classes];
    for &label in sequence {
        counts[label] += 1;
    }
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count >= counts[best] {
            best = class;
        }
    }
    best
}
