//! Semisup: semi-supervised text classification with EM and Gibbs sampling.
//!
//! Semisup trains a multinomial Naive Bayes model from a mixture of labeled
//! and unlabeled examples using two alternative inference strategies: an
//! Expectation-Maximization loop that alternates soft relabeling with
//! parameter reestimation, and a collapsed Gibbs sampler that draws latent
//! labels and word distributions from their conjugate posteriors.
//!
//! # Quick Start
//!
//! ```
//! use semisup::prelude::*;
//!
//! let mut dataset = Dataset::new();
//! dataset.add(Instance::labeled("pos").with_feature("good", 2.0));
//! dataset.add(Instance::labeled("pos").with_feature("good", 1.0).with_feature("bad", 1.0));
//! dataset.add(Instance::labeled("neg").with_feature("bad", 1.0));
//! dataset.add(Instance::labeled("neg").with_feature("bad", 2.0));
//! dataset.make_alphabets();
//! dataset.make_vectors();
//! let labels = dataset.label_alphabet().tokens().to_vec();
//! dataset.set_one_hot_distributions(&labels);
//!
//! let mut model = EmModel::new(dataset.label_alphabet().clone(), EmConfig::new()).unwrap();
//! model.train(&dataset).unwrap();
//! let accuracy = model.test(&dataset).unwrap();
//! assert!(accuracy >= 0.75);
//! ```
//!
//! # Modules
//!
//! - [`data`]: Alphabet, Instance, Dataset, and fold splitting
//! - [`em`]: multinomial Naive Bayes under soft labels and the EM loop
//! - [`gibbs`]: collapsed Gibbs sampler with Beta/Dirichlet priors
//! - [`logprob`]: underflow-safe log-domain probability arithmetic
//! - [`error`]: crate error type and `Result` alias

pub mod data;
pub mod em;
pub mod error;
pub mod gibbs;
pub mod logprob;
pub mod prelude;

pub use error::{Result, SemisupError};
