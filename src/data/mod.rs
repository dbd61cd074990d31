//! Data model: alphabets, instances, datasets, and fold splitting.
//!
//! A [`Dataset`] is an ordered collection of [`Instance`]s plus the two
//! [`Alphabet`]s that index them. Instances carry sparse named features;
//! vectorization against the dataset's feature alphabet produces the
//! integer-indexed vectors the inference engines consume.
//!
//! # Quick Start
//!
//! ```
//! use semisup::data::{Dataset, Instance};
//!
//! let mut dataset = Dataset::new();
//! dataset.add(Instance::labeled("spam").with_feature("offer", 2.0));
//! dataset.add(Instance::labeled("ham").with_feature("meeting", 1.0));
//! dataset.make_alphabets();
//! dataset.make_vectors();
//!
//! assert_eq!(dataset.len(), 2);
//! assert_eq!(dataset.num_classes(), 2);
//! assert_eq!(dataset.num_dimensions(), 2);
//! ```

mod alphabet;
mod dataset;
mod instance;

pub use alphabet::Alphabet;
pub use dataset::{Dataset, Split};
pub use instance::Instance;

#[cfg(test)]
mod tests;
