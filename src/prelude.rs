//! Convenience re-exports of the types most programs need.
//!
//! ```
//! use semisup::prelude::*;
//!
//! let mut dataset = Dataset::new();
//! dataset.add(Instance::labeled("yes").with_feature("fever", 1.0));
//! assert_eq!(dataset.len(), 1);
//! ```

pub use crate::data::{Alphabet, Dataset, Instance, Split};
pub use crate::em::{run_em, EmConfig, EmModel};
pub use crate::error::{Result, SemisupError};
pub use crate::gibbs::{GibbsConfig, GibbsSampler};
pub use crate::logprob::{normalize_log10, LogProb};
