//! Error types for Semisup operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for Semisup operations.
///
/// Covers the three failure families of the inference core: configuration
/// errors (empty alphabets, oversized draw requests), dictionary lookup
/// misses, and invalid hyperparameters.
///
/// # Examples
///
/// ```
/// use semisup::error::SemisupError;
///
/// let err = SemisupError::InsufficientData { requested: 10, available: 4 };
/// assert!(err.to_string().contains("insufficient data"));
/// ```
#[derive(Debug)]
pub enum SemisupError {
    /// Model cannot be trained or queried in its current state
    /// (zero classes, zero features, or never initialized).
    InvalidModelState {
        /// Description of the violated precondition
        message: String,
    },

    /// More instances were requested than the dataset holds.
    InsufficientData {
        /// Number of instances requested
        requested: usize,
        /// Number of instances available
        available: usize,
    },

    /// Token not present in an alphabet.
    KeyNotFound {
        /// The missing token
        key: String,
    },

    /// Index outside an alphabet's dense range.
    IndexNotFound {
        /// The out-of-range index
        index: usize,
        /// Alphabet size at lookup time
        len: usize,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for SemisupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemisupError::InvalidModelState { message } => {
                write!(f, "invalid model state: {message}")
            }
            SemisupError::InsufficientData {
                requested,
                available,
            } => {
                write!(
                    f,
                    "insufficient data: requested {requested} instances, only {available} available"
                )
            }
            SemisupError::KeyNotFound { key } => {
                write!(f, "token not found in alphabet: {key:?}")
            }
            SemisupError::IndexNotFound { index, len } => {
                write!(f, "index {index} not found in alphabet of size {len}")
            }
            SemisupError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            SemisupError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SemisupError {}

impl From<&str> for SemisupError {
    fn from(msg: &str) -> Self {
        SemisupError::Other(msg.to_string())
    }
}

impl From<String> for SemisupError {
    fn from(msg: String) -> Self {
        SemisupError::Other(msg)
    }
}

impl SemisupError {
    /// Create an invalid-model-state error with a description.
    #[must_use]
    pub fn invalid_model_state(message: &str) -> Self {
        Self::InvalidModelState {
            message: message.to_string(),
        }
    }

    /// Create an insufficient-data error.
    #[must_use]
    pub fn insufficient_data(requested: usize, available: usize) -> Self {
        Self::InsufficientData {
            requested,
            available,
        }
    }

    /// Create an invalid-hyperparameter error.
    #[must_use]
    pub fn invalid_hyperparameter(param: &str, value: String, constraint: &str) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value,
            constraint: constraint.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, SemisupError>;
