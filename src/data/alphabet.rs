use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SemisupError};

/// Bidirectional string-to-integer dictionary, insertion-ordered.
///
/// Indices are dense (`0..len`) and stable once assigned. An alphabet is
/// typically frozen once a dataset has been vectorized against it; callers
/// that mutate it afterwards must re-vectorize.
///
/// # Examples
///
/// ```
/// use semisup::data::Alphabet;
///
/// let mut alphabet = Alphabet::new();
/// alphabet.add("cold");
/// alphabet.add("flu");
/// alphabet.add("cold"); // no-op
///
/// assert_eq!(alphabet.len(), 2);
/// assert_eq!(alphabet.index("flu").unwrap(), 1);
/// assert_eq!(alphabet.token(0).unwrap(), "cold");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alphabet {
    index_of: HashMap<String, usize>,
    tokens: Vec<String>,
}

impl Alphabet {
    /// Creates an empty alphabet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token, assigning it the next dense index. No-op if present.
    pub fn add(&mut self, token: &str) {
        if !self.index_of.contains_key(token) {
            self.index_of.insert(token.to_string(), self.tokens.len());
            self.tokens.push(token.to_string());
        }
    }

    /// Looks up the index assigned to `token`.
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if the token was never added.
    pub fn index(&self, token: &str) -> Result<usize> {
        self.index_of
            .get(token)
            .copied()
            .ok_or_else(|| SemisupError::KeyNotFound {
                key: token.to_string(),
            })
    }

    /// Looks up the token assigned to `index`.
    ///
    /// # Errors
    ///
    /// Returns `IndexNotFound` if the index is outside `0..len`.
    pub fn token(&self, index: usize) -> Result<&str> {
        self.tokens
            .get(index)
            .map(String::as_str)
            .ok_or(SemisupError::IndexNotFound {
                index,
                len: self.tokens.len(),
            })
    }

    /// True if the token has been added.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.index_of.contains_key(token)
    }

    /// Number of distinct tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if no token has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// All known tokens in index order (index 0 first).
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}
