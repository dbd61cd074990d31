//! Underflow-safe log-domain probability arithmetic.
//!
//! Unnormalized class scores in a multinomial model are base-10 logs of
//! numbers far below anything `f64` can represent (a long document easily
//! scores `10^-800`). Naively exponentiating before normalizing yields
//! `0/0`. This module keeps every value as a log10 magnitude and performs
//! the single step that genuinely needs real magnitudes — summing across
//! classes to get the normalizer — in arbitrary-precision decimals.
//!
//! # Quick Start
//!
//! ```
//! use semisup::logprob::normalize_log10;
//!
//! // Two classes, 1000 decades apart.
//! let probs = normalize_log10(&[-10.0, -1010.0]);
//! assert!((probs[0] - 1.0).abs() < 1e-9);
//! assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
//! ```

use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive, Zero};
use num_bigint::BigInt;

/// A probability stored as a base-10 log magnitude.
///
/// `LogProb` supports multiplication (adding magnitudes), addition
/// (log-sum), and batch normalization. The zero probability is represented
/// by a magnitude of `-inf` and survives every operation.
///
/// # Examples
///
/// ```
/// use semisup::logprob::LogProb;
///
/// let p = LogProb::from_log10(-3.0); // 0.001
/// let q = LogProb::from_log10(-3.0);
/// assert!(((p * q).log10() - -6.0).abs() < 1e-12);
/// assert!(((p + q).log10() - 0.002f64.log10()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LogProb(f64);

impl LogProb {
    /// Wrap a base-10 log magnitude.
    #[must_use]
    pub fn from_log10(magnitude: f64) -> Self {
        Self(magnitude)
    }

    /// The probability 1 (magnitude 0).
    #[must_use]
    pub fn one() -> Self {
        Self(0.0)
    }

    /// The probability 0 (magnitude `-inf`).
    #[must_use]
    pub fn zero() -> Self {
        Self(f64::NEG_INFINITY)
    }

    /// The stored log10 magnitude.
    #[must_use]
    pub fn log10(self) -> f64 {
        self.0
    }

    /// True if this value represents probability 0.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }

    /// Expand to an arbitrary-precision decimal.
    ///
    /// The magnitude `e` splits into its integer part `i = floor(e)` and
    /// fractional remainder `f = e - i`, so `10^e = 10^i * 10^f`: the first
    /// factor is exact (a unit digit with shifted scale), the second a
    /// plain floating-point power in `[1, 10)`.
    #[must_use]
    pub fn to_big_decimal(self) -> BigDecimal {
        assert!(!self.0.is_nan(), "log magnitude is NaN");
        if self.is_zero() {
            return BigDecimal::zero();
        }

        let integer = self.0.floor();
        let fraction = self.0 - integer;

        let ten_to_integer = BigDecimal::new(BigInt::from(1), -(integer as i64));
        let ten_to_fraction = BigDecimal::from_f64(10f64.powf(fraction))
            .expect("10^f is finite for f in [0, 1)");

        ten_to_integer * ten_to_fraction
    }

    /// Normalize a set of log-domain values into plain probabilities.
    ///
    /// The values are expanded to arbitrary-precision decimals, summed, and
    /// divided by the sum, so the result is exact to `f64` resolution even
    /// when the gap between the largest and smallest magnitude exceeds the
    /// floating-point exponent range.
    ///
    /// # Panics
    ///
    /// Panics if every value is zero: a model with smoothed parameters can
    /// never produce an all-zero score vector, so this is an invariant
    /// violation rather than a runtime condition.
    #[must_use]
    pub fn normalize(values: &[Self]) -> Vec<f64> {
        let expanded: Vec<BigDecimal> = values.iter().map(|v| v.to_big_decimal()).collect();

        let mut normalizer = BigDecimal::zero();
        for value in &expanded {
            normalizer = normalizer + value;
        }
        assert!(
            normalizer > BigDecimal::zero(),
            "cannot normalize an all-zero score vector"
        );

        expanded
            .into_iter()
            .map(|value| {
                (value / &normalizer)
                    .to_f64()
                    .expect("normalized probability fits in f64")
            })
            .collect()
    }
}

impl std::ops::Mul for LogProb {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::MulAssign for LogProb {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Add for LogProb {
    type Output = Self;

    /// Log-sum: `log10(10^a + 10^b)` without leaving log space.
    fn add(self, rhs: Self) -> Self {
        if self.is_zero() {
            return rhs;
        }
        if rhs.is_zero() {
            return self;
        }
        let (hi, lo) = if self.0 >= rhs.0 {
            (self.0, rhs.0)
        } else {
            (rhs.0, self.0)
        };
        Self(hi + (1.0 + 10f64.powf(lo - hi)).log10())
    }
}

/// Normalize raw log10 scores into probabilities summing to 1.
///
/// Free-function form of [`LogProb::normalize`] for callers that carry
/// plain `f64` log scores.
#[must_use]
pub fn normalize_log10(log_scores: &[f64]) -> Vec<f64> {
    let values: Vec<LogProb> = log_scores.iter().map(|&s| LogProb::from_log10(s)).collect();
    LogProb::normalize(&values)
}
