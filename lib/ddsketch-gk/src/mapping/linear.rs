use std::{
    f64::consts::{LN_2, LOG2_E},
    ops::RangeInclusive,
};

use super::{build_f64, exponent, significand_plus_one, LogLike};

/// Index mapping that approximates the base-2 logarithm by linear interpolation between powers of two.
///
/// The approximation is read straight off the binary representation of the value (exponent plus significand), which
/// makes indexing much cheaper than computing a real logarithm. Bins are up to `1 / ln(2)` times wider in log space
/// than `gamma` alone would imply, which the reported relative accuracy accounts for.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearlyInterpolatedMapping {
    pub(super) params: LogLike,
}

impl LinearlyInterpolatedMapping {
    /// Creates a new linearly interpolated mapping with the given gamma value and index offset.
    ///
    /// # Errors
    ///
    /// Returns an error if gamma is not greater than 1, or if either parameter is not finite.
    pub fn with_gamma(gamma: f64, index_offset: f64) -> Result<Self, &'static str> {
        LogLike::new(gamma, index_offset, LN_2, LOG2_E).map(|params| Self { params })
    }

    /// Returns the index of the bin for the given positive value.
    pub fn index(&self, value: f64) -> i32 {
        self.params.index(approximate_log(value))
    }

    /// Returns the representative value for the bin at the given index.
    pub fn value(&self, index: i32) -> f64 {
        self.params.value_from_lower_bound(self.lower_bound(index))
    }

    /// Returns the lower bound of the bin at the given index.
    pub fn lower_bound(&self, index: i32) -> f64 {
        approximate_inverse_log(self.params.lower_bound_log(index))
    }

    /// Returns the range of bin indices with finite, strictly increasing values.
    pub fn indexable_range(&self) -> RangeInclusive<i32> {
        self.params.indexable_range(approximate_log)
    }

    /// Returns the relative accuracy of this mapping.
    pub fn relative_accuracy(&self) -> f64 {
        self.params.relative_accuracy
    }
}

/// Approximates `log2(value)`, exact at powers of two.
fn approximate_log(value: f64) -> f64 {
    exponent(value) + significand_plus_one(value) - 1.0
}

/// Exact inverse of [`approximate_log`].
fn approximate_inverse_log(log: f64) -> f64 {
    let exponent = log.floor();
    build_f64(exponent as i64, log - exponent + 1.0)
}
