use std::{f64::consts::LN_2, ops::RangeInclusive};

use super::{build_f64, exponent, significand_plus_one, LogLike};

// Coefficients of the cubic polynomial used to interpolate log2 between successive powers of two. They minimize the
// worst-case bin widening while keeping the polynomial exact at both ends of each binade.
const A: f64 = 6.0 / 35.0;
const B: f64 = -3.0 / 5.0;
const C: f64 = 10.0 / 7.0;

/// Index mapping that approximates the base-2 logarithm by cubic interpolation between powers of two.
///
/// Nearly as cheap as the linear interpolation, but with bins that are only ~1% wider in log space than `gamma`
/// implies, so the memory overhead compared to the exact logarithmic mapping is negligible.
#[derive(Clone, Debug, PartialEq)]
pub struct CubicallyInterpolatedMapping {
    pub(super) params: LogLike,
}

impl CubicallyInterpolatedMapping {
    /// Creates a new cubically interpolated mapping with the given gamma value and index offset.
    ///
    /// # Errors
    ///
    /// Returns an error if gamma is not greater than 1, or if either parameter is not finite.
    pub fn with_gamma(gamma: f64, index_offset: f64) -> Result<Self, &'static str> {
        LogLike::new(gamma, index_offset, LN_2, 7.0 / (10.0 * LN_2)).map(|params| Self { params })
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
    let s = significand_plus_one(value) - 1.0;
    ((A * s + B) * s + C) * s + exponent(value)
}

/// Exact inverse of [`approximate_log`], solving the cubic with Cardano's formula.
fn approximate_inverse_log(log: f64) -> f64 {
    let exponent = log.floor();
    let d0 = B * B - 3.0 * A * C;
    let d1 = 2.0 * B * B * B - 9.0 * A * B * C - 27.0 * A * A * (log - exponent);
    let p = ((d1 - (d1 * d1 - 4.0 * d0 * d0 * d0).sqrt()) / 2.0).cbrt();
    let significand_plus_one = -(B + p + d0 / p) / (3.0 * A) + 1.0;
    build_f64(exponent as i64, significand_plus_one)
}
