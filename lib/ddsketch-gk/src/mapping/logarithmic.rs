use std::ops::RangeInclusive;

use super::LogLike;

/// Index mapping based on the exact natural logarithm.
///
/// A value `v` lands in bin `floor(ln(v) / ln(gamma) + index_offset)`. Bins are exactly `gamma` times wider than their
/// predecessor, which makes this the tightest mapping for a given `gamma`, at the price of a real logarithm per value.
#[derive(Clone, Debug, PartialEq)]
pub struct LogarithmicMapping {
    pub(super) params: LogLike,
}

impl LogarithmicMapping {
    /// Creates a logarithmic mapping that guarantees the given relative accuracy, with no index offset.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < relative_accuracy < 1`.
    ///
    /// # Example
    ///
    /// ```
    /// use ddsketch_gk::mapping::LogarithmicMapping;
    ///
    /// let mapping = LogarithmicMapping::new(0.02).unwrap();
    /// assert!(mapping.relative_accuracy() <= 0.02 + 1e-12);
    /// ```
    pub fn new(relative_accuracy: f64) -> Result<Self, &'static str> {
        if !(relative_accuracy > 0.0 && relative_accuracy < 1.0) {
            return Err("relative accuracy must lie strictly between 0 and 1");
        }

        let gamma = (1.0 + relative_accuracy) / (1.0 - relative_accuracy);
        Self::with_gamma(gamma, 0.0)
    }

    /// Creates a logarithmic mapping from the raw `gamma` and `index_offset` parameters carried on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if gamma is not greater than 1, or if either parameter is not finite.
    pub fn with_gamma(gamma: f64, index_offset: f64) -> Result<Self, &'static str> {
        LogLike::new(gamma, index_offset, 1.0, 1.0).map(|params| Self { params })
    }

    /// Returns the index of the bin for the given positive value.
    pub fn index(&self, value: f64) -> i32 {
        self.params.index(value.ln())
    }

    /// Returns the representative value for the bin at the given index.
    pub fn value(&self, index: i32) -> f64 {
        self.params.value_from_lower_bound(self.lower_bound(index))
    }

    /// Returns the lower bound of the bin at the given index.
    pub fn lower_bound(&self, index: i32) -> f64 {
        self.params.lower_bound_log(index).exp()
    }

    /// Returns the range of bin indices with finite, strictly increasing values.
    pub fn indexable_range(&self) -> RangeInclusive<i32> {
        self.params.indexable_range(f64::ln)
    }

    /// Returns the relative accuracy of this mapping.
    pub fn relative_accuracy(&self) -> f64 {
        self.params.relative_accuracy
    }
}

impl Default for LogarithmicMapping {
    /// Creates a mapping with a relative accuracy of 1%, as trace agents use.
    fn default() -> Self {
        Self::new(0.01).expect("1% relative accuracy is always valid")
    }
}
