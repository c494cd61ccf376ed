//! Index mappings.
//!
//! An index mapping translates between positive values and the integer indices of the logarithmically-sized bins that
//! DDSketch uses to count them. Sketch payloads declare which mapping they were built with, through an interpolation
//! scheme plus a `gamma` and `indexOffset` parameter. The set of schemes is fixed by the wire format, so mappings are
//! modeled as a closed set of variants rather than a trait.

use std::ops::RangeInclusive;

use datadog_protos::sketches::{index_mapping::Interpolation, IndexMapping as ProtoIndexMapping};
use protobuf::EnumOrUnknown;

use crate::common::float_eq;
use crate::error::{ConversionError, InvalidMapping, UnsupportedMapping};

mod cubic;
pub use self::cubic::CubicallyInterpolatedMapping;

mod linear;
pub use self::linear::LinearlyInterpolatedMapping;

mod logarithmic;
pub use self::logarithmic::LogarithmicMapping;

const EXPONENT_MASK: u64 = 0x7FF0_0000_0000_0000;
const SIGNIFICAND_MASK: u64 = 0x000F_FFFF_FFFF_FFFF;
const ONE_BITS: u64 = 0x3FF0_0000_0000_0000;
const EXPONENT_BIAS: i64 = 1023;
const SIGNIFICAND_WIDTH: u32 = 52;

/// Smallest bin lower bound that every mapping can represent as a normal float.
const MIN_INDEXABLE_VALUE: f64 = f64::MIN_POSITIVE;

/// Largest bin lower bound whose representative value stays finite.
const MAX_INDEXABLE_VALUE: f64 = f64::MAX / 2.0;

/// Maps values to bin indices and vice versa.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexMapping {
    /// Exact logarithm (`Interpolation::NONE`).
    Logarithmic(LogarithmicMapping),

    /// Base-2 logarithm, linearly interpolated between powers of two (`Interpolation::LINEAR`).
    LinearlyInterpolated(LinearlyInterpolatedMapping),

    /// Base-2 logarithm, cubically interpolated between powers of two (`Interpolation::CUBIC`).
    CubicallyInterpolated(CubicallyInterpolatedMapping),
}

impl IndexMapping {
    /// Creates the index mapping described by a protobuf `IndexMapping`.
    ///
    /// # Errors
    ///
    /// If the interpolation scheme is unknown, or known but without a mapping implementation (`QUADRATIC`), an
    /// `UnsupportedMapping` error carrying the raw scheme value is returned. If `gamma` or `indexOffset` cannot describe a
    /// valid mapping, an `InvalidMapping` error is returned.
    pub fn from_proto(proto: &ProtoIndexMapping) -> Result<Self, ConversionError> {
        let gamma = proto.gamma;
        let index_offset = proto.indexOffset;

        let mapping = match proto.interpolation.enum_value() {
            Ok(Interpolation::NONE) => LogarithmicMapping::with_gamma(gamma, index_offset).map(Self::Logarithmic),
            Ok(Interpolation::LINEAR) => {
                LinearlyInterpolatedMapping::with_gamma(gamma, index_offset).map(Self::LinearlyInterpolated)
            }
            Ok(Interpolation::CUBIC) => {
                CubicallyInterpolatedMapping::with_gamma(gamma, index_offset).map(Self::CubicallyInterpolated)
            }
            Ok(other) => {
                return UnsupportedMapping {
                    interpolation: other as i32,
                }
                .fail()
            }
            Err(raw) => return UnsupportedMapping { interpolation: raw }.fail(),
        };

        mapping.map_err(|reason| InvalidMapping { reason }.build())
    }

    /// Converts this mapping to a protobuf `IndexMapping`.
    pub fn to_proto(&self) -> ProtoIndexMapping {
        let mut proto = ProtoIndexMapping::new();
        proto.gamma = self.gamma();
        proto.indexOffset = self.index_offset();
        proto.interpolation = EnumOrUnknown::new(self.interpolation());
        proto
    }

    /// Returns the index of the bin for the given positive value.
    pub fn index(&self, value: f64) -> i32 {
        match self {
            Self::Logarithmic(m) => m.index(value),
            Self::LinearlyInterpolated(m) => m.index(value),
            Self::CubicallyInterpolated(m) => m.index(value),
        }
    }

    /// Returns the representative value for the bin at the given index.
    pub fn value(&self, index: i32) -> f64 {
        match self {
            Self::Logarithmic(m) => m.value(index),
            Self::LinearlyInterpolated(m) => m.value(index),
            Self::CubicallyInterpolated(m) => m.value(index),
        }
    }

    /// Returns the lower bound of the bin at the given index.
    pub fn lower_bound(&self, index: i32) -> f64 {
        match self {
            Self::Logarithmic(m) => m.lower_bound(index),
            Self::LinearlyInterpolated(m) => m.lower_bound(index),
            Self::CubicallyInterpolated(m) => m.lower_bound(index),
        }
    }

    /// Returns the range of bin indices this mapping can turn into finite, strictly increasing values.
    ///
    /// Bins outside of this range would map to infinity, to zero, or to values that wrap around in the binary exponent.
    pub fn indexable_range(&self) -> RangeInclusive<i32> {
        match self {
            Self::Logarithmic(m) => m.indexable_range(),
            Self::LinearlyInterpolated(m) => m.indexable_range(),
            Self::CubicallyInterpolated(m) => m.indexable_range(),
        }
    }

    /// Returns the relative accuracy of this mapping.
    pub fn relative_accuracy(&self) -> f64 {
        self.params().relative_accuracy
    }

    /// Returns the gamma value (base of the logarithm) for this mapping.
    pub fn gamma(&self) -> f64 {
        self.params().gamma
    }

    /// Returns the index offset used by this mapping.
    pub fn index_offset(&self) -> f64 {
        self.params().index_offset
    }

    /// Returns the interpolation scheme used by this mapping.
    pub fn interpolation(&self) -> Interpolation {
        match self {
            Self::Logarithmic(_) => Interpolation::NONE,
            Self::LinearlyInterpolated(_) => Interpolation::LINEAR,
            Self::CubicallyInterpolated(_) => Interpolation::CUBIC,
        }
    }

    /// Returns `true` if both mappings use the same scheme and (approximately) the same parameters.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.interpolation() == other.interpolation()
            && float_eq(self.gamma(), other.gamma())
            && float_eq(self.index_offset(), other.index_offset())
    }

    fn params(&self) -> &LogLike {
        match self {
            Self::Logarithmic(m) => &m.params,
            Self::LinearlyInterpolated(m) => &m.params,
            Self::CubicallyInterpolated(m) => &m.params,
        }
    }
}

/// Parameters shared by all mappings built on a (possibly approximated) logarithm.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LogLike {
    gamma: f64,
    index_offset: f64,
    /// `ln(base) / ln(gamma)`, where `base` is the base of the approximated logarithm.
    multiplier: f64,
    relative_accuracy: f64,
}

impl LogLike {
    fn new(gamma: f64, index_offset: f64, base_ln: f64, correcting_factor: f64) -> Result<Self, &'static str> {
        if !gamma.is_finite() || gamma <= 1.0 {
            return Err("gamma must be finite and greater than 1");
        }

        if !index_offset.is_finite() {
            return Err("index offset must be finite");
        }

        // An approximated logarithm makes some bins wider than gamma would suggest; the correcting factor is the
        // worst-case widening, and the relative accuracy is derived from the effective gamma.
        let effective_gamma = gamma.powf(correcting_factor);

        Ok(Self {
            gamma,
            index_offset,
            multiplier: base_ln / gamma.ln(),
            relative_accuracy: (effective_gamma - 1.0) / (effective_gamma + 1.0),
        })
    }

    #[inline]
    fn index(&self, approximate_log: f64) -> i32 {
        let index = approximate_log * self.multiplier + self.index_offset;
        if index >= 0.0 {
            index as i32
        } else {
            (index as i32) - 1
        }
    }

    /// Returns the (approximated) logarithm of the lower bound of the bin at the given index.
    #[inline]
    fn lower_bound_log(&self, index: i32) -> f64 {
        (f64::from(index) - self.index_offset) / self.multiplier
    }

    /// Returns the indices whose bin lower bounds lie within `[MIN_INDEXABLE_VALUE, MAX_INDEXABLE_VALUE]`, given the
    /// (approximated) logarithm used by the mapping.
    fn indexable_range(&self, log: fn(f64) -> f64) -> RangeInclusive<i32> {
        // One bin of slack on each side absorbs rounding in the log-space bounds. Casts saturate at the `i32` limits.
        let min = (log(MIN_INDEXABLE_VALUE) * self.multiplier + self.index_offset).ceil() + 1.0;
        let max = (log(MAX_INDEXABLE_VALUE) * self.multiplier + self.index_offset).floor() - 2.0;
        (min as i32)..=(max as i32)
    }

    #[inline]
    fn value_from_lower_bound(&self, lower_bound: f64) -> f64 {
        lower_bound * (1.0 + self.relative_accuracy)
    }
}

/// Returns the unbiased binary exponent of `value`.
#[inline]
fn exponent(value: f64) -> f64 {
    (((value.to_bits() & EXPONENT_MASK) >> SIGNIFICAND_WIDTH) as i64 - EXPONENT_BIAS) as f64
}

/// Returns the significand of `value`, scaled into `[1, 2)`.
#[inline]
fn significand_plus_one(value: f64) -> f64 {
    f64::from_bits((value.to_bits() & SIGNIFICAND_MASK) | ONE_BITS)
}

/// Builds a float from an unbiased binary exponent and a significand in `[1, 2)`.
///
/// Significands that rounding pushed just outside of `[1, 2)` are clamped back into it.
#[inline]
fn build_f64(exponent: i64, significand_plus_one: f64) -> f64 {
    let significand_plus_one = significand_plus_one.clamp(1.0, f64::from_bits(ONE_BITS | SIGNIFICAND_MASK));
    let exponent_bits = (((exponent + EXPONENT_BIAS) as u64) << SIGNIFICAND_WIDTH) & EXPONENT_MASK;
    f64::from_bits(exponent_bits | (significand_plus_one.to_bits() & SIGNIFICAND_MASK))
}
