use snafu::Snafu;

use crate::mapping::IndexMapping;

/// Errors that can occur while converting encoded sketches into rank summaries.
///
/// Every error is terminal for the conversion that raised it: no partial summaries are ever returned.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub(crate)))]
pub enum ConversionError {
    /// The payload could not be decoded as a protobuf `DDSketch` message.
    #[snafu(display("failed to decode sketch payload: {}", source))]
    Decode {
        /// Error source.
        source: protobuf::Error,
    },

    /// The payload is a valid `DDSketch` message, but uses parts of the format that are not supported.
    ///
    /// Only sketches with positive, contiguously-encoded bins and a zero index offset can be converted.
    #[snafu(display("sketch format not supported: {}", reason))]
    UnsupportedFormat {
        /// Which part of the format is unsupported.
        reason: &'static str,
    },

    /// The payload declares an interpolation scheme with no matching index mapping.
    #[snafu(display("interpolation not supported: {}", interpolation))]
    UnsupportedMapping {
        /// The raw interpolation value from the payload.
        interpolation: i32,
    },

    /// The payload declares mapping parameters that cannot describe a valid mapping.
    #[snafu(display("invalid index mapping: {}", reason))]
    InvalidMapping {
        /// Why the mapping is invalid.
        reason: &'static str,
    },

    /// A bin count is negative, not finite, or too large to fit in a `u64`.
    #[snafu(display("invalid bin count at index {}: {}", index, count))]
    InvalidBinCount {
        /// The bin index.
        index: i64,

        /// The invalid count value.
        count: f64,
    },

    /// The zero count is negative, not finite, or too large to fit in a `u64`.
    #[snafu(display("invalid zero count: {}", count))]
    InvalidZeroCount {
        /// The invalid count value.
        count: f64,
    },

    /// The counts of the sketches being converted sum to more observations than a `u64` can hold.
    #[snafu(display("total observation count overflows"))]
    CountOverflow,

    /// The two sketches being merged declare different index mappings.
    #[snafu(display("index mapping mismatch between ok sketch ({:?}) and error sketch ({:?})", ok, err))]
    MappingMismatch {
        /// Mapping declared by the ok sketch.
        ok: IndexMapping,

        /// Mapping declared by the error sketch.
        err: IndexMapping,
    },
}
