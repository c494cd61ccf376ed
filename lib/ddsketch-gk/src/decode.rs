//! Wire decoder for DDSketch payloads.

use datadog_protos::sketches::{DDSketch as ProtoDDSketch, Store as ProtoStore};
use protobuf::Message as _;
use snafu::{ensure, OptionExt as _, ResultExt as _};
use tracing::trace;

use crate::error::{ConversionError, CountOverflow, Decode, InvalidBinCount, InvalidZeroCount, UnsupportedFormat};
use crate::mapping::IndexMapping;

/// A decoded sketch, restricted to positive, contiguously-encoded bins.
///
/// Bucket indices below `offset`, or at/above `offset + bins.len()`, implicitly have a count of zero. Populated bins
/// always lie within the mapping's indexable range, and the total count always fits in a `u64`.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedSketch {
    bins: Vec<u64>,
    offset: i32,
    zero_count: u64,
    total_count: u64,
    mapping: IndexMapping,
}

impl DecodedSketch {
    /// Returns the count of the bucket at the given index.
    ///
    /// Indices outside of the populated range report a count of zero.
    pub fn count_at(&self, index: i32) -> u64 {
        if index < self.offset || index >= self.end() {
            return 0;
        }

        self.bins[(index - self.offset) as usize]
    }

    /// Returns the bin counts, starting at [`offset`][Self::offset].
    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// Returns the bucket index of the first bin.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Returns the bucket index one past the last bin.
    pub fn end(&self) -> i32 {
        // Decoding bounds the populated span by the indexable range, which ends below `i32::MAX`.
        self.offset + self.bins.len() as i32
    }

    /// Returns the number of observations recorded as exactly zero.
    pub fn zero_count(&self) -> u64 {
        self.zero_count
    }

    /// Returns the index mapping declared by the sketch.
    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    /// Returns the total number of observations in the sketch.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}

/// Decodes a protobuf-encoded `DDSketch` payload.
///
/// Only the positive-contiguous subset of the format is supported: the mapping must have a zero index offset, the
/// negative store must be empty, and positive bins must be encoded contiguously.
///
/// # Errors
///
/// If the payload is not a valid `DDSketch` message, a `Decode` error is returned. If the declared interpolation scheme
/// has no mapping, an `UnsupportedMapping` error is returned. If the payload uses an unsupported part of the format, an
/// `UnsupportedFormat` error is returned, including when populated bins fall outside of the mapping's indexable range.
/// Negative, non-finite, or out-of-range counts are rejected with `InvalidBinCount` or `InvalidZeroCount`, and a
/// `CountOverflow` error is returned if the counts sum to more than `u64::MAX`.
pub fn decode(payload: &[u8]) -> Result<DecodedSketch, ConversionError> {
    let proto = ProtoDDSketch::parse_from_bytes(payload).context(Decode)?;

    let proto_mapping = proto.mapping.as_ref().context(UnsupportedFormat {
        reason: "missing index mapping",
    })?;
    let mapping = IndexMapping::from_proto(proto_mapping)?;

    ensure!(
        proto_mapping.indexOffset == 0.0,
        UnsupportedFormat {
            reason: "non-zero index offset",
        }
    );

    if let Some(negative) = proto.negativeValues.as_ref() {
        ensure!(
            negative.binCounts.is_empty() && negative.contiguousBinCounts.is_empty(),
            UnsupportedFormat {
                reason: "negative value bins",
            }
        );
    }

    let (bins, offset) = match proto.positiveValues.as_ref() {
        Some(positive) => decode_positive_store(positive, &mapping)?,
        None => (Vec::new(), 0),
    };

    let zero_count = validate_count(proto.zeroCount).context(InvalidZeroCount {
        count: proto.zeroCount,
    })?;

    let total_count = bins
        .iter()
        .try_fold(zero_count, |total, &count| total.checked_add(count))
        .context(CountOverflow)?;

    trace!(
        bins = bins.len(),
        offset,
        zero_count,
        total_count,
        interpolation = ?mapping.interpolation(),
        gamma = mapping.gamma(),
        "Decoded sketch."
    );

    Ok(DecodedSketch {
        bins,
        offset,
        zero_count,
        total_count,
        mapping,
    })
}

fn decode_positive_store(store: &ProtoStore, mapping: &IndexMapping) -> Result<(Vec<u64>, i32), ConversionError> {
    ensure!(
        store.binCounts.is_empty(),
        UnsupportedFormat {
            reason: "sparse positive value bins",
        }
    );

    let offset = store.contiguousBinIndexOffset;
    if !store.contiguousBinCounts.is_empty() {
        let indexable = mapping.indexable_range();
        let last = i64::from(offset) + store.contiguousBinCounts.len() as i64 - 1;
        ensure!(
            i64::from(*indexable.start()) <= i64::from(offset) && last <= i64::from(*indexable.end()),
            UnsupportedFormat {
                reason: "bin indices outside of the mapping's indexable range",
            }
        );
    }

    let bins = store
        .contiguousBinCounts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            validate_count(count).context(InvalidBinCount {
                index: i64::from(offset) + i as i64,
                count,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((bins, offset))
}

/// Converts a wire count into an integer count.
///
/// Fractional counts are truncated towards zero. Returns `None` if the count is negative, not finite, or too large to fit
/// in a `u64`.
fn validate_count(count: f64) -> Option<u64> {
    // `u64::MAX as f64` rounds up to 2^64, the first count that no longer fits.
    if !count.is_finite() || count < 0.0 || count >= u64::MAX as f64 {
        return None;
    }

    Some(count as u64)
}
