use snafu::ensure;
use tracing::debug;

use crate::decode::{decode, DecodedSketch};
use crate::error::{ConversionError, CountOverflow, MappingMismatch};
use crate::summary::{band_width, Entry, RankSummary};

/// Rank summaries produced from a pair of "ok" and "error" sketches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GkSummaries {
    /// Summary of every observation: ok and error combined.
    pub hits: RankSummary,

    /// Summary of error observations alone.
    pub errors: RankSummary,
}

/// Converts a pair of encoded DDSketches into rank summaries.
///
/// `ok` holds the distribution of successful observations, and `err` the distribution of failed ones. Both payloads
/// must be protobuf-encoded `DDSketch` messages declaring the same index mapping. The resulting `hits` summary covers
/// both populations, while the `errors` summary covers only `err`.
///
/// Each populated bucket becomes a single summary entry whose value is the bucket's representative value. Observations
/// recorded as exactly zero form a leading entry with a value of zero.
///
/// # Errors
///
/// If either payload fails to decode, the error from that payload is returned. If the two payloads declare different
/// index mappings, a `MappingMismatch` error is returned. If the two payloads together hold more than `u64::MAX`
/// observations, a `CountOverflow` error is returned. No partial result is ever returned.
pub fn ddsketch_to_gk(ok: &[u8], err: &[u8]) -> Result<GkSummaries, ConversionError> {
    let ok = decode(ok)?;
    let err = decode(err)?;

    ensure!(
        ok.mapping().is_equivalent(err.mapping()),
        MappingMismatch {
            ok: ok.mapping().clone(),
            err: err.mapping().clone(),
        }
    );

    // Every running count of the merge is bounded by the combined total.
    ensure!(ok.total_count().checked_add(err.total_count()).is_some(), CountOverflow);

    let summaries = merge_sketches(&ok, &err);

    debug!(
        hits = summaries.hits.n(),
        hits_entries = summaries.hits.len(),
        errors = summaries.errors.n(),
        errors_entries = summaries.errors.len(),
        "Converted sketches to rank summaries."
    );

    Ok(summaries)
}

fn merge_sketches(ok: &DecodedSketch, err: &DecodedSketch) -> GkSummaries {
    let hits = Accumulator::with_zeros(ok.zero_count() + err.zero_count());
    let errors = Accumulator::with_zeros(err.zero_count());

    let (hits, errors) = scan_range(ok, err)
        .filter_map(|index| {
            let g_err = err.count_at(index);
            let g_hits = ok.count_at(index) + g_err;
            (g_hits > 0).then(|| (ok.mapping().value(index), g_hits, g_err))
        })
        .fold((hits, errors), |(hits, errors), (v, g_hits, g_err)| {
            (hits.push(v, g_hits), errors.push(v, g_err))
        });

    GkSummaries {
        hits: hits.finish(),
        errors: errors.finish(),
    }
}

/// Returns the union of the bucket index spans occupied by either sketch.
fn scan_range(ok: &DecodedSketch, err: &DecodedSketch) -> std::ops::Range<i32> {
    let spans = [ok, err]
        .into_iter()
        .filter(|sketch| !sketch.bins().is_empty())
        .map(|sketch| (sketch.offset(), sketch.end()));

    let (low, high) = spans.fold((i32::MAX, i32::MIN), |(low, high), (start, end)| {
        (low.min(start), high.max(end))
    });

    low..high
}

/// Running state of a summary under construction.
///
/// Buckets arrive in ascending order, so each one is appended as-is with a delta proportional to the number of
/// observations folded in before it.
#[derive(Debug, Default)]
struct Accumulator {
    n: u64,
    entries: Vec<Entry>,
}

impl Accumulator {
    fn with_zeros(zero_count: u64) -> Self {
        if zero_count == 0 {
            return Self::default();
        }

        Self {
            n: zero_count,
            entries: vec![Entry::new(0.0, zero_count, 0)],
        }
    }

    fn push(mut self, v: f64, g: u64) -> Self {
        if g == 0 {
            return self;
        }

        self.n += g;
        self.entries.push(Entry::new(v, g, band_width(self.n - 1)));
        self
    }

    fn finish(self) -> RankSummary {
        let mut summary = RankSummary::from_parts(self.n, self.entries);
        summary.make_endpoints_exact();
        summary.compress();
        summary
    }
}
