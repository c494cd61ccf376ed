//! Greenwald-Khanna rank summaries.

use std::iter::Peekable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod compress;

/// Target relative rank error of every summary.
///
/// A summary over `n` observations answers any quantile query with a rank error of at most `2 * EPSILON * n`.
pub const EPSILON: f64 = 0.01;

/// A single summary entry.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entry {
    /// Observed, or representative, value.
    pub v: f64,

    /// Number of ranks covered by this entry since the previous entry.
    pub g: u64,

    /// Maximum uncertainty in the rank of `v`.
    pub delta: u64,
}

impl Entry {
    /// Creates a new `Entry`.
    pub const fn new(v: f64, g: u64, delta: u64) -> Self {
        Self { v, g, delta }
    }
}

/// An epsilon-approximate rank summary.
///
/// Entries are kept in strictly ascending order of value, and their `g` values always sum to the number of observations
/// represented by the summary. The first and last entries are exact (`delta == 0`), so the minimum and maximum values
/// are never approximated.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RankSummary {
    n: u64,
    entries: Vec<Entry>,
}

impl RankSummary {
    /// Creates an empty `RankSummary`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `RankSummary` from raw parts.
    ///
    /// The caller is responsible for the entries being in ascending order of value and for `n` being the sum of their
    /// `g` values.
    pub(crate) fn from_parts(n: u64, entries: Vec<Entry>) -> Self {
        Self { n, entries }
    }

    /// Returns the number of observations represented by this summary.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns the entries of this summary, in ascending order of value.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns `true` if the summary represents no observations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries in the summary.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the approximate value at the given quantile.
    ///
    /// The rank of the returned value is within `2 * EPSILON * n` of the rank targeted by `q`. The minimum and maximum
    /// values are exact.
    ///
    /// Returns `None` if the summary is empty, or if `q` is not in `[0, 1]`.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.is_empty() || !(0.0..=1.0).contains(&q) {
            return None;
        }

        if q == 0.0 {
            return self.entries.first().map(|e| e.v);
        }
        if q == 1.0 {
            return self.entries.last().map(|e| e.v);
        }

        let rank = ((q * self.n as f64).ceil() as u64).clamp(1, self.n);

        let mut cumulative = 0;
        for entry in &self.entries {
            cumulative += entry.g;
            if cumulative.saturating_add(entry.delta) >= rank {
                return Some(entry.v);
            }
        }

        self.entries.last().map(|e| e.v)
    }

    /// Inserts a single observation.
    ///
    /// NaN values are ignored.
    pub fn insert(&mut self, v: f64) {
        if v.is_nan() {
            return;
        }

        let pos = self.entries.partition_point(|e| e.v < v);
        match self.entries.get_mut(pos) {
            Some(existing) if existing.v == v => existing.g += 1,
            _ => {
                let delta = if pos == 0 || pos == self.entries.len() {
                    0
                } else {
                    band_width(self.n)
                };
                self.entries.insert(pos, Entry::new(v, 1, delta));
            }
        }

        self.n += 1;
        if self.n % compression_period() == 0 {
            self.compress();
        }
    }

    /// Merges another summary into this one.
    ///
    /// Entries from one side that fall within the value range of the other side have their `delta` widened by the
    /// maximum rank uncertainty of the other side. Entries with equal values are combined.
    pub fn merge(&mut self, other: &RankSummary) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other.clone();
            return;
        }

        let additional_self_delta = band_width(other.n);
        let additional_other_delta = band_width(self.n);

        let entries = std::mem::take(&mut self.entries);
        let mut merged = Vec::with_capacity(entries.len() + other.entries.len());
        let mut self_entries = entries.into_iter().peekable();
        let mut other_entries = other.entries.iter().copied().peekable();
        let mut started_self = false;
        let mut started_other = false;

        while let (Some(a), Some(b)) = (self_entries.peek().copied(), other_entries.peek().copied()) {
            let next = if a.v < b.v {
                started_self = true;
                let extra = if started_other { additional_self_delta } else { 0 };
                advance(&mut self_entries, a, extra)
            } else if b.v < a.v {
                started_other = true;
                let extra = if started_self { additional_other_delta } else { 0 };
                advance(&mut other_entries, b, extra)
            } else {
                started_self = true;
                started_other = true;
                self_entries.next();
                other_entries.next();
                Entry::new(a.v, a.g + b.g, a.delta + b.delta)
            };
            merged.push(next);
        }

        merged.extend(self_entries);
        merged.extend(other_entries);

        self.entries = merged;
        self.n += other.n;
        self.make_endpoints_exact();
        self.compress();
    }

    /// Forces the first and last entries to be exact.
    pub(crate) fn make_endpoints_exact(&mut self) {
        if let Some(first) = self.entries.first_mut() {
            first.delta = 0;
        }
        if let Some(last) = self.entries.last_mut() {
            last.delta = 0;
        }
    }
}

fn advance<I: Iterator<Item = Entry>>(entries: &mut Peekable<I>, entry: Entry, extra_delta: u64) -> Entry {
    entries.next();
    Entry::new(entry.v, entry.g, entry.delta + extra_delta)
}

/// Returns the maximum rank uncertainty, `floor(2 * EPSILON * n)`, of a summary over `n` observations.
pub(crate) fn band_width(n: u64) -> u64 {
    (2.0 * EPSILON * n as f64).floor() as u64
}

/// Number of insertions between compressions.
fn compression_period() -> u64 {
    (1.0 / (2.0 * EPSILON)).round() as u64
}
