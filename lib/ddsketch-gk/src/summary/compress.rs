use super::{band_width, Entry, RankSummary};

impl RankSummary {
    /// Compresses the summary by merging runs of adjacent entries.
    ///
    /// Walking from the largest value down, each entry absorbs the run of entries directly to its left for as long as
    /// the combined `g`, plus the entry's own `g` and `delta`, stays below `floor(2 * EPSILON * n)`. The absorbing entry
    /// keeps its value and `delta`, so the rank bounds of every remaining entry are unchanged. The first entry is never
    /// absorbed, and the last entry always survives, so exact endpoints stay exact.
    ///
    /// Compressing an already-compressed summary leaves it unchanged.
    pub fn compress(&mut self) {
        let len = self.entries.len();
        if len < 3 {
            return;
        }

        let threshold = band_width(self.n);
        let entries = &self.entries;
        let mut compressed = Vec::with_capacity(len);

        let mut i = len - 1;
        while i >= 2 {
            let right = entries[i];

            let mut j = i - 1;
            let mut band = entries[j].g;
            while j >= 1 && (band + right.g).saturating_add(right.delta) < threshold {
                j -= 1;
                band += entries[j].g;
            }
            band -= entries[j].g;
            j += 1;

            compressed.push(Entry::new(right.v, band + right.g, right.delta));
            i = j - 1;
        }

        compressed.extend(entries[..=i].iter().rev());
        compressed.reverse();

        self.entries = compressed;
    }
}

#[cfg(test)]
mod tests {
    use proptest::{prelude::*, proptest};

    use super::*;
    use crate::summary::EPSILON;

    fn unit_entries(count: u64) -> Vec<Entry> {
        (0..count).map(|i| Entry::new(i as f64, 1, 0)).collect()
    }

    #[test]
    fn small_summaries_untouched() {
        for count in 0..3 {
            let mut summary = RankSummary::from_parts(1_000, unit_entries(count));
            let expected = summary.clone();
            summary.compress();
            assert_eq!(summary, expected);
        }
    }

    #[test]
    fn zero_threshold_untouched() {
        // floor(2 * EPSILON * 10) == 0, so no band can ever fit.
        let mut summary = RankSummary::from_parts(10, unit_entries(10));
        let expected = summary.clone();
        summary.compress();
        assert_eq!(summary, expected);
    }

    #[test]
    fn merges_runs_into_right_edge() {
        // n = 500 gives a threshold of 10.
        let mut entries = unit_entries(6);
        entries.push(Entry::new(6.0, 494, 0));
        let mut summary = RankSummary::from_parts(500, entries);

        summary.compress();

        // Entries 1..=4 fold into entry 5 (1+1+1+1 + 1 + 0 < 10); entry 0 is never absorbed.
        assert_eq!(
            summary.entries(),
            &[Entry::new(0.0, 1, 0), Entry::new(5.0, 5, 0), Entry::new(6.0, 494, 0)]
        );
        assert_eq!(summary.n(), 500);
    }

    #[test]
    fn delta_limits_band() {
        // Threshold of 10: an entry with delta 7 can absorb at most one unit neighbor.
        let mut summary = RankSummary::from_parts(
            500,
            vec![
                Entry::new(0.0, 1, 0),
                Entry::new(1.0, 1, 0),
                Entry::new(2.0, 1, 0),
                Entry::new(3.0, 1, 7),
                Entry::new(4.0, 496, 0),
            ],
        );

        summary.compress();

        assert_eq!(
            summary.entries(),
            &[
                Entry::new(0.0, 1, 0),
                Entry::new(1.0, 1, 0),
                Entry::new(3.0, 2, 7),
                Entry::new(4.0, 496, 0),
            ]
        );
    }

    #[test]
    fn compress_is_idempotent() {
        let mut summary = RankSummary::from_parts(5_000, {
            let mut entries = unit_entries(1_000);
            entries.push(Entry::new(1_000.0, 4_000, 0));
            entries
        });

        summary.compress();
        let once = summary.clone();
        summary.compress();
        assert_eq!(summary, once);
        assert!(once.len() < 1_001);
    }

    fn arbitrary_summary() -> impl Strategy<Value = RankSummary> {
        prop::collection::vec((1u64..50, 0u64..20), 1..400).prop_map(|parts| {
            let count = parts.len();
            let mut n = 0;
            let entries = parts
                .into_iter()
                .enumerate()
                .map(|(i, (g, delta))| {
                    n += g;
                    let delta = if i == 0 || i == count - 1 { 0 } else { delta };
                    Entry::new(i as f64, g, delta)
                })
                .collect();
            RankSummary::from_parts(n, entries)
        })
    }

    proptest! {
        #[test]
        fn property_test_compress_invariants(summary in arbitrary_summary()) {
            let original = summary.clone();
            let mut compressed = summary;
            compressed.compress();

            prop_assert!(compressed.len() <= original.len());
            prop_assert_eq!(compressed.entries().iter().map(|e| e.g).sum::<u64>(), original.n());
            prop_assert_eq!(compressed.entries().first(), original.entries().first());
            prop_assert_eq!(
                compressed.entries().last().map(|e| (e.v, e.delta)),
                original.entries().last().map(|e| (e.v, e.delta))
            );
            for pair in compressed.entries().windows(2) {
                prop_assert!(pair[0].v < pair[1].v);
            }

            let threshold = (2.0 * EPSILON * original.n() as f64).floor() as u64;
            for (kept, entry) in compressed.entries().iter().enumerate().skip(1) {
                let source = original.entries().iter().find(|e| e.v == entry.v).unwrap();
                prop_assert_eq!(entry.delta, source.delta);
                if entry.g != source.g {
                    prop_assert!(entry.g + entry.delta < threshold, "entry {} absorbed too much", kept);
                }
            }
        }

        #[test]
        fn property_test_compress_idempotent(summary in arbitrary_summary()) {
            let mut once = summary;
            once.compress();
            let mut twice = once.clone();
            twice.compress();
            prop_assert_eq!(once, twice);
        }
    }
}
