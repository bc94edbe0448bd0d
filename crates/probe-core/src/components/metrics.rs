//! # Metrics Accumulator
//!
//! Cumulative per-series latency averages in whole milliseconds:
//!
//! ```text
//! avg' = if avg == 0 { sample } else { (avg * (n - 1) + sample) / n }
//! ```
//!
//! `n` is the 1-based sample index supplied by the caller. Applying the same
//! `n` twice replaces that sample instead of counting it again, so replaying
//! an update is idempotent.
//!
//! State lives for the process only; nothing is persisted.

use std::collections::BTreeMap;

use crate::domain::SeriesKind;

/// Running average of one series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimingSeries {
    /// Index of the last applied sample (0 before the first).
    pub count: u64,
    /// Current average in milliseconds.
    pub average_ms: u64,
    base_ms: u64,
}

impl TimingSeries {
    fn apply(&mut self, sample_ms: u64, n: u64) -> u64 {
        let n = n.max(1);
        if n != self.count {
            self.base_ms = self.average_ms;
        }
        self.average_ms = if self.base_ms == 0 {
            sample_ms
        } else {
            let total = u128::from(self.base_ms) * u128::from(n - 1) + u128::from(sample_ms);
            (total / u128::from(n)) as u64
        };
        self.count = n;
        self.average_ms
    }
}

/// Averages of all series at a point in time.
pub type MetricsSnapshot = BTreeMap<SeriesKind, TimingSeries>;

/// Per-series cumulative averages.
#[derive(Clone, Debug, Default)]
pub struct MetricsAccumulator {
    series: BTreeMap<SeriesKind, TimingSeries>,
}

impl MetricsAccumulator {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `sample_ms` into `series` as sample number `n`. Returns the new average.
    pub fn update(&mut self, series: SeriesKind, sample_ms: u64, n: u64) -> u64 {
        self.series.entry(series).or_default().apply(sample_ms, n)
    }

    /// Index the next sample of `series` would get when counted per series.
    pub fn next_index(&self, series: SeriesKind) -> u64 {
        self.series.get(&series).map_or(0, |s| s.count) + 1
    }

    /// Current average, 0 before the first sample.
    pub fn average(&self, series: SeriesKind) -> u64 {
        self.series.get(&series).map_or(0, |s| s.average_ms)
    }

    /// Index of the last applied sample.
    pub fn count(&self, series: SeriesKind) -> u64 {
        self.series.get(&series).map_or(0, |s| s.count)
    }

    /// Copy of every series.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.series.clone()
    }
}
