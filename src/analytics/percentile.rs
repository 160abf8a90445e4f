//! Linear-interpolation percentiles over pre-sorted samples.

use serde::Serialize;
use std::collections::BTreeMap;

/// Ranks reported for every latency table.
pub const PERCENTILE_RANKS: [u32; 5] = [25, 50, 75, 95, 99];

/// Percentile of an ascending sample, interpolating between order statistics.
///
/// The sample must already be sorted; it is not re-sorted here. An empty
/// sample yields `0.0`.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let idx = (p / 100.0) * (n - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = lo + 1;
    let frac = idx - lo as f64;
    if hi >= n {
        return sorted[n - 1];
    }
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Rank → value, serialized with the rank as the key (`{"25": 12.5, ...}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PercentileTable(BTreeMap<u32, f64>);

impl PercentileTable {
    /// Build the table for [`PERCENTILE_RANKS`], rounding to two decimals.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self(
            PERCENTILE_RANKS
                .iter()
                .map(|&p| (p, round2(percentile(sorted, p as f64))))
                .collect(),
        )
    }

    /// Sort an unordered sample and build the table from it.
    pub fn from_unsorted(mut sample: Vec<f64>) -> Self {
        sample.sort_by(f64::total_cmp);
        Self::from_sorted(&sample)
    }

    pub fn get(&self, rank: u32) -> Option<f64> {
        self.0.get(&rank).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
