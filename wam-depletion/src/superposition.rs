//! Superposition of single-pulse responses over a daily pumping series.

use crate::geometry::AquiferGeometry;

/// Replace missing (NaN) pumping rates with zero.
pub fn fill_missing(pumping: &[f64]) -> Vec<f64> {
    pumping
        .iter()
        .map(|q| if q.is_nan() { 0.0 } else { *q })
        .collect()
}

/// Decompose a pumping series into step changes: `dQ[0] = Q[0]`,
/// `dQ[i] = Q[i] - Q[i-1]`. Missing rates count as zero.
pub fn step_changes(pumping: &[f64]) -> Vec<f64> {
    let filled = fill_missing(pumping);
    let mut previous = 0.0;
    filled
        .iter()
        .map(|&q| {
            let dq = q - previous;
            previous = q;
            dq
        })
        .collect()
}

/// Rebuild a pumping series from its step changes (cumulative sum).
pub fn reconstruct(steps: &[f64]) -> Vec<f64> {
    steps
        .iter()
        .scan(0.0, |total, dq| {
            *total += dq;
            Some(*total)
        })
        .collect()
}

/// Depletion at step `j` from the first `j + 1` step changes.
///
/// Sums in ascending order of the step change so that the batch and the
/// interactive paths produce bit-identical results.
pub(crate) fn depletion_at(kernel: &[f64], steps: &[f64], j: usize) -> f64 {
    steps[..=j]
        .iter()
        .enumerate()
        .map(|(i, dq)| kernel[j - i] * dq)
        .sum()
}

/// Stream depletion for every day of a pumping series.
///
/// Output has the same length and indexing as `pumping` and carries its
/// unit. Each step change starts its own Theis response on the day it
/// occurs; a change on day `i` contributes `erfc(sqrt(SDF / 4(j - i + 1))) * dQ[i]`
/// on day `j`.
pub fn batch_depletion(geometry: &AquiferGeometry, pumping: &[f64]) -> Vec<f64> {
    let steps = step_changes(pumping);
    let kernel = geometry.kernel(steps.len());
    (0..steps.len())
        .map(|j| depletion_at(&kernel, &steps, j))
        .collect()
}
