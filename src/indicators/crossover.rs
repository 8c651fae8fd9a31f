// =============================================================================
// Dual SMA Crossover
// =============================================================================
//
// Two SMAs at different windows plus a boolean signal column: true exactly
// when the short SMA sits above the long SMA at that timestamp.  A naive
// trend-following signal for display, not an order-execution instruction.

use super::sma::sma_series;

/// The aligned crossover columns.
#[derive(Debug, Clone)]
pub struct CrossoverColumns {
    pub short: Vec<Option<f64>>,
    pub long: Vec<Option<f64>>,
    /// `Some(true)` when short > long; `None` while either SMA is warming up.
    pub signal: Vec<Option<bool>>,
}

/// Compute aligned short/long SMAs and the crossover signal for `values`.
pub fn crossover_series(
    values: &[f64],
    short_window: usize,
    long_window: usize,
) -> CrossoverColumns {
    let short = sma_series(values, short_window);
    let long = sma_series(values, long_window);

    let signal = short
        .iter()
        .zip(long.iter())
        .map(|(s, l)| match (s, l) {
            (Some(s), Some(l)) => Some(s > l),
            _ => None,
        })
        .collect();

    CrossoverColumns { short, long, signal }
}
