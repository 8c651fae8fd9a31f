// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of the chosen price field over the trailing `window`
// samples.  The output is aligned 1:1 with the input: the first `window - 1`
// cells fall inside the warm-up and hold `None` rather than a fabricated
// number.

/// Compute the aligned SMA column for `values`.
///
/// # Edge cases
/// - `window == 0` => all `None`
/// - input shorter than `window` => all `None`
/// - any non-finite value inside a window => `None` for that cell
pub fn sma_series(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || values.len() < window {
        return vec![None; values.len()];
    }

    let mut result = vec![None; window - 1];
    result.reserve(values.len() - window + 1);

    for chunk in values.windows(window) {
        let mean = chunk.iter().sum::<f64>() / window as f64;
        result.push(mean.is_finite().then_some(mean));
    }

    result
}

/// Most recent defined SMA value, if any.
pub fn last_sma(values: &[f64], window: usize) -> Option<f64> {
    sma_series(values, window).into_iter().rev().flatten().next()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_empty_input() {
        assert!(sma_series(&[], 5).is_empty());
    }

    #[test]
    fn sma_window_zero_is_all_none() {
        assert_eq!(sma_series(&[1.0, 2.0], 0), vec![None, None]);
    }

    #[test]
    fn sma_short_series_is_all_none() {
        let result = sma_series(&[1.0, 2.0, 3.0], 5);
        assert_eq!(result, vec![None, None, None]);
    }

    #[test]
    fn sma_output_is_aligned_with_input() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma_series(&values, 3);
        assert_eq!(result.len(), values.len());
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(2.0));
        assert_eq!(result[3], Some(3.0));
        assert_eq!(result[4], Some(4.0));
    }

    #[test]
    fn sma_constant_series_yields_the_constant() {
        let values = [7.5; 10];
        let result = sma_series(&values, 4);
        for cell in &result[3..] {
            assert_eq!(*cell, Some(7.5));
        }
    }

    #[test]
    fn sma_window_one_echoes_input() {
        let values = [3.0, 1.0, 4.0];
        assert_eq!(
            sma_series(&values, 1),
            vec![Some(3.0), Some(1.0), Some(4.0)]
        );
    }

    #[test]
    fn sma_nan_poisons_only_touching_windows() {
        let values = [1.0, f64::NAN, 3.0, 4.0, 5.0];
        let result = sma_series(&values, 2);
        assert_eq!(result[0], None); // warm-up
        assert_eq!(result[1], None); // contains NaN
        assert_eq!(result[2], None); // contains NaN
        assert_eq!(result[3], Some(3.5));
        assert_eq!(result[4], Some(4.5));
    }

    #[test]
    fn last_sma_skips_trailing_none() {
        assert_eq!(last_sma(&[1.0, 2.0, 3.0], 2), Some(2.5));
        assert_eq!(last_sma(&[1.0], 2), None);
    }
}
