// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band = SMA(window); upper/lower = middle ± k·σ, where σ is the
// trailing *sample* standard deviation over the same window.  All three
// columns are aligned 1:1 with the input; warm-up cells are `None`.
//
// A constant-price window has zero variance, so upper == middle == lower
// there — that is the expected output, not a degenerate case.

use super::sma::sma_series;

/// The three aligned Bollinger columns.
#[derive(Debug, Clone)]
pub struct BollingerColumns {
    pub mid: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
}

/// Compute aligned Bollinger Bands for `values`.
pub fn bollinger_series(values: &[f64], window: usize, k: f64) -> BollingerColumns {
    let mid = sma_series(values, window);
    let mut high = vec![None; values.len()];
    let mut low = vec![None; values.len()];

    if window == 0 || values.len() < window {
        return BollingerColumns { mid, high, low };
    }

    for (offset, chunk) in values.windows(window).enumerate() {
        let i = offset + window - 1;
        let Some(mean) = mid[i] else { continue };

        // Sample standard deviation; a single-sample window has no spread.
        let sigma = if window < 2 {
            0.0
        } else {
            let variance = chunk.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (window - 1) as f64;
            variance.sqrt()
        };

        if sigma.is_finite() {
            high[i] = Some(mean + k * sigma);
            low[i] = Some(mean - k * sigma);
        }
    }

    BollingerColumns { mid, high, low }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_short_series_is_all_none() {
        let bands = bollinger_series(&[1.0, 2.0], 5, 2.0);
        assert!(bands.mid.iter().all(Option::is_none));
        assert!(bands.high.iter().all(Option::is_none));
        assert!(bands.low.iter().all(Option::is_none));
    }

    #[test]
    fn bollinger_constant_series_collapses_bands() {
        let values = [100.0; 25];
        let bands = bollinger_series(&values, 20, 2.0);
        for i in 19..25 {
            assert_eq!(bands.mid[i], Some(100.0));
            assert_eq!(bands.high[i], Some(100.0));
            assert_eq!(bands.low[i], Some(100.0));
        }
        assert_eq!(bands.mid[18], None);
    }

    #[test]
    fn bollinger_bands_bracket_the_middle() {
        let values: Vec<f64> = (1..=30).map(|i| i as f64).collect();
        let bands = bollinger_series(&values, 10, 2.0);
        for i in 9..30 {
            let (mid, high, low) = (
                bands.mid[i].unwrap(),
                bands.high[i].unwrap(),
                bands.low[i].unwrap(),
            );
            assert!(high > mid);
            assert!(low < mid);
            assert!(((high - mid) - (mid - low)).abs() < 1e-9, "bands are symmetric");
        }
    }

    #[test]
    fn bollinger_uses_sample_standard_deviation() {
        // Window [1, 2, 3, 4]: mean 2.5, sample variance 5/3.
        let values = [1.0, 2.0, 3.0, 4.0];
        let bands = bollinger_series(&values, 4, 2.0);
        let sigma = (5.0_f64 / 3.0).sqrt();
        assert!((bands.high[3].unwrap() - (2.5 + 2.0 * sigma)).abs() < 1e-9);
        assert!((bands.low[3].unwrap() - (2.5 - 2.0 * sigma)).abs() < 1e-9);
    }

    #[test]
    fn bollinger_columns_stay_aligned() {
        let values = [5.0, 6.0, 7.0, 8.0];
        let bands = bollinger_series(&values, 2, 2.0);
        assert_eq!(bands.mid.len(), values.len());
        assert_eq!(bands.high.len(), values.len());
        assert_eq!(bands.low.len(), values.len());
    }
}
