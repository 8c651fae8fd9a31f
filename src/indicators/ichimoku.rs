// =============================================================================
// Ichimoku approximation — single-field stand-in
// =============================================================================
//
// True Ichimoku needs distinct high/low/close series; the crypto sources in
// this pipeline provide a single price per sample.  The approximation feeds
// that one field everywhere a high, low, or close is called for:
//
//   tenkan   (conversion) = (max + min over  9) / 2
//   kijun    (base)       = (max + min over 26) / 2
//   senkou_a (leading A)  = (tenkan + kijun) / 2
//   senkou_b (leading B)  = (max + min over 52) / 2
//
// The leading spans are NOT displaced forward: every column stays aligned
// 1:1 with the base timestamps.  This is an explicitly labeled approximation
// for display, not the real indicator.

/// Standard Ichimoku look-back windows.
pub const TENKAN_WINDOW: usize = 9;
pub const KIJUN_WINDOW: usize = 26;
pub const SENKOU_B_WINDOW: usize = 52;

/// The four aligned approximation columns.
#[derive(Debug, Clone)]
pub struct IchimokuColumns {
    pub tenkan: Vec<Option<f64>>,
    pub kijun: Vec<Option<f64>>,
    pub senkou_a: Vec<Option<f64>>,
    pub senkou_b: Vec<Option<f64>>,
}

/// Compute the aligned Ichimoku approximation for `values`.
pub fn ichimoku_series(values: &[f64]) -> IchimokuColumns {
    let tenkan = midpoint_series(values, TENKAN_WINDOW);
    let kijun = midpoint_series(values, KIJUN_WINDOW);
    let senkou_b = midpoint_series(values, SENKOU_B_WINDOW);

    let senkou_a = tenkan
        .iter()
        .zip(kijun.iter())
        .map(|(t, k)| match (t, k) {
            (Some(t), Some(k)) => Some((t + k) / 2.0),
            _ => None,
        })
        .collect();

    IchimokuColumns {
        tenkan,
        kijun,
        senkou_a,
        senkou_b,
    }
}

/// Rolling (max + min) / 2 over a trailing window, aligned 1:1 with input.
fn midpoint_series(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || values.len() < window {
        return vec![None; values.len()];
    }

    let mut result = vec![None; window - 1];
    result.reserve(values.len() - window + 1);

    for chunk in values.windows(window) {
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        let mut poisoned = false;
        for &v in chunk {
            if !v.is_finite() {
                poisoned = true;
                break;
            }
            max = max.max(v);
            min = min.min(v);
        }
        result.push(if poisoned { None } else { Some((max + min) / 2.0) });
    }

    result
}
