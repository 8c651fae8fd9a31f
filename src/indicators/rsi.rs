// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Compute price deltas from consecutive samples.
// Step 2 — Seed average gain / average loss with the mean of the first
//          `window` gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (window - 1) + current_gain) / window
//            avg_loss = (prev_avg_loss * (window - 1) + current_loss) / window
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS), in [0, 100].
//
// The output is aligned 1:1 with the input; the first `window` cells fall in
// the warm-up (a full window of deltas is needed) and hold `None`.

/// Compute the aligned RSI column for `values`.
///
/// # Edge cases
/// - `window == 0` or input shorter than `window + 1` => all `None`
/// - flat window (no movement at all) => 50.0
/// - all gains => 100.0; all losses => 0.0
/// - a non-finite delta corrupts Wilder's running averages, so computation
///   stops there and the remaining cells stay `None`
pub fn rsi_series(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window + 1 {
        return result;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let (sum_gain, sum_loss) = deltas[..window]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let window_f = window as f64;
    let mut avg_gain = sum_gain / window_f;
    let mut avg_loss = sum_loss / window_f;

    match rsi_from_averages(avg_gain, avg_loss) {
        Some(rsi) => result[window] = Some(rsi),
        None => return result,
    }

    for (offset, &delta) in deltas[window..].iter().enumerate() {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (window_f - 1.0) + gain) / window_f;
        avg_loss = (avg_loss * (window_f - 1.0) + loss) / window_f;

        match rsi_from_averages(avg_gain, avg_loss) {
            Some(rsi) => result[window + 1 + offset] = Some(rsi),
            None => break,
        }
    }

    result
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // No movement at all — neutral.
    } else if avg_loss == 0.0 {
        100.0 // All gains, no losses.
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}
