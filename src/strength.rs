// =============================================================================
// Strength Score — last price vs trailing SMA
// =============================================================================
//
// A single bounded heuristic scalar for the dashboard gauge:
//
//   strength = clamp((last_price - SMA(window)) / SMA(window), -1, +1)
//
// Illustrative only — no predictive claim.  A series shorter than the window
// (or one with a degenerate SMA) scores the neutral midpoint 0.0.  The gauge
// display maps the score into 0..100 via `gauge_value`.

use crate::indicators::sma::last_sma;
use crate::series::{PriceField, PriceSeries};

/// Default trailing window for the strength score.
pub const DEFAULT_STRENGTH_WINDOW: usize = 20;

/// Compute the buy/sell strength of `series` in [-1.0, +1.0].
///
/// Uses the spot `price` field when the series carries one (the crypto
/// path), falling back to `close` otherwise.
pub fn buy_sell_strength(series: &PriceSeries, window: usize) -> f64 {
    let field = if series.points.iter().any(|p| p.price.is_some()) {
        PriceField::Price
    } else {
        PriceField::Close
    };
    buy_sell_strength_on(series, field, window)
}

/// Strength score over an explicit price field.
pub fn buy_sell_strength_on(series: &PriceSeries, field: PriceField, window: usize) -> f64 {
    if window == 0 || series.len() < window {
        return 0.0;
    }

    let values = series.field_or_nan(field);
    let Some(last_price) = values.last().copied().filter(|v| v.is_finite()) else {
        return 0.0;
    };
    let Some(sma) = last_sma(&values, window) else {
        return 0.0;
    };
    if sma <= 0.0 {
        return 0.0;
    }

    ((last_price - sma) / sma).clamp(-1.0, 1.0)
}

/// Map a strength score onto the 0..100 gauge scale.
pub fn gauge_value(score: f64) -> f64 {
    (score + 1.0) * 50.0
}
