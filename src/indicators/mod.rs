// =============================================================================
// Indicator Engine
// =============================================================================
//
// Pure, side-effect-free indicator implementations plus the engine that
// attaches their output to a series as named derived columns.  Every derived
// column is aligned 1:1 with the base series' timestamps; cells inside an
// indicator's warm-up window hold `None`, never a fabricated number.
//
// Given a valid series the engine always produces a result: a series shorter
// than the smallest required window yields all-`None` columns, which is a
// partial display, not an error.

pub mod bollinger;
pub mod crossover;
pub mod ichimoku;
pub mod rsi;
pub mod sma;

use serde::Serialize;

use crate::series::{PriceField, PriceSeries};

/// Which indicator to compute, with its window parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorKind {
    Sma { window: usize },
    Bollinger { window: usize, k: f64 },
    Rsi { window: usize },
    Crossover { short_window: usize, long_window: usize },
    /// Single-field Ichimoku approximation at the standard 9/26/52 windows.
    Ichimoku,
}

/// One named derived column.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedColumn {
    pub name: String,
    pub values: ColumnValues,
}

/// Column payload: numeric for most indicators, boolean for the crossover
/// signal.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ColumnValues {
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A series augmented with derived columns.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorResult {
    pub series: PriceSeries,
    pub columns: Vec<DerivedColumn>,
}

impl IndicatorResult {
    /// Look up a derived column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.values)
    }
}

/// Compute `kind` over `field` of `series` and attach the derived columns.
pub fn apply_indicator(
    series: &PriceSeries,
    kind: IndicatorKind,
    field: PriceField,
) -> IndicatorResult {
    let values = series.field_or_nan(field);

    let columns = match kind {
        IndicatorKind::Sma { window } => vec![DerivedColumn {
            name: format!("sma_{window}"),
            values: ColumnValues::Float(sma::sma_series(&values, window)),
        }],

        IndicatorKind::Bollinger { window, k } => {
            let bands = bollinger::bollinger_series(&values, window, k);
            vec![
                DerivedColumn {
                    name: "bb_mid".into(),
                    values: ColumnValues::Float(bands.mid),
                },
                DerivedColumn {
                    name: "bb_high".into(),
                    values: ColumnValues::Float(bands.high),
                },
                DerivedColumn {
                    name: "bb_low".into(),
                    values: ColumnValues::Float(bands.low),
                },
            ]
        }

        IndicatorKind::Rsi { window } => vec![DerivedColumn {
            name: format!("rsi_{window}"),
            values: ColumnValues::Float(rsi::rsi_series(&values, window)),
        }],

        IndicatorKind::Crossover {
            short_window,
            long_window,
        } => {
            let cols = crossover::crossover_series(&values, short_window, long_window);
            vec![
                DerivedColumn {
                    name: format!("sma_{short_window}"),
                    values: ColumnValues::Float(cols.short),
                },
                DerivedColumn {
                    name: format!("sma_{long_window}"),
                    values: ColumnValues::Float(cols.long),
                },
                DerivedColumn {
                    name: "signal".into(),
                    values: ColumnValues::Bool(cols.signal),
                },
            ]
        }

        IndicatorKind::Ichimoku => {
            let cols = ichimoku::ichimoku_series(&values);
            vec![
                DerivedColumn {
                    name: "tenkan".into(),
                    values: ColumnValues::Float(cols.tenkan),
                },
                DerivedColumn {
                    name: "kijun".into(),
                    values: ColumnValues::Float(cols.kijun),
                },
                DerivedColumn {
                    name: "senkou_a".into(),
                    values: ColumnValues::Float(cols.senkou_a),
                },
                DerivedColumn {
                    name: "senkou_b".into(),
                    values: ColumnValues::Float(cols.senkou_b),
                },
            ]
        }
    };

    IndicatorResult {
        series: series.clone(),
        columns,
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PricePoint;
    use chrono::{TimeZone, Utc};

    fn series_of(closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let mut p = PricePoint::at(Utc.timestamp_opt(i as i64 * 60, 0).unwrap());
                p.close = Some(close);
                p
            })
            .collect();
        PriceSeries::new(points)
    }

    #[test]
    fn sma_column_is_named_by_window() {
        let series = series_of(&[1.0, 2.0, 3.0, 4.0]);
        let result = apply_indicator(&series, IndicatorKind::Sma { window: 2 }, PriceField::Close);
        let Some(ColumnValues::Float(col)) = result.column("sma_2") else {
            panic!("missing sma_2 column");
        };
        assert_eq!(col, &vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn short_series_yields_all_none_not_an_error() {
        let series = series_of(&[1.0, 2.0]);
        let result =
            apply_indicator(&series, IndicatorKind::Rsi { window: 14 }, PriceField::Close);
        let Some(ColumnValues::Float(col)) = result.column("rsi_14") else {
            panic!("missing rsi_14 column");
        };
        assert_eq!(col.len(), 2);
        assert!(col.iter().all(Option::is_none));
    }

    #[test]
    fn bollinger_constant_series_bands_equal_price() {
        let series = series_of(&[50.0; 25]);
        let result = apply_indicator(
            &series,
            IndicatorKind::Bollinger { window: 20, k: 2.0 },
            PriceField::Close,
        );
        for name in ["bb_mid", "bb_high", "bb_low"] {
            let Some(ColumnValues::Float(col)) = result.column(name) else {
                panic!("missing {name}");
            };
            for cell in col.iter().flatten() {
                assert_eq!(*cell, 50.0);
            }
        }
    }

    #[test]
    fn crossover_emits_bool_signal_column() {
        let series = series_of(&(1..=20).map(|i| i as f64).collect::<Vec<_>>());
        let result = apply_indicator(
            &series,
            IndicatorKind::Crossover {
                short_window: 3,
                long_window: 8,
            },
            PriceField::Close,
        );
        assert!(result.column("sma_3").is_some());
        assert!(result.column("sma_8").is_some());
        let Some(ColumnValues::Bool(signal)) = result.column("signal") else {
            panic!("missing signal column");
        };
        assert_eq!(signal.len(), 20);
        assert_eq!(signal[19], Some(true));
    }

    #[test]
    fn ichimoku_emits_four_aligned_columns() {
        let series = series_of(&(1..=60).map(|i| i as f64).collect::<Vec<_>>());
        let result = apply_indicator(&series, IndicatorKind::Ichimoku, PriceField::Close);
        assert_eq!(result.columns.len(), 4);
        for name in ["tenkan", "kijun", "senkou_a", "senkou_b"] {
            assert_eq!(result.column(name).unwrap().len(), series.len());
        }
    }

    #[test]
    fn missing_field_yields_none_cells() {
        // Points carry close but no price; asking for price gives NaN input
        // and therefore all-None output.
        let series = series_of(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = apply_indicator(&series, IndicatorKind::Sma { window: 2 }, PriceField::Price);
        let Some(ColumnValues::Float(col)) = result.column("sma_2") else {
            panic!("missing column");
        };
        assert!(col.iter().all(Option::is_none));
    }
}
