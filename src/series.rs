// =============================================================================
// Canonical time-indexed price series
// =============================================================================
//
// Every upstream source (FX daily, equity intraday, crypto market chart) is
// reshaped into this one form before any indicator runs.  A sample carries a
// timestamp plus a subset of the canonical numeric fields; a field the source
// did not provide is `None`, never a silent zero.
//
// Invariant after `sort_dedup`: timestamps are unique and strictly ascending.
// Duplicate timestamps resolve last-write-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical numeric fields a sample may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Price,
    Volume,
    Average,
}

impl std::fmt::Display for PriceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Price => "price",
            Self::Volume => "volume",
            Self::Average => "average",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            "price" => Ok(Self::Price),
            "volume" => Ok(Self::Volume),
            "average" => Ok(Self::Average),
            other => Err(format!("unknown price field '{other}'")),
        }
    }
}

/// A single time-stamped sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub open: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub average: Option<f64>,
}

impl PricePoint {
    /// A sample with only a timestamp; fill fields as the source provides them.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close: None,
            price: None,
            volume: None,
            average: None,
        }
    }

    /// Read one canonical field.
    pub fn get(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Price => self.price,
            PriceField::Volume => self.volume,
            PriceField::Average => self.average,
        }
    }
}

/// An ordered sequence of time-stamped samples (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sort ascending by timestamp and drop duplicate timestamps,
    /// last-write-wins.  Idempotent: re-running on an already-normalized
    /// series changes nothing.
    pub fn sort_dedup(&mut self) {
        // Stable sort keeps insertion order among equal timestamps, so the
        // last inserted sample for a timestamp survives the dedup below.
        self.points.sort_by_key(|p| p.timestamp);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(self.points.len());
        for point in self.points.drain(..) {
            match deduped.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => deduped.push(point),
            }
        }
        self.points = deduped;
    }

    /// Extract one field as a dense vector aligned with the timestamps.
    pub fn field(&self, field: PriceField) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.get(field)).collect()
    }

    /// Extract one field with missing samples as NaN.  The indicator engine
    /// uses this form: any window touching a NaN produces a `None` cell.
    pub fn field_or_nan(&self, field: PriceField) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.get(field).unwrap_or(f64::NAN))
            .collect()
    }

    /// Timestamp of the newest sample, if any.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Keep only samples within `days` days of the newest sample.
    pub fn tail_days(&mut self, days: i64) {
        if days <= 0 {
            return;
        }
        if let Some(newest) = self.last_timestamp() {
            let cutoff = newest - chrono::Duration::days(days);
            self.points.retain(|p| p.timestamp >= cutoff);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn point(secs: i64, close: f64) -> PricePoint {
        let mut p = PricePoint::at(ts(secs));
        p.close = Some(close);
        p
    }

    #[test]
    fn sort_dedup_orders_ascending() {
        let mut series = PriceSeries::new(vec![point(30, 3.0), point(10, 1.0), point(20, 2.0)]);
        series.sort_dedup();
        let stamps: Vec<_> = series.points.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![ts(10), ts(20), ts(30)]);
    }

    #[test]
    fn sort_dedup_last_write_wins() {
        let mut series = PriceSeries::new(vec![point(10, 1.0), point(20, 2.0), point(10, 9.0)]);
        series.sort_dedup();
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0].close, Some(9.0));
    }

    #[test]
    fn sort_dedup_is_idempotent() {
        let mut series = PriceSeries::new(vec![point(20, 2.0), point(10, 1.0), point(10, 5.0)]);
        series.sort_dedup();
        let once = series.clone();
        series.sort_dedup();
        assert_eq!(series, once);
    }

    #[test]
    fn field_preserves_missing_as_none() {
        let mut with_volume = point(10, 1.0);
        with_volume.volume = Some(500.0);
        let series = PriceSeries::new(vec![with_volume, point(20, 2.0)]);

        let volumes = series.field(PriceField::Volume);
        assert_eq!(volumes, vec![Some(500.0), None]);
    }

    #[test]
    fn field_or_nan_marks_gaps() {
        let series = PriceSeries::new(vec![point(10, 1.0), PricePoint::at(ts(20))]);
        let closes = series.field_or_nan(PriceField::Close);
        assert_eq!(closes[0], 1.0);
        assert!(closes[1].is_nan());
    }

    #[test]
    fn tail_days_keeps_recent_window() {
        let day = 86_400;
        let mut series = PriceSeries::new(vec![
            point(0, 1.0),
            point(day, 2.0),
            point(2 * day, 3.0),
            point(3 * day, 4.0),
        ]);
        series.tail_days(1);
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0].close, Some(3.0));
    }

    #[test]
    fn price_field_round_trips_from_str() {
        for name in ["open", "high", "low", "close", "price", "volume", "average"] {
            let field: PriceField = name.parse().unwrap();
            assert_eq!(field.to_string(), name);
        }
        assert!("bogus".parse::<PriceField>().is_err());
    }
}
