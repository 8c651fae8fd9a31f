// =============================================================================
// Series Normalizer
// =============================================================================
//
// Aligns the heterogeneous upstream schemas into the one canonical
// `PriceSeries` shape: vendor field labels are renamed, textual and
// epoch-millisecond timestamps become `DateTime<Utc>`, and the result is
// sorted ascending with duplicate timestamps dropped last-write-wins.
//
// Crypto sources provide a single price per sample, not genuine OHLC.  For
// those the normalizer synthesizes
//
//   high    = price * 1.02
//   low     = price * 0.98
//   close   = price
//   average = mean(high, low, close)
//
// This is an explicit approximation, not a measurement, and API responses
// built from it are labeled accordingly (see api/rest.rs).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use crate::fetch::FetchError;
use crate::series::{PricePoint, PriceSeries};

/// Synthetic OHLC band applied to single-price crypto samples.
const SYNTH_HIGH_FACTOR: f64 = 1.02;
const SYNTH_LOW_FACTOR: f64 = 0.98;

/// Which upstream schema a raw payload follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Alpha Vantage `FX_DAILY` JSON keyed by date with numbered OHLC labels.
    FxDaily,
    /// CSV fallback with `TIME_PERIOD` / `OBS_VALUE` columns.
    FxCsv,
    /// Alpha Vantage intraday JSON keyed by date-time with numbered OHLCV labels.
    EquityIntraday,
    /// CoinGecko market chart: `{"prices": [[epoch_ms, price], ...], "total_volumes": ...}`.
    CryptoChart,
}

/// A raw upstream payload before normalization.
#[derive(Debug, Clone)]
pub enum RawPayload {
    Json(serde_json::Value),
    Csv(String),
}

/// Reshape `payload` into a canonical series.
///
/// Returns `EmptyData` for a well-formed payload carrying no samples and
/// `ParseFailure` when the payload shape does not match `kind`.
pub fn normalize(payload: &RawPayload, kind: SchemaKind) -> Result<PriceSeries, FetchError> {
    let mut series = match (payload, kind) {
        (RawPayload::Json(value), SchemaKind::FxDaily) => normalize_fx_daily(value)?,
        (RawPayload::Csv(text), SchemaKind::FxCsv) => normalize_fx_csv(text)?,
        (RawPayload::Json(value), SchemaKind::EquityIntraday) => normalize_equity(value)?,
        (RawPayload::Json(value), SchemaKind::CryptoChart) => normalize_crypto_chart(value)?,
        _ => return Err(FetchError::ParseFailure),
    };

    series.sort_dedup();
    if series.is_empty() {
        return Err(FetchError::EmptyData);
    }
    Ok(series)
}

// ---------------------------------------------------------------------------
// FX daily (JSON)
// ---------------------------------------------------------------------------

fn normalize_fx_daily(value: &serde_json::Value) -> Result<PriceSeries, FetchError> {
    let table = value
        .get("Time Series FX (Daily)")
        .and_then(|v| v.as_object())
        .ok_or(FetchError::EmptyData)?;

    let mut points = Vec::with_capacity(table.len());
    for (date, row) in table {
        let Some(timestamp) = parse_timestamp(date) else {
            warn!(date = %date, "skipping FX sample with unparseable date");
            continue;
        };
        let mut point = PricePoint::at(timestamp);
        point.open = value_f64(row.get("1. open"));
        point.high = value_f64(row.get("2. high"));
        point.low = value_f64(row.get("3. low"));
        point.close = value_f64(row.get("4. close"));
        points.push(point);
    }
    Ok(PriceSeries::new(points))
}

// ---------------------------------------------------------------------------
// FX daily (CSV fallback)
// ---------------------------------------------------------------------------

fn normalize_fx_csv(text: &str) -> Result<PriceSeries, FetchError> {
    let mut lines = text.lines();
    let header = lines.next().ok_or(FetchError::EmptyData)?;

    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let time_idx = columns
        .iter()
        .position(|c| *c == "TIME_PERIOD")
        .ok_or(FetchError::ParseFailure)?;
    let value_idx = columns
        .iter()
        .position(|c| *c == "OBS_VALUE")
        .ok_or(FetchError::ParseFailure)?;

    let mut points = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(raw_time), Some(raw_value)) = (cells.get(time_idx), cells.get(value_idx)) else {
            continue;
        };
        let (Some(timestamp), Ok(rate)) = (parse_timestamp(raw_time), raw_value.parse::<f64>())
        else {
            warn!(line = %line, "skipping unparseable FX CSV row");
            continue;
        };
        let mut point = PricePoint::at(timestamp);
        point.close = Some(rate);
        points.push(point);
    }
    Ok(PriceSeries::new(points))
}

// ---------------------------------------------------------------------------
// Equity intraday / interval (JSON)
// ---------------------------------------------------------------------------

fn normalize_equity(value: &serde_json::Value) -> Result<PriceSeries, FetchError> {
    // The time-series key embeds the interval ("Time Series (60min)" etc.),
    // so scan for it rather than hard-coding one interval.
    let object = value.as_object().ok_or(FetchError::ParseFailure)?;
    let table = object
        .iter()
        .find(|(k, _)| k.contains("Time Series"))
        .and_then(|(_, v)| v.as_object())
        .ok_or(FetchError::EmptyData)?;

    let mut points = Vec::with_capacity(table.len());
    for (stamp, row) in table {
        let Some(timestamp) = parse_timestamp(stamp) else {
            warn!(stamp = %stamp, "skipping equity sample with unparseable timestamp");
            continue;
        };
        let mut point = PricePoint::at(timestamp);
        point.open = value_f64(row.get("1. open"));
        point.high = value_f64(row.get("2. high"));
        point.low = value_f64(row.get("3. low"));
        point.close = value_f64(row.get("4. close"));
        point.volume = value_f64(row.get("5. volume"));
        points.push(point);
    }
    Ok(PriceSeries::new(points))
}

// ---------------------------------------------------------------------------
// Crypto market chart (JSON)
// ---------------------------------------------------------------------------

fn normalize_crypto_chart(value: &serde_json::Value) -> Result<PriceSeries, FetchError> {
    let prices = value
        .get("prices")
        .and_then(|v| v.as_array())
        .ok_or(FetchError::EmptyData)?;
    if prices.is_empty() {
        return Err(FetchError::EmptyData);
    }

    // Secondary volume series, left-joined on timestamp below.  Unmatched
    // volume timestamps are dropped; unmatched price timestamps keep a
    // missing volume.
    let volumes: HashMap<i64, f64> = value
        .get("total_volumes")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let pair = row.as_array()?;
                    Some((epoch_ms_i64(pair.first()?)?, pair.get(1)?.as_f64()?))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut points = Vec::with_capacity(prices.len());
    for row in prices {
        let Some(pair) = row.as_array() else {
            return Err(FetchError::ParseFailure);
        };
        let (Some(epoch_ms), Some(price)) = (
            pair.first().and_then(epoch_ms_i64),
            pair.get(1).and_then(|v| v.as_f64()),
        ) else {
            return Err(FetchError::ParseFailure);
        };
        let Some(timestamp) = DateTime::from_timestamp_millis(epoch_ms) else {
            warn!(epoch_ms, "skipping crypto sample with out-of-range timestamp");
            continue;
        };

        let high = price * SYNTH_HIGH_FACTOR;
        let low = price * SYNTH_LOW_FACTOR;
        let close = price;

        let mut point = PricePoint::at(timestamp);
        point.price = Some(price);
        point.high = Some(high);
        point.low = Some(low);
        point.close = Some(close);
        point.average = Some((high + low + close) / 3.0);
        point.volume = volumes.get(&epoch_ms).copied();
        points.push(point);
    }
    Ok(PriceSeries::new(points))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse either an ISO date ("2024-01-05") or a date-time
/// ("2024-01-05 16:00:00") into UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Epoch-millisecond stamps arrive as integers or floats depending on the
/// source; accept both.
fn epoch_ms_i64(value: &serde_json::Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

/// Vendors send numerics as JSON strings; accept either form.
fn value_f64(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
