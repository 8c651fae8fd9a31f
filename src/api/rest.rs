// =============================================================================
// REST API — dashboard endpoints over the data pipeline
// =============================================================================
//
// Endpoints:
//   GET /api/v1/health                  - liveness, version, uptime
//   GET /api/v1/markets                 - top assets by market cap
//   GET /api/v1/fx/:base/:quote        - daily FX series + strength
//   GET /api/v1/equity/:symbol         - intraday equity series + strength
//   GET /api/v1/history/:asset_id      - crypto history, indicators, strength
//   GET /api/v1/errors                  - recent upstream failures
//   GET /api/v1/config                  - current runtime config
//   PUT /api/v1/config                  - replace config, clear caches
//
// Every upstream failure maps to one of four stable error kinds in the JSON
// body, with the HTTP status chosen per kind.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::cache::CacheKey;
use crate::fetch::FetchError;
use crate::indicators::{apply_indicator, IndicatorKind, IndicatorResult};
use crate::runtime_config::{RuntimeConfig, CONFIG_PATH};
use crate::series::{PriceField, PriceSeries};
use crate::strength::{buy_sell_strength, buy_sell_strength_on, gauge_value};
use crate::types::ErrorRecord;

type ApiError = (StatusCode, Json<Value>);

/// Build the service router with permissive CORS for the dashboard frontend.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/markets", get(markets))
        .route("/api/v1/fx/:base/:quote", get(fx_series))
        .route("/api/v1/equity/:symbol", get(equity_series))
        .route("/api/v1/history/:asset_id", get(asset_history))
        .route("/api/v1/errors", get(recent_errors))
        .route("/api/v1/config", get(get_config).put(put_config))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

/// HTTP status for each fetch error kind.
fn status_for(err: &FetchError) -> StatusCode {
    match err {
        FetchError::Unreachable | FetchError::ParseFailure => StatusCode::BAD_GATEWAY,
        FetchError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        FetchError::EmptyData => StatusCode::NOT_FOUND,
    }
}

/// Record the failure and build the error response body.
fn fetch_failure(state: &AppState, operation: &str, err: FetchError) -> ApiError {
    warn!(operation, kind = err.kind(), "upstream fetch failed");
    state.push_error(ErrorRecord {
        message: format!("{operation}: {err}"),
        kind: Some(err.kind().to_string()),
        at: Utc::now().to_rfc3339(),
    });
    (
        status_for(&err),
        Json(json!({ "error": err.to_string(), "kind": err.kind() })),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into(), "kind": "bad_request" })),
    )
}

// =============================================================================
// Request parameter parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct MarketsQuery {
    count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EquityQuery {
    interval: Option<String>,
    span: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    days: Option<u32>,
    granularity: Option<String>,
    indicator: Option<String>,
    window: Option<usize>,
    short: Option<usize>,
    long: Option<usize>,
    field: Option<String>,
}

/// Resolve an indicator name plus optional window overrides against the
/// configured defaults.
fn parse_indicator(
    name: &str,
    query: &HistoryQuery,
    config: &RuntimeConfig,
) -> Result<IndicatorKind, ApiError> {
    let window = query.window.unwrap_or(config.indicator_window);
    match name {
        "sma" => Ok(IndicatorKind::Sma { window }),
        "bollinger" => Ok(IndicatorKind::Bollinger {
            window,
            k: config.bollinger_k,
        }),
        "rsi" => Ok(IndicatorKind::Rsi { window }),
        "crossover" => Ok(IndicatorKind::Crossover {
            short_window: query.short.unwrap_or(config.crossover_short_window),
            long_window: query.long.unwrap_or(config.crossover_long_window),
        }),
        "ichimoku" => Ok(IndicatorKind::Ichimoku),
        other => Err(bad_request(format!("unknown indicator '{other}'"))),
    }
}

fn parse_field(raw: Option<&str>, fallback: PriceField) -> Result<PriceField, ApiError> {
    match raw {
        Some(name) => {
            PriceField::from_str(name).map_err(|_| bad_request(format!("unknown field '{name}'")))
        }
        None => Ok(fallback),
    }
}

// =============================================================================
// Strength summary
// =============================================================================

fn strength_block(series: &PriceSeries, field: Option<PriceField>, window: usize) -> Value {
    // With no explicit field the score picks spot price when present and
    // falls back to close, matching the fetch paths.
    let score = match field {
        Some(field) => buy_sell_strength_on(series, field, window),
        None => buy_sell_strength(series, window),
    };
    json!({
        "score": score,
        "gauge": gauge_value(score),
        "window": window,
    })
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime_secs(),
        "state_version": state.current_state_version(),
        "server_time": Utc::now().to_rfc3339(),
    }))
}

async fn markets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MarketsQuery>,
) -> Result<Json<Value>, ApiError> {
    let count = query
        .count
        .unwrap_or_else(|| state.runtime_config.read().market_listing_count);

    let key = CacheKey::new("market_listing", [count.to_string()]);
    let client = state.market_client.clone();
    let coins = state
        .listing_cache
        .get_or_fetch(key, state.cache_ttl(), || async move {
            client.fetch_market_listing(count).await
        })
        .await
        .map_err(|e| fetch_failure(&state, "market_listing", e))?;

    Ok(Json(json!({ "count": coins.len(), "coins": coins })))
}

async fn fx_series(
    State(state): State<Arc<AppState>>,
    Path((base, quote)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let base = base.to_uppercase();
    let quote = quote.to_uppercase();

    let key = CacheKey::new("fx_series", [base.clone(), quote.clone()]);
    let client = state.market_client.clone();
    let (b, q) = (base.clone(), quote.clone());
    let series = state
        .series_cache
        .get_or_fetch(key, state.cache_ttl(), || async move {
            client.fetch_fx_series(&b, &q).await
        })
        .await
        .map_err(|e| fetch_failure(&state, "fx_series", e))?;

    let window = state.runtime_config.read().strength_window;
    Ok(Json(json!({
        "base": base,
        "quote": quote,
        "samples": series.len(),
        "strength": strength_block(&series, None, window),
        "series": series,
    })))
}

async fn equity_series(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<EquityQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbol = symbol.to_uppercase();
    let interval = query.interval.unwrap_or_else(|| "60min".to_string());
    let span = query.span.unwrap_or(7);
    if span <= 0 {
        return Err(bad_request("span must be positive"));
    }

    let key = CacheKey::new(
        "equity_series",
        [symbol.clone(), interval.clone(), span.to_string()],
    );
    let client = state.market_client.clone();
    let (sym, ivl) = (symbol.clone(), interval.clone());
    let series = state
        .series_cache
        .get_or_fetch(key, state.cache_ttl(), || async move {
            client.fetch_equity_series(&sym, &ivl, span).await
        })
        .await
        .map_err(|e| fetch_failure(&state, "equity_series", e))?;

    let window = state.runtime_config.read().strength_window;
    Ok(Json(json!({
        "symbol": symbol,
        "interval": interval,
        "span_days": span,
        "samples": series.len(),
        "strength": strength_block(&series, None, window),
        "series": series,
    })))
}

async fn asset_history(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = query.days.unwrap_or(30);
    let granularity = query.granularity.clone().unwrap_or_else(|| "daily".to_string());
    let field = parse_field(query.field.as_deref(), PriceField::Price)?;

    let key = CacheKey::new(
        "asset_history",
        [asset_id.clone(), days.to_string(), granularity.clone()],
    );
    let client = state.market_client.clone();
    let (id, gran) = (asset_id.clone(), granularity.clone());
    let series = state
        .series_cache
        .get_or_fetch(key, state.cache_ttl(), || async move {
            client.fetch_asset_history(&id, days, &gran).await
        })
        .await
        .map_err(|e| fetch_failure(&state, "asset_history", e))?;

    let config = state.runtime_config.read().clone();

    let overlay: Option<IndicatorResult> = match query.indicator.as_deref() {
        Some(name) => {
            let kind = parse_indicator(name, &query, &config)?;
            Some(apply_indicator(&series, kind, field))
        }
        None => None,
    };

    let strength = strength_block(&series, Some(field), config.strength_window);

    let mut body = json!({
        "asset_id": asset_id,
        "days": days,
        "granularity": granularity,
        "samples": series.len(),
        "strength": strength,
        // High/low cells are derived at +/-2% around the spot price because
        // the upstream history endpoint carries a single price per sample.
        "synthetic_ohlc": true,
        "note": "high/low/average are synthetic (+/-2% around the spot price)",
    });

    match overlay {
        Some(result) => {
            body["series"] = serde_json::to_value(&result.series)
                .map_err(|_| bad_request("serialization failed"))?;
            body["columns"] = serde_json::to_value(&result.columns)
                .map_err(|_| bad_request("serialization failed"))?;
        }
        None => {
            body["series"] = serde_json::to_value(&series)
                .map_err(|_| bad_request("serialization failed"))?;
        }
    }

    Ok(Json(body))
}

async fn recent_errors(State(state): State<Arc<AppState>>) -> Json<Value> {
    let errors = state.recent_errors();
    Json(json!({ "count": errors.len(), "errors": errors }))
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = state.runtime_config.read().clone();
    Json(json!({
        "state_version": state.current_state_version(),
        "config": config,
    }))
}

async fn put_config(
    State(state): State<Arc<AppState>>,
    Json(new_config): Json<RuntimeConfig>,
) -> Result<Json<Value>, ApiError> {
    if let Err(e) = new_config.save(CONFIG_PATH) {
        warn!(error = %e, "failed to persist runtime config");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "failed to persist config", "kind": "io" })),
        ));
    }

    *state.runtime_config.write() = new_config;
    let version = state.increment_version();

    // Cached responses may embed stale parameters; start clean.
    state.series_cache.clear();
    state.listing_cache.clear();

    info!(state_version = version, "runtime config replaced");
    Ok(Json(json!({ "ok": true, "state_version": version })))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_expected_statuses() {
        assert_eq!(status_for(&FetchError::Unreachable), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&FetchError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status_for(&FetchError::EmptyData), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&FetchError::ParseFailure),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn indicator_names_resolve_with_config_defaults() {
        let config = RuntimeConfig::default();
        let query = HistoryQuery {
            days: None,
            granularity: None,
            indicator: None,
            window: None,
            short: None,
            long: None,
            field: None,
        };

        assert_eq!(
            parse_indicator("sma", &query, &config).unwrap(),
            IndicatorKind::Sma { window: 14 }
        );
        assert_eq!(
            parse_indicator("rsi", &query, &config).unwrap(),
            IndicatorKind::Rsi { window: 14 }
        );
        assert_eq!(
            parse_indicator("crossover", &query, &config).unwrap(),
            IndicatorKind::Crossover {
                short_window: 20,
                long_window: 50
            }
        );
        assert_eq!(
            parse_indicator("ichimoku", &query, &config).unwrap(),
            IndicatorKind::Ichimoku
        );
    }

    #[test]
    fn indicator_window_overrides_apply() {
        let config = RuntimeConfig::default();
        let query = HistoryQuery {
            days: None,
            granularity: None,
            indicator: None,
            window: Some(9),
            short: Some(5),
            long: Some(30),
            field: None,
        };

        assert_eq!(
            parse_indicator("sma", &query, &config).unwrap(),
            IndicatorKind::Sma { window: 9 }
        );
        assert_eq!(
            parse_indicator("crossover", &query, &config).unwrap(),
            IndicatorKind::Crossover {
                short_window: 5,
                long_window: 30
            }
        );
    }

    #[test]
    fn unknown_indicator_is_a_bad_request() {
        let config = RuntimeConfig::default();
        let query = HistoryQuery {
            days: None,
            granularity: None,
            indicator: None,
            window: None,
            short: None,
            long: None,
            field: None,
        };
        let (status, _) = parse_indicator("macd", &query, &config).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn field_parsing_falls_back_when_absent() {
        assert_eq!(
            parse_field(None, PriceField::Price).unwrap(),
            PriceField::Price
        );
        assert_eq!(
            parse_field(Some("close"), PriceField::Price).unwrap(),
            PriceField::Close
        );
        let (status, _) = parse_field(Some("nonsense"), PriceField::Price).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
