// =============================================================================
// Market data client — FX, equity, and crypto REST sources
// =============================================================================
//
// One reqwest client with a bounded timeout, one method per logical dataset.
// Each method performs a single GET, classifies the outcome into a
// `FetchError` kind on failure, and hands successful payloads to the
// normalizer so nothing downstream ever inspects raw vendor JSON.
//
// The Alpha Vantage sources require an API key; the crypto sources do not.
// A missing key degrades to a per-source error before any network call.

use tracing::{debug, instrument, warn};

use crate::fetch::error::FetchError;
use crate::normalize::{normalize, RawPayload, SchemaKind};
use crate::runtime_config::RuntimeConfig;
use crate::series::PriceSeries;
use crate::types::CoinSummary;

/// HTTP client for all upstream market data sources.
#[derive(Clone)]
pub struct MarketClient {
    client: reqwest::Client,
    alpha_base: String,
    gecko_base: String,
    vs_currency: String,
    api_key: Option<String>,
    stablecoin_denylist: Vec<String>,
}

impl MarketClient {
    /// Build a client from the runtime config and the optional Alpha Vantage
    /// API key (read from the environment by the caller).
    pub fn new(config: &RuntimeConfig, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            alpha_base: config.alpha_vantage_base_url.clone(),
            gecko_base: config.coingecko_base_url.clone(),
            vs_currency: config.vs_currency.clone(),
            api_key,
            stablecoin_denylist: config.stablecoin_denylist.clone(),
        }
    }

    // -------------------------------------------------------------------------
    // FX
    // -------------------------------------------------------------------------

    /// Daily FX rate series for a currency pair.
    ///
    /// The source answers with JSON keyed by date, or (for mirrored
    /// endpoints) a CSV with `TIME_PERIOD`/`OBS_VALUE` columns; both are
    /// accepted.
    #[instrument(skip(self), name = "fetch::fx_series")]
    pub async fn fetch_fx_series(&self, base: &str, quote: &str) -> Result<PriceSeries, FetchError> {
        let key = self.require_api_key("FX")?;
        let url = format!(
            "{}/query?function=FX_DAILY&from_symbol={}&to_symbol={}&outputsize=compact&apikey={}",
            self.alpha_base, base, quote, key
        );

        let text = self.get_text(&url).await?;
        let series = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(body) => {
                if alpha_throttled(&body) {
                    return Err(FetchError::RateLimited);
                }
                normalize(&RawPayload::Json(body), SchemaKind::FxDaily)?
            }
            Err(_) => normalize(&RawPayload::Csv(text), SchemaKind::FxCsv)?,
        };

        debug!(base, quote, samples = series.len(), "FX series fetched");
        Ok(series)
    }

    // -------------------------------------------------------------------------
    // Equity
    // -------------------------------------------------------------------------

    /// Intraday equity series sampled at `interval` (e.g. "60min"), trimmed
    /// to the trailing `span_days` days.
    #[instrument(skip(self), name = "fetch::equity_series")]
    pub async fn fetch_equity_series(
        &self,
        symbol: &str,
        interval: &str,
        span_days: i64,
    ) -> Result<PriceSeries, FetchError> {
        let key = self.require_api_key("equity")?;
        let url = format!(
            "{}/query?function=TIME_SERIES_INTRADAY&symbol={}&interval={}&outputsize=compact&apikey={}",
            self.alpha_base, symbol, interval, key
        );

        let body = self.get_json(&url).await?;
        if alpha_throttled(&body) {
            return Err(FetchError::RateLimited);
        }

        let mut series = normalize(&RawPayload::Json(body), SchemaKind::EquityIntraday)?;
        series.tail_days(span_days);
        if series.is_empty() {
            return Err(FetchError::EmptyData);
        }

        debug!(symbol, interval, samples = series.len(), "equity series fetched");
        Ok(series)
    }

    // -------------------------------------------------------------------------
    // Crypto
    // -------------------------------------------------------------------------

    /// Top-`count` assets by market capitalization, with fiat-pegged
    /// stablecoins filtered out by id.
    #[instrument(skip(self), name = "fetch::market_listing")]
    pub async fn fetch_market_listing(&self, count: usize) -> Result<Vec<CoinSummary>, FetchError> {
        let url = format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page=1",
            self.gecko_base, self.vs_currency, count
        );

        let body = self.get_json(&url).await?;
        let coins: Vec<CoinSummary> =
            serde_json::from_value(body).map_err(|_| FetchError::ParseFailure)?;
        if coins.is_empty() {
            return Err(FetchError::EmptyData);
        }

        let filtered = self.filter_stablecoins(coins);
        debug!(count = filtered.len(), "market listing fetched");
        Ok(filtered)
    }

    /// Historical price (and volume, when present) series for one asset.
    #[instrument(skip(self), name = "fetch::asset_history")]
    pub async fn fetch_asset_history(
        &self,
        asset_id: &str,
        span_days: u32,
        granularity: &str,
    ) -> Result<PriceSeries, FetchError> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}&interval={}",
            self.gecko_base, asset_id, self.vs_currency, span_days, granularity
        );

        let body = self.get_json(&url).await?;
        let series = normalize(&RawPayload::Json(body), SchemaKind::CryptoChart)?;

        debug!(asset_id, span_days, samples = series.len(), "asset history fetched");
        Ok(series)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn require_api_key(&self, source: &str) -> Result<&str, FetchError> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => {
                warn!(
                    source,
                    "ALPHAVANTAGE_KEY is not set — the {source} source cannot be queried"
                );
                Err(FetchError::Unreachable)
            }
        }
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(&e))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "upstream returned an error status");
            return Err(FetchError::from_status(status));
        }

        resp.json().await.map_err(|_| FetchError::ParseFailure)
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(&e))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "upstream returned an error status");
            return Err(FetchError::from_status(status));
        }

        resp.text().await.map_err(|_| FetchError::ParseFailure)
    }

    fn filter_stablecoins(&self, coins: Vec<CoinSummary>) -> Vec<CoinSummary> {
        coins
            .into_iter()
            .filter(|c| !self.stablecoin_denylist.iter().any(|id| id == &c.id))
            .collect()
    }
}

/// Alpha Vantage signals throttling with a 200 response carrying a `Note` or
/// `Information` field instead of the series.
fn alpha_throttled(body: &serde_json::Value) -> bool {
    body.get("Note").is_some() || body.get("Information").is_some()
}

impl std::fmt::Debug for MarketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketClient")
            .field("alpha_base", &self.alpha_base)
            .field("gecko_base", &self.gecko_base)
            .field("vs_currency", &self.vs_currency)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
