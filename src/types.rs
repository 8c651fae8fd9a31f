// =============================================================================
// Shared types used across the market-pulse service
// =============================================================================

use serde::{Deserialize, Serialize};

/// Snapshot record for one market-listed asset, as returned by the crypto
/// market-listing source.  Fetched fresh per cache window and replaced
/// wholesale on re-fetch, never mutated in place.
///
/// Deserialization follows the upstream field names (`name`, `total_volume`);
/// serialization uses the canonical names below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinSummary {
    /// Stable upstream identifier (e.g. "bitcoin").
    pub id: String,

    pub symbol: String,

    #[serde(rename(deserialize = "name"))]
    pub display_name: String,

    #[serde(default)]
    pub current_price: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(rename(deserialize = "total_volume"), default)]
    pub volume_24h: Option<f64>,
}

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// The fetch error kind, when the error came from the pipeline.
    pub kind: Option<String>,
    /// ISO 8601 timestamp.
    pub at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_summary_deserializes_upstream_names() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 64000.5,
            "market_cap": 1.2e12,
            "market_cap_rank": 1,
            "total_volume": 3.4e10
        }"#;
        let coin: CoinSummary = serde_json::from_str(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.display_name, "Bitcoin");
        assert_eq!(coin.volume_24h, Some(3.4e10));
        assert_eq!(coin.market_cap_rank, Some(1));
    }

    #[test]
    fn coin_summary_tolerates_null_numerics() {
        let json = r#"{
            "id": "newcoin",
            "symbol": "new",
            "name": "New Coin",
            "current_price": null,
            "market_cap": null,
            "market_cap_rank": null,
            "total_volume": null
        }"#;
        let coin: CoinSummary = serde_json::from_str(json).unwrap();
        assert_eq!(coin.current_price, None);
        assert_eq!(coin.market_cap_rank, None);
    }

    #[test]
    fn coin_summary_serializes_canonical_names() {
        let coin = CoinSummary {
            id: "bitcoin".into(),
            symbol: "btc".into(),
            display_name: "Bitcoin".into(),
            current_price: Some(1.0),
            market_cap: None,
            market_cap_rank: None,
            volume_24h: None,
        };
        let json = serde_json::to_value(&coin).unwrap();
        assert!(json.get("display_name").is_some());
        assert!(json.get("volume_24h").is_some());
        assert!(json.get("total_volume").is_none());
    }
}
