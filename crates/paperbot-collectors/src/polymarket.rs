//! Polymarket prediction-market collector: REST polling of the gamma
//! API, filtered to crypto-price events.
//!
//! Grounded on `original_source/.../collectors/polymarket.py` and
//! `exchange/polymarket.py`.

use crate::error::{CollectorError, CollectorResult};
use chrono::Utc;
use paperbot_core::model::PredictionMarketObservation;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as Json;
use sqlx::PgPool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Tag IDs for crypto-related event filtering on the gamma API:
/// crypto_prices, bitcoin, ethereum, solana, up_or_down.
pub const DEFAULT_TAG_IDS: &[u32] = &[1312, 235, 39, 818, 102127];

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    markets: Vec<Json>,
}

/// Client for the Polymarket gamma API.
pub struct PolymarketClient {
    http: Client,
    base_url: String,
}

impl PolymarketClient {
    pub fn new(base_url: impl Into<String>) -> CollectorResult<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| CollectorError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn get_events(&self, tag_id: u32, limit: u32) -> CollectorResult<Vec<Event>> {
        let mut all_events = Vec::new();
        let mut offset = 0u32;
        loop {
            let mut query = vec![
                ("tag_id".to_string(), tag_id.to_string()),
                ("closed".to_string(), "false".to_string()),
                ("limit".to_string(), limit.to_string()),
            ];
            if offset > 0 {
                query.push(("offset".to_string(), offset.to_string()));
            }

            let resp = self
                .http
                .get(format!("{}/events", self.base_url))
                .query(&query)
                .send()
                .await
                .map_err(|e| CollectorError::HttpClient(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(CollectorError::HttpClient(format!("HTTP {}", resp.status())));
            }
            let page: Vec<Event> = resp.json().await.map_err(|e| CollectorError::HttpClient(e.to_string()))?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len();
            all_events.extend(page);
            if page_len < limit as usize {
                break;
            }
            offset += limit;
        }
        Ok(all_events)
    }

    /// Every crypto-related market across the default tag set,
    /// deduplicated by `conditionId`.
    pub async fn get_crypto_markets(&self) -> CollectorResult<Vec<Json>> {
        let mut seen = std::collections::HashSet::new();
        let mut markets = Vec::new();
        for &tag_id in DEFAULT_TAG_IDS {
            let events = self.get_events(tag_id, 100).await?;
            for event in events {
                for market in event.markets {
                    let Some(cid) = market.get("conditionId").and_then(Json::as_str) else {
                        continue;
                    };
                    if !cid.is_empty() && seen.insert(cid.to_string()) {
                        markets.push(market);
                    }
                }
            }
        }
        Ok(markets)
    }
}

/// Parse `outcomePrices`, which the gamma API returns either as a
/// JSON-encoded string or as a native array.
fn parse_outcome_prices(raw: &Json) -> Vec<Decimal> {
    let values: Vec<Json> = match raw {
        Json::String(s) if !s.trim().is_empty() => {
            serde_json::from_str(s).unwrap_or_default()
        }
        Json::Array(arr) => arr.clone(),
        _ => Vec::new(),
    };
    values
        .iter()
        .filter_map(|v| match v {
            Json::String(s) => s.parse().ok(),
            Json::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
            _ => None,
        })
        .collect()
}

/// Whether `token` (already uppercased) matches a standalone word in
/// `title`, i.e. is not part of a larger word (avoids "SOL" matching
/// inside "soliciting").
fn contains_word(title_upper: &str, token: &str) -> bool {
    title_upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == token)
}

/// Extract the asset symbol a market title refers to, or `None` if it
/// isn't about one of the tracked assets.
pub fn classify_asset(title: &str) -> Option<&'static str> {
    let upper = title.to_uppercase();
    if contains_word(&upper, "BTC") || contains_word(&upper, "BITCOIN") {
        Some("BTC")
    } else if contains_word(&upper, "ETH") || contains_word(&upper, "ETHEREUM") {
        Some("ETH")
    } else if contains_word(&upper, "SOL") || contains_word(&upper, "SOLANA") {
        Some("SOL")
    } else {
        None
    }
}

fn decimal_field(market: &Json, key: &str) -> Option<Decimal> {
    match market.get(key)? {
        Json::String(s) => s.parse().ok(),
        Json::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        _ => None,
    }
}

fn string_field(market: &Json, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| market.get(*k).and_then(Json::as_str))
        .map(str::to_string)
}

/// Build a [`PredictionMarketObservation`] from one raw market
/// object, or `None` if it isn't a usable crypto market. Handles both
/// gamma (camelCase) and CLOB (snake_case) field names.
fn to_observation(market: &Json, assets: &[String]) -> Option<PredictionMarketObservation> {
    let title = string_field(market, &["question", "title"])?;
    let asset = classify_asset(&title)?;
    if !assets.iter().any(|a| a == asset) {
        return None;
    }

    let market_id = string_field(market, &["conditionId", "condition_id", "id"])?;

    let outcome_prices = market
        .get("outcomePrices")
        .or_else(|| market.get("outcome_prices"))
        .cloned()
        .unwrap_or(Json::Null);
    let prices = parse_outcome_prices(&outcome_prices);

    Some(PredictionMarketObservation {
        market_id,
        market_title: title.chars().take(500).collect(),
        asset: asset.to_string(),
        ts: Utc::now(),
        yes_price: prices.first().copied(),
        no_price: prices.get(1).copied(),
        volume_24h: decimal_field(market, "volume24hr").or_else(|| decimal_field(market, "volume_24hr")),
        liquidity: decimal_field(market, "liquidity"),
        end_date: None,
    })
}

/// Poll Polymarket for crypto-related prediction markets forever
/// (until `cancel` fires), upserting each observation.
pub async fn poll_markets(
    client: PolymarketClient,
    pool: PgPool,
    assets: Vec<String>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        info!("polling polymarket markets");
        match client.get_crypto_markets().await {
            Ok(markets) => {
                let mut found = 0;
                for market in &markets {
                    if let Some(observation) = to_observation(market, &assets) {
                        found += 1;
                        if let Err(e) =
                            paperbot_store::market_data::insert_prediction_market_observation(&pool, &observation)
                                .await
                        {
                            warn!(error = %e, "failed to persist polymarket observation");
                        }
                    }
                }
                info!(markets_found = found, "polymarket poll complete");
            }
            Err(e) => warn!(error = %e, "polymarket poll failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_asset_matches_word_boundaries() {
        assert_eq!(classify_asset("Will BTC hit $100k?"), Some("BTC"));
        assert_eq!(classify_asset("Bitcoin price prediction"), Some("BTC"));
        assert_eq!(classify_asset("Will SOL flip ETH?"), Some("SOL"));
        assert_eq!(classify_asset("Netherlands election"), None);
        assert_eq!(classify_asset("soliciting donations"), None);
    }

    #[test]
    fn parse_outcome_prices_handles_string_and_array() {
        let as_string = Json::String("[\"0.62\",\"0.38\"]".to_string());
        assert_eq!(parse_outcome_prices(&as_string).len(), 2);

        let as_array = serde_json::json!(["0.1", "0.9"]);
        assert_eq!(parse_outcome_prices(&as_array).len(), 2);

        let empty = Json::Null;
        assert!(parse_outcome_prices(&empty).is_empty());
    }
}
