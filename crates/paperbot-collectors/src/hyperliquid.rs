//! Hyperliquid market-data collector: WebSocket candles plus REST
//! funding/open-interest polling.
//!
//! Grounded on `original_source/.../collectors/hyperliquid.py` and
//! `exchange/hyperliquid.py`.

use crate::error::{CollectorError, CollectorResult};
use chrono::{DateTime, TimeZone, Utc};
use paperbot_core::decimal::{Price, Size};
use paperbot_core::model::{Candle, FundingSnapshot};
use paperbot_net::{init_crypto, run_reconnecting_stream};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const CANDLE_CHANNEL: &str = "candle";

#[derive(Debug, Serialize)]
struct InfoRequest {
    #[serde(rename = "type")]
    request_type: String,
}

#[derive(Debug, Serialize)]
struct CandleSnapshotRequest {
    #[serde(rename = "type")]
    request_type: String,
    req: CandleSnapshotReq,
}

#[derive(Debug, Serialize)]
struct CandleSnapshotReq {
    coin: String,
    interval: String,
    #[serde(rename = "startTime")]
    start_time: i64,
    #[serde(rename = "endTime")]
    end_time: i64,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    #[serde(rename = "t")]
    open_time_ms: i64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "i")]
    interval: String,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
}

#[derive(Debug, Deserialize)]
struct UniverseEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MetaResponse {
    universe: Vec<UniverseEntry>,
}

#[derive(Debug, Deserialize)]
struct AssetCtxRaw {
    funding: String,
    #[serde(rename = "openInterest")]
    open_interest: String,
    #[serde(rename = "markPx")]
    mark_px: String,
}

fn parse_decimal(field: &str, s: &str) -> CollectorResult<Decimal> {
    Decimal::from_str(s).map_err(|_| CollectorError::ParseError(format!("invalid {field}: {s}")))
}

fn ms_to_dt(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

impl RawCandle {
    fn into_model(self) -> CollectorResult<Candle> {
        Ok(Candle {
            venue: "hyperliquid".to_string(),
            asset: self.symbol,
            interval: self.interval,
            open_time: ms_to_dt(self.open_time_ms),
            open: Price::new(parse_decimal("open", &self.open)?),
            high: Price::new(parse_decimal("high", &self.high)?),
            low: Price::new(parse_decimal("low", &self.low)?),
            close: Price::new(parse_decimal("close", &self.close)?),
            volume: Size::new(parse_decimal("volume", &self.volume)?),
        })
    }
}

/// REST + WebSocket client for Hyperliquid market data.
pub struct HyperliquidClient {
    http: Client,
    base_url: String,
    ws_url: String,
}

impl HyperliquidClient {
    pub fn new(base_url: impl Into<String>, ws_url: impl Into<String>) -> CollectorResult<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| CollectorError::HttpClient(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            ws_url: ws_url.into(),
        })
    }

    async fn post_info<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        payload: &T,
    ) -> CollectorResult<R> {
        let resp = self
            .http
            .post(format!("{}/info", self.base_url))
            .json(payload)
            .send()
            .await
            .map_err(|e| CollectorError::HttpClient(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(CollectorError::HttpClient(format!("HTTP {}", resp.status())));
        }
        resp.json().await.map_err(|e| CollectorError::HttpClient(e.to_string()))
    }

    /// Universe metadata plus per-asset funding/OI/mark context.
    async fn get_meta_and_asset_ctxs(&self) -> CollectorResult<(MetaResponse, Vec<AssetCtxRaw>)> {
        let request = InfoRequest {
            request_type: "metaAndAssetCtxs".to_string(),
        };
        let body: (MetaResponse, Vec<AssetCtxRaw>) = self.post_info(&request).await?;
        Ok(body)
    }

    /// Historical candles for backfill.
    async fn get_candle_snapshot(
        &self,
        coin: &str,
        interval: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> CollectorResult<Vec<RawCandle>> {
        let request = CandleSnapshotRequest {
            request_type: "candleSnapshot".to_string(),
            req: CandleSnapshotReq {
                coin: coin.to_string(),
                interval: interval.to_string(),
                start_time: start_ms,
                end_time: end_ms,
            },
        };
        self.post_info(&request).await
    }
}

/// Backfill the last `hours` of 1-minute candles for every asset.
pub async fn backfill_candles(
    client: &HyperliquidClient,
    pool: &PgPool,
    assets: &[String],
    hours: i64,
) -> CollectorResult<()> {
    let now_ms = Utc::now().timestamp_millis();
    let start_ms = now_ms - hours * 3600 * 1000;

    for asset in assets {
        info!(asset, hours, "backfilling candles");
        match client.get_candle_snapshot(asset, "1m", start_ms, now_ms).await {
            Ok(candles) => {
                let mut count = 0;
                for raw in candles {
                    let candle = raw.into_model()?;
                    paperbot_store::market_data::insert_candle(pool, &candle).await?;
                    count += 1;
                }
                info!(asset, candles = count, "backfill complete");
            }
            Err(e) => warn!(asset, error = %e, "backfill failed"),
        }
    }
    Ok(())
}

/// Subscribe to real-time 1-minute candles for every asset and upsert
/// each bar as it arrives. One reconnecting WebSocket connection per
/// asset, all funnelled through a single channel.
pub async fn candle_listener(pool: PgPool, assets: Vec<String>, ws_url: String, cancel: CancellationToken) {
    init_crypto();
    let (tx, mut rx) = mpsc::channel(512);

    for asset in &assets {
        let subscribe_frame = serde_json::json!({
            "method": "subscribe",
            "subscription": { "type": "candle", "coin": asset, "interval": "1m" },
        });
        let url = ws_url.clone();
        let tx = tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(run_reconnecting_stream(url, Some(subscribe_frame), tx, cancel));
    }
    drop(tx);

    while let Some(msg) = rx.recv().await {
        if msg.get("channel").and_then(Json::as_str) != Some(CANDLE_CHANNEL) {
            continue;
        }
        let Some(data) = msg.get("data") else { continue };
        let raw: RawCandle = match serde_json::from_value(data.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to parse candle message");
                continue;
            }
        };
        let candle = match raw.into_model() {
            Ok(candle) => candle,
            Err(e) => {
                warn!(error = %e, "failed to convert candle message");
                continue;
            }
        };
        debug!(asset = %candle.asset, close = %candle.close.inner(), "candle");
        if let Err(e) = paperbot_store::market_data::insert_candle(&pool, &candle).await {
            warn!(error = %e, "failed to persist candle");
        }
    }
}

/// Poll REST for funding-rate and open-interest snapshots on an
/// interval, forever (until `cancel` fires).
pub async fn funding_poller(
    client: HyperliquidClient,
    pool: PgPool,
    assets: Vec<String>,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        match client.get_meta_and_asset_ctxs().await {
            Ok((meta, ctxs)) => {
                let ts = Utc::now();
                for (info, ctx) in meta.universe.iter().zip(ctxs.iter()) {
                    if !assets.contains(&info.name) {
                        continue;
                    }
                    let snapshot = FundingSnapshot {
                        venue: "hyperliquid".to_string(),
                        asset: info.name.clone(),
                        ts,
                        funding_rate: parse_decimal("funding", &ctx.funding).unwrap_or(Decimal::ZERO),
                        open_interest: parse_decimal("openInterest", &ctx.open_interest).ok(),
                        mark_price: parse_decimal("markPx", &ctx.mark_px).ok().map(Price::new),
                    };
                    if let Err(e) = paperbot_store::market_data::insert_funding_snapshot(&pool, &snapshot).await {
                        warn!(asset = %info.name, error = %e, "failed to persist funding snapshot");
                    }
                }
            }
            Err(e) => warn!(error = %e, "funding poll failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => break,
        }
    }
}
