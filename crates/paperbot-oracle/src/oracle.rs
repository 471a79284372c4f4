//! The price oracle: a dual-venue in-process price cache fed by a
//! Hyperliquid `allMids` WebSocket subscription and Polymarket poll
//! results already landed in the store, with a database fallback for
//! the slower venue.
//!
//! Grounded on `original_source/.../paper/oracle.py::PriceOracle`.

use crate::cache::{PriceSource, VenueCache};
use crate::error::OracleResult;
use paperbot_net::{init_crypto, run_reconnecting_stream};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use sqlx::PgPool;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const HYPERLIQUID: &str = "hyperliquid";
pub const POLYMARKET: &str = "polymarket";

const DEFAULT_HL_STALENESS: Duration = Duration::from_secs(30);
const DEFAULT_PM_STALENESS: Duration = Duration::from_secs(600);

/// In-process dual-venue price cache.
pub struct PriceOracle {
    assets: HashSet<String>,
    hl_ws_url: String,
    hl: VenueCache,
    pm: VenueCache,
    pool: PgPool,
    cancel: CancellationToken,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl PriceOracle {
    pub fn new(assets: Vec<String>, hl_ws_url: impl Into<String>, pool: PgPool) -> Arc<Self> {
        Self::with_staleness(assets, hl_ws_url, pool, DEFAULT_HL_STALENESS, DEFAULT_PM_STALENESS)
    }

    pub fn with_staleness(
        assets: Vec<String>,
        hl_ws_url: impl Into<String>,
        pool: PgPool,
        hl_staleness: Duration,
        pm_staleness: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            assets: assets.into_iter().collect(),
            hl_ws_url: hl_ws_url.into(),
            hl: VenueCache::new(hl_staleness),
            pm: VenueCache::new(pm_staleness),
            pool,
            cancel: CancellationToken::new(),
            task: parking_lot::Mutex::new(None),
        })
    }

    /// Latest price for `asset` on `exchange`. Hyperliquid only ever
    /// consults the in-memory cache; Polymarket falls back to the
    /// store when the cache itself is stale or empty.
    pub async fn get_price(&self, asset: &str, exchange: &str) -> OracleResult<Option<Decimal>> {
        match exchange {
            HYPERLIQUID => Ok(self.hl.get_fresh(asset)),
            POLYMARKET => {
                if let Some(price) = self.pm.get_fresh(asset) {
                    return Ok(Some(price));
                }
                let price = paperbot_store::market_data::latest_prediction_market_price(
                    &self.pool, asset,
                )
                .await?;
                if let Some(price) = price {
                    self.pm.update(asset, price, PriceSource::Db);
                }
                Ok(price)
            }
            _ => Ok(None),
        }
    }

    pub fn is_stale(&self, asset: &str, exchange: &str) -> bool {
        match exchange {
            HYPERLIQUID => self.hl.is_stale(asset),
            POLYMARKET => self.pm.is_stale(asset),
            _ => true,
        }
    }

    /// Inject a price directly, bypassing any venue feed. Used by
    /// tests and by the Polymarket collector, which already holds a
    /// freshly-polled price and has no reason to round-trip it
    /// through the store before the oracle can see it.
    pub fn update_price(&self, asset: &str, exchange: &str, price: Decimal, source: PriceSource) {
        match exchange {
            HYPERLIQUID => self.hl.update(asset, price, source),
            POLYMARKET => self.pm.update(asset, price, source),
            _ => {}
        }
    }

    /// Start the Hyperliquid `allMids` subscription loop in the
    /// background. Idempotent: calling twice has no effect.
    pub fn start(self: &Arc<Self>) {
        if self.task.lock().is_some() {
            return;
        }
        init_crypto();
        let (tx, rx) = mpsc::channel(256);
        let subscribe_frame = serde_json::json!({
            "method": "subscribe",
            "subscription": { "type": "allMids" },
        });
        let url = self.hl_ws_url.clone();
        let cancel = self.cancel.clone();
        let stream_task = tokio::spawn(run_reconnecting_stream(
            url,
            Some(subscribe_frame),
            tx,
            cancel,
        ));
        let this = Arc::clone(self);
        let handler_task = tokio::spawn(this.consume(rx));
        *self.task.lock() = Some(tokio::spawn(async move {
            let _ = tokio::join!(stream_task, handler_task);
        }));
        info!(assets = ?self.assets, "price oracle started");
    }

    async fn consume(self: Arc<Self>, mut rx: mpsc::Receiver<Json>) {
        while let Some(msg) = rx.recv().await {
            if msg.get("channel").and_then(Json::as_str) == Some("allMids") {
                if let Some(mids) = msg.get("data").and_then(|d| d.get("mids")) {
                    self.handle_all_mids(mids);
                }
            }
        }
    }

    fn handle_all_mids(&self, mids: &Json) {
        let Some(map) = mids.as_object() else { return };
        for asset in &self.assets {
            let Some(raw) = map.get(asset).and_then(Json::as_str) else {
                continue;
            };
            match Decimal::from_str(raw) {
                Ok(price) => self.hl.update(asset, price, PriceSource::Ws),
                Err(_) => warn!(asset, raw, "failed to parse allMids price"),
            }
        }
    }

    /// Cancel the background subscription loop.
    pub fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        info!("price oracle stopped");
    }
}
