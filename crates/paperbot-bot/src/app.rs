//! Application wiring: loads configuration, opens the store, bootstraps
//! accounts, and spawns one cooperative task per subsystem under a
//! shared cancellation token.
//!
//! Grounded structurally on `hip3-bot`'s `Application` (construct once,
//! `run_preflight`, then `run`), re-targeted at this system's
//! subsystem set: collectors, oracle, orchestrator, one paper engine
//! per account, and the optional read API.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use paperbot_collectors::{HyperliquidClient, PolymarketClient};
use paperbot_oracle::PriceOracle;
use paperbot_paper::engine::{bootstrap_accounts, PaperEngine};
use paperbot_strategy::registry::StrategyRegistry;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default venue endpoints, used when a venue is absent from config
/// entirely (local/dev convenience; production deployments set
/// `venues` explicitly).
const DEFAULT_HYPERLIQUID_REST: &str = "https://api.hyperliquid.xyz";
const DEFAULT_HYPERLIQUID_WS: &str = "wss://api.hyperliquid.xyz/ws";
const DEFAULT_POLYMARKET_REST: &str = "https://gamma-api.polymarket.com";

pub struct Application {
    config: AppConfig,
    pool: PgPool,
    cancel: CancellationToken,
}

impl Application {
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let pool = paperbot_store::pool::connect(&config.database.url).await?;
        Ok(Self {
            config,
            pool,
            cancel: CancellationToken::new(),
        })
    }

    /// Create the store schema if missing and fail fast on anything
    /// that would otherwise surface as a confusing runtime error later
    /// (unreachable database, empty strategy registry).
    pub async fn run_preflight(&self) -> AppResult<()> {
        paperbot_store::pool::bootstrap(&self.pool).await?;

        let registry = StrategyRegistry::from_enabled_with_params(&self.config.enabled_strategy_params())?;
        if registry.is_empty() {
            return Err(AppError::Config("no strategies enabled".to_string()));
        }
        info!(strategies = registry.len(), assets = self.config.assets.len(), "preflight_ok");
        Ok(())
    }

    /// Spawn every subsystem and block until a shutdown signal arrives,
    /// then cancel and join all of them.
    pub async fn run(self) -> AppResult<()> {
        let registry = StrategyRegistry::from_enabled_with_params(&self.config.enabled_strategy_params())?;
        let strategy_venue_pairs = self.strategy_venue_pairs(&registry);

        let accounts = bootstrap_accounts(
            &self.pool,
            &strategy_venue_pairs,
            self.config.paper.initial_capital,
        )
        .await?;
        info!(accounts = accounts.len(), "accounts_bootstrapped");

        let oracle = if self.config.paper.price_oracle_enabled {
            let hl_ws_url = self.venue_ws_url("hyperliquid", DEFAULT_HYPERLIQUID_WS);
            let oracle = PriceOracle::with_staleness(
                self.config.assets.clone(),
                hl_ws_url,
                self.pool.clone(),
                Duration::from_secs(self.config.paper.price_oracle_staleness_s),
                Duration::from_secs(600),
            );
            oracle.start();
            Some(oracle)
        } else {
            None
        };

        let mut handles = Vec::new();
        handles.extend(self.spawn_collectors());
        handles.push(self.spawn_orchestrator(registry));
        handles.extend(self.spawn_paper_engines(accounts, oracle.clone()));
        if let Some(handle) = self.spawn_api() {
            handles.push(handle);
        }

        shutdown_signal().await;
        info!("shutdown_signal_received");
        self.cancel.cancel();
        if let Some(oracle) = &oracle {
            oracle.stop();
        }

        for handle in handles {
            let _ = handle.await;
        }
        info!("shutdown_complete");
        Ok(())
    }

    fn strategy_venue_pairs(&self, registry: &StrategyRegistry) -> Vec<(String, String)> {
        registry
            .iter()
            .map(|s| (s.name().to_string(), s.exchange().to_string()))
            .collect()
    }

    fn venue_base_url(&self, venue: &str, default: &str) -> String {
        self.config
            .venues
            .get(venue)
            .map(|v| v.base_url.clone())
            .unwrap_or_else(|| default.to_string())
    }

    fn venue_ws_url(&self, venue: &str, default: &str) -> String {
        self.config
            .venues
            .get(venue)
            .and_then(|v| v.ws_url.clone())
            .unwrap_or_else(|| default.to_string())
    }

    fn venue_poll_interval(&self, venue: &str) -> Duration {
        let seconds = self.config.venues.get(venue).map(|v| v.poll_interval_s).unwrap_or(5);
        Duration::from_secs(seconds)
    }

    fn spawn_collectors(&self) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        let hl_base = self.venue_base_url("hyperliquid", DEFAULT_HYPERLIQUID_REST);
        let hl_ws = self.venue_ws_url("hyperliquid", DEFAULT_HYPERLIQUID_WS);
        match HyperliquidClient::new(hl_base, hl_ws.clone()) {
            Ok(client) => {
                let pool = self.pool.clone();
                let assets = self.config.assets.clone();
                let cancel = self.cancel.clone();
                handles.push(tokio::spawn(async move {
                    if let Err(e) = paperbot_collectors::backfill_candles(&client, &pool, &assets, 24).await {
                        warn!(error = %e, "candle backfill failed");
                    }
                    let funding_interval = Duration::from_secs(300);
                    tokio::join!(
                        paperbot_collectors::candle_listener(pool.clone(), assets.clone(), hl_ws, cancel.clone()),
                        paperbot_collectors::funding_poller(client, pool, assets, funding_interval, cancel),
                    );
                }));
            }
            Err(e) => warn!(error = %e, "failed to construct hyperliquid client, candle/funding collectors disabled"),
        }

        let pm_base = self.venue_base_url("polymarket", DEFAULT_POLYMARKET_REST);
        let pm_interval = self.venue_poll_interval("polymarket");
        match PolymarketClient::new(pm_base) {
            Ok(client) => {
                let pool = self.pool.clone();
                let assets = self.config.assets.clone();
                let cancel = self.cancel.clone();
                handles.push(tokio::spawn(paperbot_collectors::poll_markets(
                    client, pool, assets, pm_interval, cancel,
                )));
            }
            Err(e) => warn!(error = %e, "failed to construct polymarket client, prediction-market collector disabled"),
        }

        handles
    }

    fn spawn_orchestrator(&self, registry: StrategyRegistry) -> tokio::task::JoinHandle<()> {
        let pool = self.pool.clone();
        let assets = self.config.assets.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(crate::orchestrator::run(pool, assets, registry, cancel))
    }

    fn spawn_paper_engines(
        &self,
        accounts: Vec<paperbot_core::model::Account>,
        oracle: Option<Arc<PriceOracle>>,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        accounts
            .into_iter()
            .map(|account| {
                let engine = PaperEngine::new(self.config.paper.clone(), account, oracle.clone());
                let pool = self.pool.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(paperbot_paper::runner::run_loop(engine, pool, cancel))
            })
            .collect()
    }

    fn spawn_api(&self) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.api.enabled {
            return None;
        }
        let state = paperbot_api::AppState::new(self.pool.clone());
        let config = self.config.api.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = paperbot_api::run_server(state, config).await {
                warn!(error = %e, "read API server exited");
            }
        }))
    }
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
