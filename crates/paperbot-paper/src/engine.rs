//! The paper engine: consumes signals for one account's `(venue,
//! strategy)` pair, opens and closes positions, and tracks equity.
//!
//! Grounded on `original_source/.../paper/engine.py::PaperEngine`.

use crate::config::PaperConfig;
use crate::error::{PaperError, PaperResult};
use crate::pricing::get_price;
use crate::sizing::{
    apply_slippage, calculate_fees, calculate_kelly_allocation, calculate_pnl,
    calculate_position_size, calculate_position_size_kelly,
};
use chrono::{DateTime, Duration, Utc};
use paperbot_core::decimal::{Price, Size};
use paperbot_core::model::{Account, AccountMarkToMarket, ExitReason, Position, PositionStatus, Signal};
use paperbot_oracle::PriceOracle;
use paperbot_risk::{evaluate_risk, RiskLimits, RiskTracker, RiskVerdict};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub struct PaperEngine {
    config: PaperConfig,
    account: Account,
    risk_tracker: Mutex<RiskTracker>,
    oracle: Option<Arc<PriceOracle>>,
}

impl PaperEngine {
    pub fn new(config: PaperConfig, account: Account, oracle: Option<Arc<PriceOracle>>) -> Self {
        let risk_tracker = RiskTracker::new(
            config.max_daily_loss_per_strategy,
            config.cooldown_after_loss_minutes,
        );
        Self {
            config,
            account,
            risk_tracker: Mutex::new(risk_tracker),
            oracle,
        }
    }

    pub fn account_id(&self) -> i64 {
        self.account.id.expect("account must be persisted before engine construction")
    }

    async fn price(&self, pool: &PgPool, asset: &str) -> PaperResult<Option<Decimal>> {
        get_price(self.oracle.as_ref(), pool, asset, &self.account.venue).await
    }

    /// Fetch and mark unacted signals for this account's `(venue,
    /// strategy)` pair.
    pub async fn consume_signals(&self, pool: &PgPool) -> PaperResult<Vec<Signal>> {
        let signals =
            paperbot_store::signals::consume_signals(pool, &self.account.venue, &self.account.strategy)
                .await?;
        if !signals.is_empty() {
            info!(count = signals.len(), strategy = %self.account.strategy, "signals_consumed");
        }
        Ok(signals)
    }

    /// Evaluate every risk gate for a prospective signal.
    pub async fn check_risk(
        &self,
        pool: &PgPool,
        signal: &Signal,
        equity: Decimal,
        now: DateTime<Utc>,
    ) -> PaperResult<RiskVerdict> {
        let open_positions = paperbot_store::positions::list_open(pool, self.account_id()).await?;

        let new_value = match self.price(pool, &signal.asset).await? {
            Some(price) => {
                let kelly_alloc = calculate_kelly_allocation(Some(signal.confidence), &self.config);
                let qty = if kelly_alloc > 0.0 {
                    calculate_position_size_kelly(
                        price,
                        equity,
                        kelly_alloc,
                        self.config.risk_pct,
                        self.config.default_stop_loss_pct,
                    )
                } else {
                    calculate_position_size(price, equity, self.config.risk_pct, self.config.default_stop_loss_pct)
                };
                price * qty
            }
            None => Decimal::ZERO,
        };

        let limits = RiskLimits {
            max_positions_per_strategy: self.config.max_positions_per_strategy,
            max_total_exposure_pct: self.config.max_total_exposure_pct,
        };
        let mut tracker = self.risk_tracker.lock().expect("risk tracker mutex poisoned");
        let verdict = evaluate_risk(
            limits,
            &mut tracker,
            &self.account.strategy,
            &open_positions,
            equity,
            new_value,
            now,
        );
        Ok(verdict)
    }

    /// Open a new position from a signal. Returns `None` if no price
    /// is available or the sized quantity rounds to zero.
    pub async fn open_position(
        &self,
        pool: &PgPool,
        signal: &Signal,
        current_equity: Decimal,
    ) -> PaperResult<Option<i64>> {
        let Some(raw_price) = self.price(pool, &signal.asset).await? else {
            warn!(asset = %signal.asset, "no_price_for_position");
            return Ok(None);
        };

        let slippage_pct = Decimal::try_from(self.config.slippage_for(&self.account.venue)).unwrap_or(Decimal::ZERO);
        let entry_price = apply_slippage(raw_price, signal.direction, slippage_pct, true);

        let kelly_alloc = calculate_kelly_allocation(Some(signal.confidence), &self.config);
        let quantity = if kelly_alloc > 0.0 {
            calculate_position_size_kelly(
                entry_price,
                current_equity,
                kelly_alloc,
                self.config.risk_pct,
                self.config.default_stop_loss_pct,
            )
        } else {
            calculate_position_size(entry_price, current_equity, self.config.risk_pct, self.config.default_stop_loss_pct)
        };

        if quantity.is_zero() {
            info!(asset = %signal.asset, strategy = %signal.strategy, "zero_quantity_skipped");
            return Ok(None);
        }

        let now = Utc::now();
        let mut metadata = HashMap::new();
        metadata.insert("raw_price".to_string(), json!(raw_price.to_string()));
        metadata.insert("slippage_pct".to_string(), json!(slippage_pct.to_string()));

        let position = Position {
            id: None,
            account_id: self.account_id(),
            strategy: signal.strategy.clone(),
            asset: signal.asset.clone(),
            venue: signal.exchange.clone(),
            direction: signal.direction,
            entry_price: Price::new(entry_price),
            entry_ts: now,
            quantity: Size::new(quantity),
            exit_price: None,
            exit_ts: None,
            exit_reason: None,
            realised_pnl: None,
            status: PositionStatus::Open,
            signal_id: signal.id,
            metadata,
        };

        let id = paperbot_store::positions::open_position(pool, &position).await?;
        info!(
            position_id = id,
            strategy = %signal.strategy,
            asset = %signal.asset,
            direction = %signal.direction,
            entry_price = %entry_price,
            raw_price = %raw_price,
            quantity = %quantity,
            "position_opened"
        );
        Ok(Some(id))
    }

    /// Check every open position this account owns for a stop-loss,
    /// take-profit, or timeout exit, in that priority order.
    pub async fn check_exits(&self, pool: &PgPool, now: DateTime<Utc>) -> PaperResult<Vec<i64>> {
        let open_positions = paperbot_store::positions::list_open(pool, self.account_id()).await?;
        let timeout = Duration::minutes(self.config.default_timeout_minutes);

        let mut closed = Vec::new();
        for position in open_positions {
            let Some(price) = self.price(pool, &position.asset).await? else {
                continue;
            };

            let reason = paperbot_position::check_exit(
                &position,
                price,
                self.config.default_stop_loss_pct,
                self.config.default_take_profit_pct,
                timeout,
                now,
            );

            if let Some(reason) = reason {
                self.close_position(pool, &position, Price::new(price), reason, now).await?;
                closed.push(position.id.expect("open position has an id"));
            }
        }
        Ok(closed)
    }

    /// Close a position: apply exit slippage, compute net P&L, persist
    /// the close, and record it with the risk tracker.
    pub async fn close_position(
        &self,
        pool: &PgPool,
        position: &Position,
        exit_price: Price,
        exit_reason: ExitReason,
        now: DateTime<Utc>,
    ) -> PaperResult<()> {
        let slippage_pct = Decimal::try_from(self.config.slippage_for(&position.venue)).unwrap_or(Decimal::ZERO);
        let actual_exit = apply_slippage(exit_price.inner(), position.direction, slippage_pct, false);

        let entry = position.entry_price.inner();
        let qty = position.quantity.inner();
        let gross_pnl = calculate_pnl(position.direction, entry, actual_exit, qty);

        let fee_pct = Decimal::try_from(self.config.fee_for(&position.venue)).unwrap_or(Decimal::ZERO);
        let fees = calculate_fees(entry, actual_exit, qty, fee_pct);
        let net_pnl = gross_pnl - fees;

        let metadata_patch = json!({
            "exit_raw_price": exit_price.inner().to_string(),
            "exit_slippage_pct": slippage_pct.to_string(),
            "fees": fees.to_string(),
            "gross_pnl": gross_pnl.to_string(),
        });

        paperbot_store::positions::close_position(
            pool,
            position.id.expect("open position has an id"),
            Price::new(actual_exit),
            now,
            exit_reason,
            net_pnl,
            metadata_patch,
        )
        .await?;

        self.risk_tracker
            .lock()
            .expect("risk tracker mutex poisoned")
            .record_close(&position.strategy, net_pnl, now);

        info!(
            position_id = position.id,
            strategy = %position.strategy,
            asset = %position.asset,
            direction = %position.direction,
            exit_reason = %exit_reason,
            gross_pnl = %gross_pnl,
            fees = %fees,
            net_pnl = %net_pnl,
            "position_closed"
        );
        Ok(())
    }

    /// Current equity: initial capital + realised P&L (closed
    /// positions) + unrealised P&L (open positions, net of estimated
    /// round-trip fees).
    pub async fn current_equity(&self, pool: &PgPool) -> PaperResult<Decimal> {
        let (realised, unrealised, _breakdown) = self.pnl_breakdown(pool).await?;
        Ok(self.account.initial_capital + realised + unrealised)
    }

    /// Write one mark-to-market snapshot for this account.
    pub async fn write_mark_to_market(&self, pool: &PgPool, now: DateTime<Utc>) -> PaperResult<()> {
        let (realised, unrealised, breakdown) = self.pnl_breakdown(pool).await?;
        let open_positions = paperbot_store::positions::list_open(pool, self.account_id()).await?;
        let total_equity = self.account.initial_capital + realised + unrealised;

        let breakdown_json = breakdown
            .into_iter()
            .map(|(k, v)| (k, json!(v)))
            .collect();

        let row = AccountMarkToMarket {
            account_id: self.account_id(),
            ts: now,
            total_equity,
            unrealised_pnl: unrealised,
            realised_pnl: realised,
            open_positions: open_positions.len() as i64,
            breakdown: breakdown_json,
        };
        paperbot_store::mtm::insert(pool, &row).await?;

        info!(
            total_equity = %total_equity,
            unrealised_pnl = %unrealised,
            realised_pnl = %realised,
            open_positions = open_positions.len(),
            "mtm_written"
        );
        Ok(())
    }

    /// Sum of realised P&L (closed positions) and unrealised P&L (open
    /// positions, net of estimated exit fees), plus a per-strategy
    /// breakdown of each.
    async fn pnl_breakdown(
        &self,
        pool: &PgPool,
    ) -> PaperResult<(Decimal, Decimal, HashMap<String, StrategyBreakdown>)> {
        let closed = paperbot_store::positions::list_closed(pool, self.account_id(), i64::MAX).await?;
        let realised: Decimal = closed.iter().filter_map(|p| p.realised_pnl).sum();

        let mut breakdown: HashMap<String, StrategyBreakdown> = HashMap::new();
        for position in &closed {
            let entry = breakdown.entry(position.strategy.clone()).or_default();
            entry.realised_pnl += position.realised_pnl.unwrap_or(Decimal::ZERO);
        }

        let open_positions = paperbot_store::positions::list_open(pool, self.account_id()).await?;
        let mut unrealised = Decimal::ZERO;
        for position in &open_positions {
            let entry = breakdown.entry(position.strategy.clone()).or_default();
            entry.open_positions += 1;

            let Some(price) = self.price(pool, &position.asset).await? else {
                continue;
            };
            let slippage_pct = Decimal::try_from(self.config.slippage_for(&position.venue)).unwrap_or(Decimal::ZERO);
            let exit_price = apply_slippage(price, position.direction, slippage_pct, false);
            let gross_pnl = calculate_pnl(position.direction, position.entry_price.inner(), exit_price, position.quantity.inner());

            let fee_pct = Decimal::try_from(self.config.fee_for(&position.venue)).unwrap_or(Decimal::ZERO);
            let entry_fee = position.entry_price.inner() * position.quantity.inner() * fee_pct;
            let exit_fee = exit_price * position.quantity.inner() * fee_pct;
            let pos_pnl = gross_pnl - entry_fee - exit_fee;

            unrealised += pos_pnl;
            entry.unrealised_pnl += pos_pnl;
        }

        Ok((realised, unrealised, breakdown))
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
struct StrategyBreakdown {
    realised_pnl: Decimal,
    unrealised_pnl: Decimal,
    open_positions: i64,
}

/// Ensure one account exists per enabled `(strategy, venue)` pair,
/// each funded from `initial_capital / N`. Grounded on
/// `orchestrator/bootstrap.py::ensure_accounts`.
pub async fn bootstrap_accounts(
    pool: &PgPool,
    strategy_venue_pairs: &[(String, String)],
    initial_capital: Decimal,
) -> PaperResult<Vec<Account>> {
    if strategy_venue_pairs.is_empty() {
        return Ok(Vec::new());
    }
    let per_account = initial_capital / Decimal::from(strategy_venue_pairs.len());

    let mut accounts = Vec::new();
    for (strategy, venue) in strategy_venue_pairs {
        let name = format!("{strategy}-{venue}");
        paperbot_store::accounts::ensure_account(pool, &name, venue, strategy, per_account).await?;
        let account = paperbot_store::accounts::get_by_name(pool, &name)
            .await
            .map_err(|_| PaperError::AccountNotFound(name.clone()))?;
        accounts.push(account);
    }
    Ok(accounts)
}
