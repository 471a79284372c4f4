//! axum router and handlers for the read API.
//!
//! Grounded structurally on `hip3-dashboard`'s `Router::new().route(...)
//! .with_state(state)` server and `run_server` bind-and-serve idiom.
//! The teacher's WebSocket broadcast loop, connection limiter, and
//! basic-auth check have no analogue in a plain read-only JSON
//! contract and were dropped.

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{
    AccountListEntry, AccountPositions, AccountSummary, AssetPerformance, AssetStrategyPerformance,
    HealthStatus, PortfolioEquityPoint, PortfolioSummary,
};
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeSet;

const DEFAULT_LIMIT: i64 = 200;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/accounts", get(list_accounts))
        .route("/accounts/{name}/summary", get(account_summary))
        .route("/accounts/{name}/positions", get(account_positions))
        .route("/accounts/{name}/equity-curve", get(account_equity_curve))
        .route("/portfolios/{name}/summary", get(portfolio_summary))
        .route("/strategies/{name}/signals", get(strategy_signals))
        .route("/strategies/{name}/trades", get(strategy_trades))
        .route("/strategies/{name}/metrics", get(strategy_metrics))
        .route("/assets/{symbol}/performance", get(asset_performance))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let store_reachable = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    Json(HealthStatus {
        store_reachable,
        oracle_running: state.oracle_running(),
    })
}

async fn list_accounts(State(state): State<AppState>) -> ApiResult<Json<Vec<AccountListEntry>>> {
    let accounts = paperbot_store::accounts::list_active(&state.pool).await?;
    let mut out = Vec::with_capacity(accounts.len());
    for account in accounts {
        let account_id = account.id.expect("persisted account always has an id");
        let latest = paperbot_store::mtm::latest(&state.pool, account_id).await?;
        let current_equity = latest.map(|row| row.total_equity).unwrap_or(account.initial_capital);
        out.push(AccountListEntry {
            name: account.name,
            venue: account.venue,
            strategy: account.strategy,
            active: account.active,
            initial_capital: account.initial_capital,
            current_equity,
        });
    }
    Ok(Json(out))
}

async fn account_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<AccountSummary>> {
    let account = paperbot_store::accounts::get_by_name(&state.pool, &name).await?;
    let account_id = account.id.expect("persisted account always has an id");
    let latest = paperbot_store::mtm::latest(&state.pool, account_id).await?;
    let open_positions = paperbot_store::positions::list_open(&state.pool, account_id).await?;

    let summary = match latest {
        Some(row) => AccountSummary {
            name: account.name,
            initial_capital: account.initial_capital,
            current_equity: row.total_equity,
            realised_pnl: row.realised_pnl,
            unrealised_pnl: row.unrealised_pnl,
            open_position_count: row.open_positions,
        },
        None => AccountSummary {
            name: account.name,
            initial_capital: account.initial_capital,
            current_equity: account.initial_capital,
            realised_pnl: rust_decimal::Decimal::ZERO,
            unrealised_pnl: rust_decimal::Decimal::ZERO,
            open_position_count: open_positions.len() as i64,
        },
    };
    Ok(Json(summary))
}

async fn account_positions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<AccountPositions>> {
    let account = paperbot_store::accounts::get_by_name(&state.pool, &name).await?;
    let account_id = account.id.expect("persisted account always has an id");
    let open = paperbot_store::positions::list_open(&state.pool, account_id).await?;
    let closed = paperbot_store::positions::list_closed(&state.pool, account_id, DEFAULT_LIMIT).await?;
    Ok(Json(AccountPositions { open, closed }))
}

async fn account_equity_curve(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<paperbot_core::model::AccountMarkToMarket>>> {
    let account = paperbot_store::accounts::get_by_name(&state.pool, &name).await?;
    let account_id = account.id.expect("persisted account always has an id");
    let curve = paperbot_store::mtm::equity_curve(&state.pool, account_id, DEFAULT_LIMIT).await?;
    Ok(Json(curve))
}

async fn portfolio_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<PortfolioSummary>> {
    let group = paperbot_store::accounts::get_portfolio_group_by_name(&state.pool, &name).await?;
    let group_id = group.id.expect("persisted portfolio group always has an id");
    let member_ids = paperbot_store::accounts::member_account_ids(&state.pool, group_id).await?;

    let mut member_names = Vec::with_capacity(member_ids.len());
    let mut timestamps = BTreeSet::new();
    for &account_id in &member_ids {
        let account = paperbot_store::accounts::get_by_id(&state.pool, account_id).await?;
        member_names.push(account.name);
        let curve = paperbot_store::mtm::equity_curve(&state.pool, account_id, DEFAULT_LIMIT).await?;
        timestamps.extend(curve.into_iter().map(|row| row.ts));
    }

    let mut equity_curve = Vec::with_capacity(timestamps.len());
    for ts in timestamps {
        let total_equity =
            paperbot_store::mtm::portfolio_equity_as_of(&state.pool, &member_ids, ts).await?;
        equity_curve.push(PortfolioEquityPoint { ts, total_equity });
    }

    Ok(Json(PortfolioSummary {
        name: group.name,
        member_accounts: member_names,
        equity_curve,
    }))
}

async fn strategy_signals(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<paperbot_core::model::Signal>>> {
    let signals =
        paperbot_store::signals::recent_signals_for_strategy(&state.pool, &name, DEFAULT_LIMIT).await?;
    Ok(Json(signals))
}

async fn strategy_trades(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<paperbot_core::model::Position>>> {
    let trades =
        paperbot_store::positions::list_closed_by_strategy(&state.pool, &name, DEFAULT_LIMIT).await?;
    Ok(Json(trades))
}

async fn strategy_metrics(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<paperbot_metrics::StrategyMetrics>> {
    if let Some(cached) = state.metrics_cache.get(&name) {
        return Ok(Json(cached));
    }

    let trades =
        paperbot_store::positions::list_closed_by_strategy(&state.pool, &name, DEFAULT_LIMIT).await?;
    if trades.is_empty() {
        return Err(ApiError::NotFound(format!("no closed trades for strategy {name}")));
    }

    let equity_series: Vec<f64> = trades
        .iter()
        .filter_map(|p| p.realised_pnl.and_then(|pnl| pnl.to_f64()))
        .collect();
    let metrics = paperbot_metrics::compute_strategy_metrics(&trades, &equity_series);
    state.metrics_cache.set(&name, metrics.clone());
    Ok(Json(metrics))
}

async fn asset_performance(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<AssetPerformance>> {
    let positions = paperbot_store::positions::list_closed_by_asset(&state.pool, &symbol).await?;

    let mut strategies: BTreeSet<String> = BTreeSet::new();
    strategies.extend(positions.iter().map(|p| p.strategy.clone()));

    let mut by_strategy = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let strategy_positions: Vec<paperbot_core::model::Position> = positions
            .iter()
            .filter(|p| p.strategy == strategy)
            .cloned()
            .collect();
        let equity_series: Vec<f64> = strategy_positions
            .iter()
            .filter_map(|p| p.realised_pnl.and_then(|pnl| pnl.to_f64()))
            .collect();
        let metrics = paperbot_metrics::compute_strategy_metrics(&strategy_positions, &equity_series);
        by_strategy.push(AssetStrategyPerformance { strategy, metrics });
    }

    Ok(Json(AssetPerformance {
        asset: symbol,
        by_strategy,
    }))
}

/// Bind and serve the read API until the process is killed.
pub async fn run_server(state: AppState, config: ApiConfig) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr, "read_api_listening");
    axum::serve(listener, router).await
}
