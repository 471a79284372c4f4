//! paperbot-api - thin read-only HTTP API over the paper-trading store.
//!
//! Serves the minimum external contract: accounts, positions, equity
//! curves, portfolio rollups, strategy signals/trades/metrics,
//! per-asset performance, and a health check. No write operations and
//! no business logic beyond querying the store and invoking the pure
//! metrics functions in `paperbot-metrics`.
//!
//! # Usage
//!
//! ```ignore
//! use paperbot_api::{run_server, ApiConfig, AppState};
//!
//! let state = AppState::new(pool);
//! tokio::spawn(async move {
//!     if let Err(e) = run_server(state, ApiConfig::default()).await {
//!         tracing::error!(error = %e, "read API server failed");
//!     }
//! });
//! ```

mod config;
mod error;
mod server;
mod state;
mod types;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use server::{create_router, run_server};
pub use state::AppState;
