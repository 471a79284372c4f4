//! Multi-strategy paper-trading platform for crypto perpetual futures
//! and prediction markets.
//!
//! Wires together market data collection, a price oracle, a strategy
//! orchestrator, per-account paper-trading engines, and a read-only
//! HTTP API under one `tokio` runtime.

pub mod app;
pub mod config;
pub mod error;
pub mod orchestrator;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
