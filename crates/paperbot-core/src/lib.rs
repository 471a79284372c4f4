//! Core domain types for the paper-trading platform.
//!
//! This crate provides the types shared by every other crate in the
//! workspace:
//! - [`Price`], [`Size`]: precision-safe decimal newtypes.
//! - [`model`]: the persistent data model (candles, funding snapshots,
//!   prediction-market observations, signals, accounts, positions, MTM).
//! - [`CoreError`]: the shared error type for decimal/model parsing.

pub mod decimal;
pub mod error;
pub mod model;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use model::{
    Account, AccountMarkToMarket, Candle, Direction, ExitReason, FundingSnapshot, MarketSnapshot,
    PortfolioGroup, PortfolioMembership, Position, PositionStatus, PredictionMarketObservation,
    Signal,
};
