//! Generic reconnecting WebSocket client used by the streaming-venue
//! feeds (price oracle, candle collector).
//!
//! Deliberately minimal: a single connect-subscribe-forward loop with
//! a fixed reconnect delay, since neither the oracle stream nor the
//! candle stream needs application-level heartbeats or rate limiting
//! to stay within the venues this system talks to.

pub mod client;
pub mod error;

pub use client::{init_crypto, run_reconnecting_stream, RECONNECT_DELAY};
pub use error::{WsError, WsResult};
