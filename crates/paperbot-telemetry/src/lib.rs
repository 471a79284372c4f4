//! Structured logging and Prometheus metrics for the paper-trading
//! platform.
//!
//! Provides:
//! - Structured logging via `tracing`, configured from `logging.level`
//!   / `logging.format` (grounded on
//!   `original_source/.../logging/setup.py`).
//! - A Prometheus metrics registry scoped to this system's own
//!   counters (signals, positions, risk rejections, collector/oracle
//!   health, read API request counts).

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
