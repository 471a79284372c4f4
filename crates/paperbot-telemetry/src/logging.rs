//! Structured logging initialization.
//!
//! Grounded on `original_source/.../logging/setup.py::setup_logging`:
//! level and format come from config (`logging.level`, `logging.format`
//! in `["json", "console"]`) rather than an environment-variable mode
//! switch.

use crate::error::TelemetryResult;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging at `level`, rendered as `format`
/// (`"json"` for production, anything else falls back to a
/// human-readable console renderer).
pub fn init_logging(level: &str, format: &str) -> TelemetryResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},paperbot=debug")));

    if format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .map_err(|e| crate::error::TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true).with_thread_names(true))
            .try_init()
            .map_err(|e| crate::error::TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}
