//! Strategy error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate strategy name: {0}")]
    DuplicateName(String),
}

pub type StrategyResult<T> = Result<T, StrategyError>;
