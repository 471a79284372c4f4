//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] paperbot_store::StoreError),

    #[error("oracle error: {0}")]
    Oracle(#[from] paperbot_oracle::OracleError),

    #[error("strategy error: {0}")]
    Strategy(#[from] paperbot_strategy::StrategyError),

    #[error("paper engine error: {0}")]
    Paper(#[from] paperbot_paper::PaperError),

    #[error("collector error: {0}")]
    Collector(#[from] paperbot_collectors::CollectorError),

    #[error("api error: {0}")]
    Api(#[from] paperbot_api::ApiError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
