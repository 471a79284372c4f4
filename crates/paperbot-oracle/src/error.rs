//! Oracle error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] paperbot_store::StoreError),
}

pub type OracleResult<T> = Result<T, OracleError>;
