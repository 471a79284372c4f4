//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("position not found: {0}")]
    PositionNotFound(i64),

    #[error("invalid row data: {0}")]
    InvalidRow(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
