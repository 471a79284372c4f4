//! Paper engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaperError {
    #[error("store error: {0}")]
    Store(#[from] paperbot_store::StoreError),

    #[error("oracle error: {0}")]
    Oracle(#[from] paperbot_oracle::OracleError),

    #[error("account not found: {0}")]
    AccountNotFound(String),
}

pub type PaperResult<T> = Result<T, PaperError>;
