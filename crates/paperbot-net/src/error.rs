//! WebSocket client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("message parse error: {0}")]
    ParseError(String),

    #[error("tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type WsResult<T> = Result<T, WsError>;
