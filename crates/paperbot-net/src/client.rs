//! Generic reconnecting WebSocket subscriber.
//!
//! Used by both the price oracle's streaming-venue feed and any
//! future streaming collector. Connects, optionally sends a single
//! subscribe frame, and forwards every text frame to a channel. On
//! any disconnection or parse error it logs and sleeps a fixed delay
//! before reconnecting; it only stops when cancelled.

use crate::error::{WsError, WsResult};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed delay between reconnection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Ensure the process-wide TLS crypto provider is installed. Must be
/// called once before any WebSocket connection is opened.
pub fn init_crypto() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Subscribe to `url`, optionally sending `subscribe_frame` once
/// connected, and forward every parsed JSON text frame on `tx`.
///
/// Runs until `cancel` is triggered. Any connection error or parse
/// failure is logged and followed by a [`RECONNECT_DELAY`] sleep
/// before retrying; this function never returns an error to the
/// caller except immediately after cancellation (`Ok(())`).
pub async fn run_reconnecting_stream(
    url: String,
    subscribe_frame: Option<Value>,
    tx: mpsc::Sender<Value>,
    cancel: CancellationToken,
) {
    while !cancel.is_cancelled() {
        match run_once(&url, subscribe_frame.as_ref(), &tx, &cancel).await {
            Ok(()) => {
                if cancel.is_cancelled() {
                    break;
                }
                warn!(%url, "stream closed, reconnecting");
            }
            Err(e) => {
                warn!(%url, error = %e, "stream error, reconnecting");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            _ = cancel.cancelled() => break,
        }
    }
    info!(%url, "stream loop stopped");
}

async fn run_once(
    url: &str,
    subscribe_frame: Option<&Value>,
    tx: &mpsc::Sender<Value>,
    cancel: &CancellationToken,
) -> WsResult<()> {
    info!(%url, "connecting to stream");
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;
    let (mut write, mut read) = ws_stream.split();
    info!(%url, "stream connected");

    if let Some(frame) = subscribe_frame {
        let msg = serde_json::to_string(frame)?;
        write
            .send(Message::Text(msg))
            .await
            .map_err(|e| WsError::SendFailed(e.to_string()))?;
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Value>(&text) {
                            Ok(value) => {
                                if tx.send(value).await.is_err() {
                                    debug!("stream receiver dropped, stopping");
                                    return Ok(());
                                }
                            }
                            Err(e) => warn!(error = %e, "failed to parse stream frame"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await.ok();
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000, "normal close".to_string()));
                        return Err(WsError::ConnectionClosed { code, reason });
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
            _ = cancel.cancelled() => return Ok(()),
        }
    }
}
