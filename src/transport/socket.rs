//! WebSocket dialing and event loop.
//!
//! [`dial`] opens the client stream. [`Socket::spawn`] hands it to a tokio
//! task that republishes transport activity through an [`EventEmitter`] and
//! writes outgoing frames on request.
//!
//! # Event Loop
//!
//! The spawned task handles:
//!
//! - Incoming text frames, emitted as `"message"`
//! - Read errors, emitted as `"error"`
//! - Outgoing text frames from [`Socket::send`]
//! - Close handshakes from either side
//!
//! `"open"` is emitted when the task starts and `"close"` exactly once when
//! it ends. All of them use `emit_sync`, so a slow listener never holds up
//! the socket.

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::result::Result as StdResult;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_with_config};
use tracing::{debug, error, info, trace};
use url::Url;

use crate::connection::events::{CLOSE, ERROR, MESSAGE, OPEN};
use crate::dispatch::EventEmitter;
use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a dial failed.
pub type DialError = Box<dyn StdError + Send + Sync + 'static>;

/// Write half of the stream.
type WsWrite = SplitSink<WsStream, Message>;

// ============================================================================
// Dialing
// ============================================================================

/// Opens a client WebSocket to `url`.
///
/// # Arguments
///
/// * `url` - `ws://` or `wss://` address
/// * `config` - tungstenite limits, `None` for defaults
/// * `open_timeout` - bound on the TCP connect plus handshake
///
/// # Errors
///
/// Returns the raw cause: an invalid URL, an I/O or handshake error from
/// tungstenite, or an elapsed `open_timeout`.
pub async fn dial(
    url: &str,
    config: Option<WebSocketConfig>,
    open_timeout: Option<Duration>,
) -> StdResult<WsStream, DialError> {
    let url = Url::parse(url)?;
    let handshake = connect_async_with_config(url.as_str(), config, false);

    let (stream, response) = match open_timeout {
        Some(limit) => timeout(limit, handshake)
            .await
            .map_err(|_| format!("open timed out after {}ms", limit.as_millis()))??,
        None => handshake.await?,
    };

    debug!(%url, status = %response.status(), "WebSocket handshake completed");

    Ok(stream)
}

// ============================================================================
// SocketCommand
// ============================================================================

/// Internal commands for the event loop.
enum SocketCommand {
    /// Write one text frame.
    Send {
        payload: String,
        result_tx: oneshot::Sender<Result<()>>,
    },
    /// Start the close handshake.
    Close {
        result_tx: oneshot::Sender<Result<()>>,
    },
}

// ============================================================================
// Socket
// ============================================================================

/// Handle to a running WebSocket event loop.
///
/// Clones share the loop. When the last clone is dropped the loop closes
/// the stream and ends.
#[derive(Clone)]
pub struct Socket {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<SocketCommand>,
}

impl Socket {
    /// Starts the event loop for `stream`, publishing through `events`.
    ///
    /// `events` is attached before the task is spawned, so nothing the
    /// transport reports can slip past it.
    pub fn spawn(stream: WsStream, events: EventEmitter) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(stream, command_rx, events));

        Self { command_tx }
    }

    /// Writes one text frame.
    ///
    /// Resolves once the frame has been handed to the stream.
    ///
    /// # Errors
    ///
    /// - [`Error::WebSocket`] if the stream rejects the frame
    /// - [`Error::ConnectionClosed`] if the event loop has ended
    pub async fn send(&self, payload: String) -> Result<()> {
        let (result_tx, result_rx) = oneshot::channel();

        self.command_tx
            .send(SocketCommand::Send { payload, result_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        result_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Sends a close frame.
    ///
    /// The loop keeps reading until the peer acknowledges, then emits
    /// `"close"`.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn close(&self) -> Result<()> {
        let (result_tx, result_rx) = oneshot::channel();

        self.command_tx
            .send(SocketCommand::Close { result_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        result_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Returns `true` while the event loop is running.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
        events: EventEmitter,
    ) {
        let (mut ws_write, mut ws_read) = stream.split();

        info!("WebSocket open");
        events.emit_sync(OPEN, Vec::new());

        loop {
            tokio::select! {
                // Incoming frames from the peer
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Text frame received");
                            events.emit_sync(MESSAGE, vec![Value::String(text.as_str().to_owned())]);
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            let _ = ws_write.close().await;
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            events.emit_sync(ERROR, vec![Value::String(e.to_string())]);
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Binary, Ping, Pong
                        Some(Ok(other)) => {
                            trace!(len = other.len(), "Ignoring non-text frame");
                        }
                    }
                }

                // Commands from the handles
                command = command_rx.recv() => {
                    match command {
                        Some(SocketCommand::Send { payload, result_tx }) => {
                            let result = Self::write_text(&mut ws_write, payload).await;
                            let _ = result_tx.send(result);
                        }

                        Some(SocketCommand::Close { result_tx }) => {
                            debug!("Close requested");
                            let result = ws_write.close().await.map_err(Error::from);
                            let _ = result_tx.send(result);
                        }

                        None => {
                            debug!("All handles dropped");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        events.emit_sync(CLOSE, Vec::new());

        debug!("Event loop terminated");
    }

    async fn write_text(ws_write: &mut WsWrite, payload: String) -> Result<()> {
        let len = payload.len();
        ws_write.send(Message::Text(payload.into())).await?;
        trace!(len, "Text frame sent");
        Ok(())
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("open", &self.is_open())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dial_invalid_url() {
        let err = dial("ws://host:NaN", None, None).await.unwrap_err();
        assert!(err.downcast_ref::<url::ParseError>().is_some());
    }

    #[tokio::test]
    async fn test_dial_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = dial(&format!("ws://127.0.0.1:{port}"), None, None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dial_open_timeout() {
        // Accepts TCP but never answers the handshake
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().unwrap().port();
        let _accept = tokio::spawn(async move {
            let _conn = listener.accept().await;
            std::future::pending::<()>().await;
        });

        let err = dial(
            &format!("ws://127.0.0.1:{port}"),
            None,
            Some(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
