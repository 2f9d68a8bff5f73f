//! Shared utilities for integration tests.
//!
//! Provides a local WebSocket endpoint that echoes text frames. Sending the
//! text `"close"` makes it start the close handshake.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// Constants
// ============================================================================

/// Text that asks the server to close the connection.
pub const CLOSE_REQUEST: &str = "close";

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// EchoServer
// ============================================================================

/// Echo endpoint bound to a random localhost port.
pub struct EchoServer {
    port: u16,
    /// One `()` per client connection that has ended.
    closed_rx: mpsc::UnboundedReceiver<()>,
}

impl EchoServer {
    /// Binds and starts accepting.
    pub async fn start() -> Self {
        let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, closed_tx.clone()));
            }
        });

        Self { port, closed_rx }
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `"ws://127.0.0.1:{port}"`.
    pub fn url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Waits up to `within` for a client connection to end.
    pub async fn wait_closed(&mut self, within: Duration) -> bool {
        matches!(timeout(within, self.closed_rx.recv()).await, Ok(Some(())))
    }
}

async fn serve(stream: TcpStream, closed_tx: mpsc::UnboundedSender<()>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Text(text) if text.as_str() == CLOSE_REQUEST => {
                let _ = ws.close(None).await;
            }
            Message::Text(text) => {
                if ws.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            _ => {}
        }
    }

    let _ = closed_tx.send(());
}

/// Returns a localhost port with nothing listening on it.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
        .await
        .expect("bind should succeed");
    listener.local_addr().expect("local addr").port()
}
