//! Echo round trip against a running WebSocket endpoint.
//!
//! Usage:
//!
//! ```text
//! cargo run --example echo -- ws://localhost:9000 [--debug]
//! ```
//!
//! Sends a few text frames, prints every reply, then closes.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use titanium_link::{ConnectOptions, ConnectionEvent, Disconnected, Listener};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    let endpoint = args.iter().find(|a| !a.starts_with("--")).cloned();

    init_logging(debug);

    let server = Disconnected::parse(endpoint);
    println!("Connecting to {}", server.url());

    let options = ConnectOptions::new().with_open_timeout(Duration::from_secs(10));
    let connection = server.connect_with(&options).await?;

    connection
        .subscribe(
            ConnectionEvent::Open,
            &Listener::new(|_| {
                println!("open");
                Ok(())
            }),
        )
        .subscribe(
            ConnectionEvent::Message,
            &Listener::new(|args| {
                println!("<- {}", args[0]);
                Ok(())
            }),
        )
        .subscribe(
            ConnectionEvent::Close,
            &Listener::new(|_| {
                println!("closed");
                Ok(())
            }),
        );

    for text in ["hello", "from", "titanium-link"] {
        let reply = connection.pull(ConnectionEvent::Message, Some(REPLY_TIMEOUT));
        println!("-> {text}");
        connection.send(text).await?;
        reply.await?;
    }

    let closed = connection.pull(ConnectionEvent::Close, Some(REPLY_TIMEOUT));
    connection.close().await?;
    closed.await?;

    Ok(())
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing with appropriate log level.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("titanium_link=debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
