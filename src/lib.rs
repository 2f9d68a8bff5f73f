//! titanium-link - event dispatch and connection lifecycle for a WebSocket
//! client.
//!
//! This library wraps a single client-initiated WebSocket in a small state
//! machine and republishes everything the socket reports through an
//! in-process event emitter.
//!
//! # Architecture
//!
//! - **Descriptor**: loose endpoint input (`"wss://host:443"`, `"host:9000"`,
//!   a partial struct, or nothing) normalized into `{host, port, secure}`
//! - **Dispatch**: keyed listener registry with synchronous, awaited,
//!   queued and pull-style delivery
//! - **Connection**: [`Disconnected`] and [`Connected`] handles; `connect`
//!   dials, `disconnect` derives a descriptor-only handle
//! - **Transport**: tokio-tungstenite event loop feeding the emitter
//!
//! Failures are surfaced, never retried. There is no reconnection policy.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use titanium_link::{ConnectionEvent, Listener, Result, connect};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let connection = connect("ws://localhost:9000").await?;
//!
//!     connection.subscribe(
//!         ConnectionEvent::Message,
//!         &Listener::new(|args| {
//!             println!("received {}", args[0]);
//!             Ok(())
//!         }),
//!     );
//!
//!     let reply = connection.pull(ConnectionEvent::Message, Some(Duration::from_secs(5)));
//!     connection.send("ping").await?;
//!     println!("first reply: {:?}", reply.await?);
//!
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bootstrap`] | Entry-point slot |
//! | [`connection`] | [`Disconnected`] / [`Connected`] state machine |
//! | [`descriptor`] | Endpoint descriptors and parser |
//! | [`dispatch`] | [`EventEmitter`] and [`Listener`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`transport`] | WebSocket event loop (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Entry-point slot for bootstrap code.
pub mod bootstrap;

/// Connection state machine.
///
/// Start from [`Disconnected::parse`] or the top-level [`connect`].
pub mod connection;

/// Endpoint descriptors and the loose-input parser.
pub mod descriptor;

/// Event dispatch engine.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// WebSocket transport layer.
///
/// Internal module dialing the endpoint and running its event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bootstrap
pub use bootstrap::EntryPoint;

// Connection types
pub use connection::{
    ConnectOptions, Connected, ConnectionEvent, ConnectionHandle, Disconnected, connect, events,
};

// Descriptor types
pub use descriptor::{ConnectionDescriptor, EndpointSpec, PartialDescriptor, Port};

// Dispatch types
pub use dispatch::{EventArgs, EventEmitter, Listener, ListenerResult, Unsubscribe};

// Error types
pub use error::{Error, ListenerError, Result};
