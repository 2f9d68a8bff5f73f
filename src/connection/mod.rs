//! Connection state machine.
//!
//! A connection is either [`Disconnected`] (a descriptor and nothing else) or
//! [`Connected`] (descriptor, live transport, and the [`EventEmitter`] the
//! transport publishes on).
//!
//! ```text
//!                 connect()
//!  Disconnected ─────────────► Connected ──┐ send(), subscribe(),
//!       ▲          │ Err                   │ pull(), close()
//!       │          ▼                ◄──────┘
//!       │     Error::Connect
//!       │
//!       └──────── disconnect() ── Connected
//! ```
//!
//! `disconnect` only derives a new [`Disconnected`] handle; it leaves the
//! socket and its listeners alone.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connected` | Live connection handle |
//! | `disconnected` | Descriptor-only handle and `connect` |
//! | `options` | [`ConnectOptions`] |
//!
//! [`EventEmitter`]: crate::dispatch::EventEmitter

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::descriptor::{ConnectionDescriptor, EndpointSpec};
use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Live connection handle.
pub mod connected;

/// Descriptor-only handle.
pub mod disconnected;

/// Connection options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use connected::Connected;
pub use disconnected::Disconnected;
pub use options::ConnectOptions;

// ============================================================================
// Event Names
// ============================================================================

/// Names of the events a [`Connected`] emits.
pub mod events {
    /// The transport is open.
    pub const OPEN: &str = "open";

    /// The transport has closed.
    pub const CLOSE: &str = "close";

    /// A text frame arrived. One argument: the text.
    pub const MESSAGE: &str = "message";

    /// The transport failed. One argument: the description.
    pub const ERROR: &str = "error";
}

/// Events a [`Connected`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    /// See [`events::OPEN`].
    Open,
    /// See [`events::CLOSE`].
    Close,
    /// See [`events::MESSAGE`].
    Message,
    /// See [`events::ERROR`].
    Error,
}

impl ConnectionEvent {
    /// Returns the event name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => events::OPEN,
            Self::Close => events::CLOSE,
            Self::Message => events::MESSAGE,
            Self::Error => events::ERROR,
        }
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConnectionEvent> for String {
    #[inline]
    fn from(event: ConnectionEvent) -> Self {
        event.as_str().to_owned()
    }
}

// ============================================================================
// ConnectionHandle
// ============================================================================

/// Either state, for callers that keep one slot for a connection.
#[derive(Debug, Clone)]
pub enum ConnectionHandle {
    /// No live transport.
    Disconnected(Disconnected),
    /// Live transport and emitter.
    Connected(Connected),
}

impl ConnectionHandle {
    /// Returns the descriptor of either state.
    #[must_use]
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        match self {
            Self::Disconnected(server) => server.descriptor(),
            Self::Connected(connection) => connection.descriptor(),
        }
    }

    /// Returns `true` in the connected state.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Returns the live connection, if any.
    #[inline]
    #[must_use]
    pub const fn as_connected(&self) -> Option<&Connected> {
        match self {
            Self::Connected(connection) => Some(connection),
            Self::Disconnected(_) => None,
        }
    }

    /// Moves to the disconnected state. The socket is left untouched.
    #[must_use]
    pub fn into_disconnected(self) -> Disconnected {
        match self {
            Self::Disconnected(server) => server,
            Self::Connected(connection) => connection.disconnect(),
        }
    }
}

impl From<Disconnected> for ConnectionHandle {
    #[inline]
    fn from(server: Disconnected) -> Self {
        Self::Disconnected(server)
    }
}

impl From<Connected> for ConnectionHandle {
    #[inline]
    fn from(connection: Connected) -> Self {
        Self::Connected(connection)
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Parses `spec` and connects to it.
///
/// # Example
///
/// ```no_run
/// use titanium_link::{ConnectionEvent, Listener, connect};
///
/// # async fn example() -> titanium_link::Result<()> {
/// let connection = connect("localhost:9000").await?;
/// connection.subscribe(
///     ConnectionEvent::Message,
///     &Listener::new(|args| {
///         println!("{}", args[0]);
///         Ok(())
///     }),
/// );
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`Error::Connect`](crate::Error::Connect) if the transport cannot
/// be opened.
pub async fn connect(spec: impl Into<EndpointSpec>) -> Result<Connected> {
    Disconnected::parse(spec).connect().await
}

// ============================================================================
// Tests
// ============================================================================
