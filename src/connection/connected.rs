//! The connected state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::descriptor::{ConnectionDescriptor, Port};
use crate::dispatch::{EventArgs, EventEmitter, Listener};
use crate::error::Result;
use crate::transport::{Socket, WsStream};

use super::ConnectionEvent;
use super::disconnected::Disconnected;

// ============================================================================
// Connected
// ============================================================================

/// A live connection.
///
/// Owns the transport and one [`EventEmitter`] that republishes it:
///
/// | Event | Arguments |
/// |-------|-----------|
/// | `open` | none |
/// | `message` | `[text]` |
/// | `error` | `[description]` |
/// | `close` | none |
///
/// Clones share the transport and the emitter. The socket stays open while
/// any clone is alive.
#[derive(Clone)]
pub struct Connected {
    descriptor: ConnectionDescriptor,
    socket: Socket,
    events: EventEmitter,
}

impl Connected {
    /// Wires a fresh emitter to `stream` and starts its event loop.
    pub(crate) fn wire(descriptor: ConnectionDescriptor, stream: WsStream) -> Self {
        let events = EventEmitter::new();
        let socket = Socket::spawn(stream, events.clone());

        info!(%descriptor, "Connected");

        Self {
            descriptor,
            socket,
            events,
        }
    }

    /// Returns the descriptor.
    #[inline]
    #[must_use]
    pub const fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Returns the host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        self.descriptor.host()
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> Port {
        self.descriptor.port()
    }

    /// Returns `true` if the endpoint uses `wss`.
    #[inline]
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.descriptor.is_secure()
    }

    /// Returns `true` while the transport event loop is running.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.socket.is_open()
    }

    /// Returns a disconnected handle for the same endpoint.
    ///
    /// This does not close the socket and does not clear listeners; both
    /// live on for as long as this handle (or a clone of it) does. Use
    /// [`close`](Self::close) to end the connection.
    #[must_use]
    pub fn disconnect(&self) -> Disconnected {
        debug!(descriptor = %self.descriptor, "Disconnected handle created");
        Disconnected::new(self.descriptor.clone())
    }

    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::WebSocket`](crate::Error::WebSocket) as reported by the transport
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) once the
    ///   event loop has ended
    pub async fn send(&self, payload: impl Into<String>) -> Result<()> {
        self.socket.send(payload.into()).await
    }

    /// Starts the close handshake. `"close"` is emitted once it completes.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub async fn close(&self) -> Result<()> {
        self.socket.close().await
    }

    /// Returns the emitter that transport events are published on.
    #[inline]
    #[must_use]
    pub const fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Adds `listener` for `event`.
    pub fn subscribe(&self, event: ConnectionEvent, listener: &Listener) -> &Self {
        self.events.subscribe(event, listener);
        self
    }

    /// Adds `listener` for a single delivery of `event`.
    pub fn subscribe_once(&self, event: ConnectionEvent, listener: &Listener) -> &Self {
        self.events.subscribe_once(event, listener);
        self
    }

    /// Removes listeners, see [`EventEmitter::unsubscribe`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUnsubscribe`](crate::Error::InvalidUnsubscribe)
    /// for a listener without an event.
    pub fn unsubscribe(
        &self,
        event: Option<ConnectionEvent>,
        listener: Option<&Listener>,
    ) -> Result<&Self> {
        self.events
            .unsubscribe(event.map(ConnectionEvent::as_str), listener)?;
        Ok(self)
    }

    /// Waits for the next `event`, see [`EventEmitter::pull`].
    pub fn pull(
        &self,
        event: ConnectionEvent,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<EventArgs>> + Send + 'static {
        self.events.pull(event, timeout)
    }
}

impl fmt::Debug for Connected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connected")
            .field("descriptor", &self.descriptor)
            .field("socket", &self.socket)
            .field("events", &self.events)
            .finish()
    }
}
