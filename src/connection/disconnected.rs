//! The disconnected state.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::descriptor::{ConnectionDescriptor, EndpointSpec, Port};
use crate::error::{Error, Result};
use crate::transport::dial;

use super::connected::Connected;
use super::options::ConnectOptions;

// ============================================================================
// Disconnected
// ============================================================================

/// An endpoint that is not connected.
///
/// Holds only the descriptor. [`connect`](Self::connect) dials it and yields
/// a [`Connected`].
///
/// # Example
///
/// ```no_run
/// use titanium_link::{Disconnected, Result};
///
/// # async fn example() -> Result<()> {
/// let server = Disconnected::parse("ws://localhost:9000");
/// let connected = server.connect().await?;
/// connected.send("ping").await?;
///
/// let server = connected.disconnect();
/// assert_eq!(server.host(), "localhost");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disconnected {
    descriptor: ConnectionDescriptor,
}

impl Disconnected {
    /// Creates a handle for `descriptor`.
    #[inline]
    #[must_use]
    pub const fn new(descriptor: ConnectionDescriptor) -> Self {
        Self { descriptor }
    }

    /// Parses a loosely specified endpoint into a handle.
    #[inline]
    #[must_use]
    pub fn parse(spec: impl Into<EndpointSpec>) -> Self {
        Self::new(ConnectionDescriptor::parse(spec))
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

    /// Returns the address that will be dialed.
    #[inline]
    #[must_use]
    pub fn url(&self) -> String {
        self.descriptor.to_string()
    }

    /// Opens the connection with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the transport cannot be opened, whatever
    /// the cause.
    pub async fn connect(&self) -> Result<Connected> {
        self.connect_with(&ConnectOptions::default()).await
    }

    /// Opens the connection.
    ///
    /// On success the transport's signals are already wired to the returned
    /// handle's emitter. `"open"` is emitted from the transport task, which
    /// may run before the caller has subscribed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the transport cannot be opened, whatever
    /// the cause.
    pub async fn connect_with(&self, options: &ConnectOptions) -> Result<Connected> {
        let url = self.url();
        debug!(%url, "Connecting");

        let stream = dial(&url, options.ws_config(), options.open_timeout)
            .await
            .map_err(|source| {
                warn!(%url, error = %source, "Connect failed");
                Error::connect(self.descriptor.clone(), source)
            })?;

        Ok(Connected::wire(self.descriptor.clone(), stream))
    }
}

impl From<ConnectionDescriptor> for Disconnected {
    #[inline]
    fn from(descriptor: ConnectionDescriptor) -> Self {
        Self::new(descriptor)
    }
}

// ============================================================================
// Tests
// ============================================================================
