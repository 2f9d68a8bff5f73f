//! Error types for titanium-link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use titanium_link::{Disconnected, Result};
//!
//! async fn example() -> Result<()> {
//!     let server = Disconnected::parse("ws://localhost:9000");
//!     let connected = server.connect().await?;
//!     connected.send("hello").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Connect`], [`Error::ConnectionClosed`] |
//! | Dispatch | [`Error::InvalidUnsubscribe`], [`Error::Timeout`], [`Error::ChannelClosed`] |
//! | External | [`Error::WebSocket`], [`Error::Json`] |
//!
//! Listener callbacks fail with [`ListenerError`] instead. Those failures are
//! logged at the dispatch boundary and never surface as an [`Error`].

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::descriptor::ConnectionDescriptor;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

/// Boxed error returned by failing listeners.
pub type ListenerError = Box<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The transport could not be opened.
    ///
    /// Every failure while dialing (bad address, DNS, refused connection,
    /// handshake, open timeout) is reported as this variant. The underlying
    /// cause stays reachable through [`std::error::Error::source`].
    #[error("Failed to connect to {descriptor}!")]
    Connect {
        /// Endpoint that was dialed.
        descriptor: ConnectionDescriptor,
        /// What went wrong underneath.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    /// The transport event loop has terminated.
    ///
    /// Returned by `send` after the socket is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// A listener was given without an event name.
    #[error("Invalid unsubscribe: a listener was given without an event")]
    InvalidUnsubscribe,

    /// A `pull` deadline elapsed before the event fired.
    #[error("Timed out after {timeout_ms}ms waiting for '{event}'")]
    Timeout {
        /// Event that was awaited.
        event: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// A pending `pull` lost its listener before any emission.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// WebSocket error, propagated from the transport untranslated.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Endpoint configuration that is not valid JSON or has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connect error carrying the dialed descriptor and its cause.
    #[inline]
    pub fn connect(
        descriptor: ConnectionDescriptor,
        source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self::Connect {
            descriptor,
            source: source.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(event: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            event: event.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the transport could not be opened.
    #[inline]
    #[must_use]
    pub fn is_connect_error(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    /// Returns `true` if this error comes from the live transport.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::WebSocket(_))
    }

    /// Returns the descriptor of a failed connect.
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> Option<&ConnectionDescriptor> {
        match self {
            Self::Connect { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
