//! Connection options.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use titanium_link::ConnectOptions;
//!
//! let options = ConnectOptions::new()
//!     .with_open_timeout(Duration::from_secs(5))
//!     .with_max_message_size(1 << 20);
//!
//! assert_eq!(options.open_timeout, Some(Duration::from_secs(5)));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

// ============================================================================
// ConnectOptions
// ============================================================================

/// Settings applied when a connection is opened.
///
/// Everything defaults to "unset": no open timeout and tungstenite's own
/// message limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Bound on the TCP connect plus WebSocket handshake.
    pub open_timeout: Option<Duration>,

    /// Largest incoming message accepted, in bytes.
    pub max_message_size: Option<usize>,
}

// ============================================================================
// Constructors
// ============================================================================

impl ConnectOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open_timeout: None,
            max_message_size: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectOptions {
    /// Sets the open timeout.
    #[inline]
    #[must_use]
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = Some(timeout);
        self
    }

    /// Sets the largest incoming message size.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }
}

// ============================================================================
// Conversion
// ============================================================================

impl ConnectOptions {
    /// Returns the tungstenite config, or `None` to use its defaults.
    #[must_use]
    pub(crate) fn ws_config(&self) -> Option<WebSocketConfig> {
        let max_message_size = self.max_message_size?;
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(max_message_size);
        Some(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ConnectOptions::new();
        assert_eq!(options, ConnectOptions::default());
        assert!(options.open_timeout.is_none());
        assert!(options.ws_config().is_none());
    }

    #[test]
    fn test_builder_chain() {
        let options = ConnectOptions::new()
            .with_open_timeout(Duration::from_millis(250))
            .with_max_message_size(4096);

        assert_eq!(options.open_timeout, Some(Duration::from_millis(250)));
        assert_eq!(options.max_message_size, Some(4096));
    }

    #[test]
    fn test_ws_config_carries_limit() {
        let config = ConnectOptions::new()
            .with_max_message_size(4096)
            .ws_config()
            .expect("limit should produce a config");
        assert_eq!(config.max_message_size, Some(4096));
    }
}
