//! WebSocket transport layer.
//!
//! This module dials the endpoint and runs the per-connection event loop.
//! The connection state machine treats it as an opaque capability: a stream
//! that can be opened from a `ws://` or `wss://` URI, reports open, close,
//! message and error signals, and accepts text frames.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                          ┌──────────────────┐
//! │  Connected       │                          │  Remote          │
//! │                  │        WebSocket         │  endpoint        │
//! │  Socket ─────────┼─────────────────────────►│                  │
//! │  EventEmitter ◄──┼──────────────────────────┤                  │
//! │                  │     {ws|wss}://host:port │                  │
//! └──────────────────┘                          └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `dial` - Open the TCP stream and complete the WebSocket handshake
//! 2. `Socket::spawn` - Wire the event loop to an emitter, emit `"open"`
//! 3. `Socket::send` - Write text frames
//! 4. Peer close, `Socket::close`, or last handle dropped - emit `"close"`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `socket` | Dialing and the WebSocket event loop |

// ============================================================================
// Submodules
// ============================================================================

/// Dialing and the WebSocket event loop.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use socket::{DialError, Socket, WsStream, dial};
