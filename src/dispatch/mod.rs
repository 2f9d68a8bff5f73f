//! Event dispatch engine.
//!
//! This module provides the keyed multi-listener registry that connections
//! publish transport events through. It is usable on its own as an in-process
//! event bus.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `emitter` | Registry and the four emission modes |
//! | `listener` | Listener handles and callback flavours |

// ============================================================================
// Submodules
// ============================================================================

/// Registry and emission modes.
pub mod emitter;

/// Listener handles.
pub mod listener;

// ============================================================================
// Re-exports
// ============================================================================

pub use emitter::{EventEmitter, Unsubscribe};
pub use listener::{EventArgs, Listener, ListenerResult};
