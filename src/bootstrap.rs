//! Entry-point slot for application bootstrap code.
//!
//! An [`EntryPoint`] holds at most one zero-argument callback. Bootstrap
//! code owns the slot and passes it to whoever registers the callback, then
//! runs it once setup has finished. There is no process-wide slot.
//!
//! ```
//! use titanium_link::EntryPoint;
//!
//! let entry = EntryPoint::new();
//! entry.register(|| {
//!     println!("ready");
//!     Ok(())
//! });
//!
//! assert!(entry.run().unwrap());
//! assert!(!entry.run().unwrap());
//! ```

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::error::ListenerError;

type EntryFn = Box<dyn FnOnce() -> Result<(), ListenerError> + Send>;

/// Set-once, run-once holder for the application entry point.
#[derive(Default)]
pub struct EntryPoint {
    slot: Mutex<Option<EntryFn>>,
}

impl EntryPoint {
    /// Creates an empty slot.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `callback`, replacing any earlier one.
    pub fn register<F>(&self, callback: F)
    where
        F: FnOnce() -> Result<(), ListenerError> + Send + 'static,
    {
        if self.slot.lock().replace(Box::new(callback)).is_some() {
            warn!("Entry point replaced");
        }
    }

    /// Returns `true` if a callback is waiting to run.
    #[inline]
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Runs the registered callback, at most once.
    ///
    /// Returns `Ok(false)` if nothing was registered.
    ///
    /// # Errors
    ///
    /// Returns the callback's own error after logging it.
    pub fn run(&self) -> Result<bool, ListenerError> {
        let Some(entry) = self.slot.lock().take() else {
            debug!("No entry point registered");
            return Ok(false);
        };

        entry().inspect_err(|e| error!(error = %e, "Entry point run failed"))?;
        Ok(true)
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("registered", &self.is_registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_run_empty() {
        let entry = EntryPoint::new();
        assert!(!entry.run().unwrap());
    }

    #[test]
    fn test_runs_once() {
        let entry = EntryPoint::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        entry.register(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(entry.is_registered());

        assert!(entry.run().unwrap());
        assert!(!entry.run().unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_replaces() {
        let entry = EntryPoint::new();
        entry.register(|| Err("first".into()));
        entry.register(|| Ok(()));

        assert!(entry.run().unwrap());
    }

    #[test]
    fn test_run_failure_is_returned() {
        let entry = EntryPoint::new();
        entry.register(|| Err("boom".into()));

        let err = entry.run().unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(!entry.is_registered());
    }
}
