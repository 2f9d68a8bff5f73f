//! Keyed multi-listener event emitter.
//!
//! [`EventEmitter`] maps event names to ordered listener lists and offers
//! four ways to deliver an event:
//!
//! | Method | Delivery | Waits for listeners | Failures |
//! |--------|----------|---------------------|----------|
//! | [`emit_sync`](EventEmitter::emit_sync) | now, in order | sync part only | logged |
//! | [`emit`](EventEmitter::emit) | in order, one at a time | yes | logged |
//! | [`queue`](EventEmitter::queue) | later, on the runtime | no | logged |
//! | [`pull`](EventEmitter::pull) | n/a, awaits the next emission | n/a | `Timeout` |
//!
//! A listener failure never stops delivery to the listeners after it and
//! never reaches the emitting caller. It is reported through `tracing`.
//!
//! # One-shot listeners
//!
//! An entry registered with [`subscribe_once`](EventEmitter::subscribe_once)
//! is claimed, that is removed from the registry under the lock, right
//! before it is called. Only the pass that claims it calls it, so it runs at
//! most once even when several emissions of the same event overlap.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};

use super::listener::{EventArgs, Invocation, Listener, ListenerResult, WeakListener};

// ============================================================================
// Types
// ============================================================================

/// One registration.
struct ListenerEntry {
    listener: Listener,
    once: bool,
}

/// Event name to listeners, in registration order.
type Registry = FxHashMap<String, Vec<ListenerEntry>>;

// ============================================================================
// Unsubscribe
// ============================================================================

/// What [`EventEmitter::remove`] should drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsubscribe {
    /// Every listener for every event.
    All,
    /// Every listener for one event.
    Event(String),
    /// One listener for one event.
    Listener {
        /// Event the listener was subscribed to.
        event: String,
        /// The subscribed handle.
        listener: Listener,
    },
}

impl Unsubscribe {
    /// Builds the operation from optional parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUnsubscribe`] for a listener without an event.
    pub fn from_parts(event: Option<&str>, listener: Option<&Listener>) -> Result<Self> {
        match (event, listener) {
            (None, None) => Ok(Self::All),
            (None, Some(_)) => Err(Error::InvalidUnsubscribe),
            (Some(event), None) => Ok(Self::Event(event.to_owned())),
            (Some(event), Some(listener)) => Ok(Self::Listener {
                event: event.to_owned(),
                listener: listener.clone(),
            }),
        }
    }
}

// ============================================================================
// EventEmitter
// ============================================================================

/// Registry of listeners keyed by event name.
///
/// Cloning is cheap and every clone shares the same registry.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use titanium_link::{EventEmitter, Listener};
///
/// let events = EventEmitter::new();
/// let greet = Listener::new(|args| {
///     println!("hello {}", args[0]);
///     Ok(())
/// });
///
/// events
///     .subscribe("greet", &greet)
///     .emit_sync("greet", vec![json!("world")]);
/// ```
#[derive(Clone, Default)]
pub struct EventEmitter {
    registry: Arc<Mutex<Registry>>,
}

// ============================================================================
// EventEmitter - Registration
// ============================================================================

impl EventEmitter {
    /// Creates an empty emitter.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` for `event`.
    ///
    /// Adding a listener that is already registered for `event` does nothing.
    pub fn subscribe(&self, event: impl Into<String>, listener: &Listener) -> &Self {
        self.insert(event.into(), listener, false);
        self
    }

    /// Adds `listener` for a single delivery of `event`.
    ///
    /// If the listener is already registered for `event`, that registration
    /// becomes one-shot.
    pub fn subscribe_once(&self, event: impl Into<String>, listener: &Listener) -> &Self {
        self.insert(event.into(), listener, true);
        self
    }

    /// Removes listeners.
    ///
    /// | `event` | `listener` | Effect |
    /// |---------|------------|--------|
    /// | `None` | `None` | clears every event |
    /// | `Some` | `None` | clears one event |
    /// | `Some` | `Some` | removes one listener |
    /// | `None` | `Some` | error |
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUnsubscribe`] for a listener without an event.
    pub fn unsubscribe(&self, event: Option<&str>, listener: Option<&Listener>) -> Result<&Self> {
        let operation = Unsubscribe::from_parts(event, listener)?;
        Ok(self.remove(operation))
    }

    /// Applies an [`Unsubscribe`].
    pub fn remove(&self, operation: Unsubscribe) -> &Self {
        let removed: Vec<ListenerEntry> = {
            let mut registry = self.registry.lock();

            match operation {
                Unsubscribe::All => registry.drain().flat_map(|(_, entries)| entries).collect(),
                Unsubscribe::Event(event) => registry.remove(&event).unwrap_or_default(),
                Unsubscribe::Listener { event, listener } => {
                    let Some(entries) = registry.get_mut(&event) else {
                        return self;
                    };
                    let gone: Vec<ListenerEntry> = entries
                        .iter()
                        .position(|entry| entry.listener.ptr_eq(&listener))
                        .map(|position| entries.remove(position))
                        .into_iter()
                        .collect();
                    if entries.is_empty() {
                        registry.remove(&event);
                    }
                    gone
                }
            }
        };

        // Outside the lock: a listener may own a pending pull, whose guard
        // locks the registry when dropped.
        drop(removed);

        self
    }

    fn insert(&self, event: String, listener: &Listener, once: bool) {
        let mut registry = self.registry.lock();
        let entries = registry.entry(event).or_default();

        match entries
            .iter_mut()
            .find(|entry| entry.listener.ptr_eq(listener))
        {
            Some(entry) => entry.once |= once,
            None => entries.push(ListenerEntry {
                listener: listener.clone(),
                once,
            }),
        }
    }
}

// ============================================================================
// EventEmitter - Introspection
// ============================================================================

impl EventEmitter {
    /// Returns the number of listeners for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry.lock().get(event).map_or(0, Vec::len)
    }

    /// Returns `true` if `listener` is registered for `event`.
    #[must_use]
    pub fn contains(&self, event: &str, listener: &Listener) -> bool {
        self.registry
            .lock()
            .get(event)
            .is_some_and(|entries| entries.iter().any(|entry| entry.listener.ptr_eq(listener)))
    }

    /// Returns the names of events that have listeners.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.registry.lock().keys().cloned().collect()
    }

    /// Returns `true` if no event has listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }
}

// ============================================================================
// EventEmitter - Emission
// ============================================================================

impl EventEmitter {
    /// Calls every listener for `event` now, in registration order.
    ///
    /// Asynchronous listeners are started and left running on the current
    /// tokio runtime; their failures are logged when they finish. Without a
    /// runtime their futures are dropped with a warning. An event without
    /// listeners is a no-op.
    pub fn emit_sync(&self, event: &str, args: EventArgs) -> &Self {
        let listeners = self.snapshot(event);
        if listeners.is_empty() {
            trace!(event, "No listeners");
            return self;
        }

        for listener in listeners {
            if !self.claim(event, &listener) {
                continue;
            }

            match listener.invoke(&args) {
                Invocation::Ready(result) => report(event, result),
                Invocation::Pending(future) => detach(event, future),
            }
        }

        self
    }

    /// Calls every listener for `event` in order, awaiting each one.
    ///
    /// Resolves once every listener has been attempted.
    pub async fn emit(&self, event: &str, args: EventArgs) {
        for listener in self.snapshot(event) {
            if !self.claim(event, &listener) {
                continue;
            }

            let result = match listener.invoke(&args) {
                Invocation::Ready(result) => result,
                Invocation::Pending(future) => future.await,
            };
            report(event, result);
        }
    }

    /// Schedules [`emit`](Self::emit) on the current tokio runtime and
    /// returns immediately.
    ///
    /// Without a runtime nothing is delivered and a warning is logged.
    pub fn queue(&self, event: impl Into<String>, args: EventArgs) -> &Self {
        let event = event.into();

        match Handle::try_current() {
            Ok(handle) => {
                let emitter = self.clone();
                handle.spawn(async move {
                    emitter.emit(&event, args).await;
                });
            }
            Err(_) => warn!(event = %event, "No tokio runtime, queued event dropped"),
        }

        self
    }

    /// Waits for the next emission of `event` and returns its arguments.
    ///
    /// The one-shot listener is registered when `pull` is called, not when
    /// the returned future is first polled, and `timeout` is measured from
    /// that moment too. A `timeout` too large to be represented as a
    /// deadline waits without one. Dropping the future before it resolves
    /// unsubscribes the listener.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if `timeout` elapses first; the listener is
    ///   removed
    /// - [`Error::ChannelClosed`] if the listener was unsubscribed before any
    ///   emission
    pub fn pull(
        &self,
        event: impl Into<String>,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<EventArgs>> + Send + 'static {
        let event = event.into();
        let deadline = timeout.and_then(|timeout| {
            Instant::now()
                .checked_add(timeout)
                .map(|deadline| (deadline, timeout))
        });

        let (tx, mut rx) = oneshot::channel::<EventArgs>();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let listener = Listener::new(move |args| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(args.to_vec());
            }
            Ok(())
        });
        self.subscribe_once(event.clone(), &listener);

        // The registry holds the only strong handle, so unsubscribing
        // closes the channel.
        let guard = PullGuard {
            emitter: self.clone(),
            event,
            listener: listener.downgrade(),
        };

        async move {
            let Some((deadline, timeout)) = deadline else {
                return Ok((&mut rx).await?);
            };

            match timeout_at(deadline, &mut rx).await {
                Ok(args) => Ok(args?),
                Err(_) => {
                    guard.release();
                    if let Some(args) = drain(&mut rx) {
                        return Ok(args);
                    }

                    let timeout_ms = timeout.as_millis() as u64;
                    debug!(event = %guard.event, timeout_ms, "Pull timed out");
                    Err(Error::timeout(guard.event.clone(), timeout_ms))
                }
            }
        }
    }

    /// Copies the current listeners for `event`.
    fn snapshot(&self, event: &str) -> Vec<Listener> {
        self.registry.lock().get(event).map_or_else(Vec::new, |entries| {
            entries.iter().map(|entry| entry.listener.clone()).collect()
        })
    }

    /// Checks `listener` is still registered and takes it out if one-shot.
    ///
    /// Returns `false` if the listener must be skipped.
    fn claim(&self, event: &str, listener: &Listener) -> bool {
        let mut registry = self.registry.lock();
        let Some(entries) = registry.get_mut(event) else {
            return false;
        };
        let Some(position) = entries
            .iter()
            .position(|entry| entry.listener.ptr_eq(listener))
        else {
            return false;
        };

        if entries[position].once {
            entries.remove(position);
            if entries.is_empty() {
                registry.remove(event);
            }
        }

        true
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        let mut map = f.debug_map();
        for (event, entries) in registry.iter() {
            map.entry(event, &entries.len());
        }
        map.finish()
    }
}

// ============================================================================
// PullGuard
// ============================================================================

/// Unsubscribes a pending `pull` listener when its future goes away.
struct PullGuard {
    emitter: EventEmitter,
    event: String,
    listener: WeakListener,
}

impl PullGuard {
    /// Removes the listener if it is still registered.
    fn release(&self) {
        if let Some(listener) = self.listener.upgrade() {
            self.emitter.remove(Unsubscribe::Listener {
                event: self.event.clone(),
                listener,
            });
        }
    }
}

impl Drop for PullGuard {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Closes `rx` and returns arguments sent before it closed.
///
/// An emission may have claimed the listener just before the deadline; its
/// arguments still belong to this pull.
fn drain(rx: &mut oneshot::Receiver<EventArgs>) -> Option<EventArgs> {
    rx.close();
    rx.try_recv().ok()
}

/// Logs a failed listener.
fn report(event: &str, result: ListenerResult) {
    if let Err(e) = result {
        error!(event, error = %e, "Listener failed");
    }
}

/// Runs an async listener to completion in the background.
fn detach(event: &str, future: BoxFuture<'static, ListenerResult>) {
    match Handle::try_current() {
        Ok(handle) => {
            let event = event.to_owned();
            handle.spawn(async move {
                report(&event, future.await);
            });
        }
        Err(_) => warn!(event, "No tokio runtime, async listener dropped"),
    }
}

// ============================================================================
// Tests
// ============================================================================
