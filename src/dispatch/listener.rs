//! Listener handles.
//!
//! A [`Listener`] wraps a callback behind an `Arc`. Its identity is that
//! allocation: clones of one handle are the same listener, two handles built
//! from identical closures are not. The registry compares listeners with
//! [`Listener::ptr_eq`], so subscribing the same handle twice is a no-op and
//! unsubscribing needs the handle that was subscribed.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::result::Result as StdResult;
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::ListenerError;

// ============================================================================
// Types
// ============================================================================

/// Arguments carried by one emission.
pub type EventArgs = Vec<Value>;

/// Outcome of a listener invocation.
pub type ListenerResult = StdResult<(), ListenerError>;

/// Synchronous callback.
type SyncCallback = dyn Fn(&[Value]) -> ListenerResult + Send + Sync;

/// Callback returning a future.
type AsyncCallback = dyn Fn(EventArgs) -> BoxFuture<'static, ListenerResult> + Send + Sync;

enum Callback {
    Sync(Box<SyncCallback>),
    Async(Box<AsyncCallback>),
}

/// What calling a listener produced.
pub(crate) enum Invocation {
    /// The listener ran to completion.
    Ready(ListenerResult),
    /// The listener started asynchronous work.
    Pending(BoxFuture<'static, ListenerResult>),
}

// ============================================================================
// Listener
// ============================================================================

/// Callback registered with an [`EventEmitter`](super::EventEmitter).
///
/// # Example
///
/// ```
/// use titanium_link::Listener;
///
/// let sync = Listener::new(|args| {
///     println!("got {args:?}");
///     Ok(())
/// });
///
/// let later = Listener::future(|args| async move {
///     println!("got {args:?} eventually");
///     Ok(())
/// });
///
/// assert!(sync.ptr_eq(&sync.clone()));
/// assert!(!sync.ptr_eq(&later));
/// ```
#[derive(Clone)]
pub struct Listener {
    callback: Arc<Callback>,
}

impl Listener {
    /// Creates a listener from a synchronous callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&[Value]) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(Callback::Sync(Box::new(callback))),
        }
    }

    /// Creates a listener from a callback that returns a future.
    ///
    /// `emit` awaits the future before moving to the next listener;
    /// `emit_sync` only starts it.
    pub fn future<F, Fut>(callback: F) -> Self
    where
        F: Fn(EventArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        Self {
            callback: Arc::new(Callback::Async(Box::new(move |args| callback(args).boxed()))),
        }
    }

    /// Returns `true` if both handles refer to the same listener.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }

    /// Returns `true` if this listener produces futures.
    #[inline]
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(*self.callback, Callback::Async(_))
    }

    /// Returns a handle that does not keep the callback alive.
    pub(crate) fn downgrade(&self) -> WeakListener {
        WeakListener {
            callback: Arc::downgrade(&self.callback),
        }
    }

    /// Calls the listener.
    pub(crate) fn invoke(&self, args: &[Value]) -> Invocation {
        match &*self.callback {
            Callback::Sync(callback) => Invocation::Ready(callback(args)),
            Callback::Async(callback) => Invocation::Pending(callback(args.to_vec())),
        }
    }
}

/// Non-owning [`Listener`] handle.
pub(crate) struct WeakListener {
    callback: Weak<Callback>,
}

impl WeakListener {
    /// Returns the listener if anything still holds it.
    pub(crate) fn upgrade(&self) -> Option<Listener> {
        self.callback.upgrade().map(|callback| Listener { callback })
    }
}

impl PartialEq for Listener {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &Arc::as_ptr(&self.callback))
            .field("async", &self.is_async())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_identity() {
        let a = Listener::new(|_| Ok(()));
        let b = Listener::new(|_| Ok(()));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_invoke_sync() {
        let listener = Listener::new(|args| {
            if args == [json!(1)] {
                Ok(())
            } else {
                Err("unexpected args".into())
            }
        });

        assert!(!listener.is_async());
        assert!(matches!(listener.invoke(&[json!(1)]), Invocation::Ready(Ok(()))));
        assert!(matches!(listener.invoke(&[]), Invocation::Ready(Err(_))));
    }

    #[test]
    fn test_weak_handle_follows_strong_ones() {
        let listener = Listener::new(|_| Ok(()));
        let weak = listener.downgrade();

        assert!(weak.upgrade().is_some_and(|l| l.ptr_eq(&listener)));

        drop(listener);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_invoke_async() {
        let listener = Listener::future(|args| async move {
            if args.is_empty() {
                Err("no args".into())
            } else {
                Ok(())
            }
        });

        assert!(listener.is_async());
        let Invocation::Pending(ok) = listener.invoke(&[json!("x")]) else {
            panic!("async listener should be pending");
        };
        assert!(ok.await.is_ok());

        let Invocation::Pending(failed) = listener.invoke(&[]) else {
            panic!("async listener should be pending");
        };
        assert!(failed.await.is_err());
    }
}
