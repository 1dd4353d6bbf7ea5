//! Signal Implementation
//!
//! A Signal is the minimal change-notification edge of the reactive graph. It
//! carries no value of its own: containers such as
//! [`ReactiveState`](super::ReactiveState) pair each stored value with one
//! signal and call [`Signal::notify`] after every write.
//!
//! # How Signals Work
//!
//! 1. A read performed while an [`Observer`](super::Observer) is tracking calls
//!    [`Signal::track`], which subscribes the innermost observer.
//!
//! 2. A write calls [`Signal::notify`], which invokes a snapshot of the
//!    subscribers taken before the first callback runs.
//!
//! 3. Subscribing or unsubscribing while a notification is running only
//!    affects the next notification.
//!
//! # Ownership
//!
//! Signals are cheap `Rc` handles. A [`Subscription`] holds a weak reference
//! back to the signal, so outstanding subscriptions never keep a signal alive.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::observer::Observer;

type Callback = Rc<dyn Fn()>;

struct SignalInner {
    /// Subscribers keyed by the slot handed out in their [`Subscription`].
    subscribers: RefCell<IndexMap<u64, Callback>>,
    next_slot: Cell<u64>,
}

/// A payload-free observable notification primitive.
///
/// # Example
///
/// ```rust,ignore
/// let signal = Signal::new();
/// let subscription = signal.subscribe(|| println!("changed"));
///
/// signal.notify(); // prints "changed"
/// subscription.unsubscribe();
/// signal.notify(); // prints nothing
/// ```
#[derive(Clone)]
pub struct Signal {
    inner: Rc<SignalInner>,
}

impl Signal {
    /// Create a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                subscribers: RefCell::new(IndexMap::new()),
                next_slot: Cell::new(0),
            }),
        }
    }

    /// Register `callback` to run on every notification.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// released or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.subscribe_rc(Rc::new(callback))
    }

    pub(crate) fn subscribe_rc(&self, callback: Callback) -> Subscription {
        let slot = self.inner.next_slot.get();
        self.inner.next_slot.set(slot + 1);
        self.inner.subscribers.borrow_mut().insert(slot, callback);

        Subscription {
            signal: Rc::downgrade(&self.inner),
            slot,
        }
    }

    /// Invoke every subscriber registered at the moment of the call.
    pub fn notify(&self) {
        let snapshot: SmallVec<[Callback; 4]> =
            self.inner.subscribers.borrow().values().cloned().collect();

        tracing::trace!(subscribers = snapshot.len(), "signal notify");

        for callback in snapshot {
            callback();
        }
    }

    /// Subscribe the innermost tracking observer, if any.
    ///
    /// Called by every reactive read. Outside a tracked scope this is a no-op.
    pub fn track(&self) {
        if let Some(observer) = Observer::current() {
            observer.subscribe_signal(self);
        }
    }

    /// Address shared by every clone of this signal.
    pub(crate) fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Handle returned by [`Signal::subscribe`].
///
/// Dropping the handle removes the subscription.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    signal: Weak<SignalInner>,
    slot: u64,
}

impl Subscription {
    /// Remove the subscription now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn release(&self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.subscribers.borrow_mut().shift_remove(&self.slot);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("slot", &self.slot)
            .field("live", &(self.signal.strong_count() > 0))
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
