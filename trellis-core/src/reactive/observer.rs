//! Observer Implementation
//!
//! An Observer is a tracked re-computation unit. It records which signals
//! were read during its last run and asks the scheduler to re-run it when
//! any of them notifies.
//!
//! # How Observers Work
//!
//! 1. [`Observer::observe`] releases the subscriptions recorded by the previous
//!    run and pushes the observer onto the tracking stack.
//!
//! 2. Every reactive read performed before the returned scope is dropped
//!    subscribes the observer to that read's signal.
//!
//! 3. A notification never runs the callback inline. It submits the re-run to
//!    the batching scheduler, which executes it at the next flush.
//!
//! # Disposal
//!
//! [`Observer::dispose`] releases every subscription permanently. Re-runs
//! already queued for a disposed observer are skipped when they are flushed.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::context::ObserverScope;
use super::signal::{Signal, Subscription};
use super::subscriber::SubscriberId;
use crate::schedule::{self, Rerun};

struct ObserverInner {
    id: SubscriberId,

    /// The callback supplied at construction.
    on_signal: Box<dyn Fn()>,

    /// Runs `on_signal` unless the observer was disposed. Its pointer is the
    /// identity the scheduler coalesces on.
    rerun: Rerun,

    /// Handed to every signal this observer subscribes to.
    notify: Rc<dyn Fn()>,

    /// Subscriptions from the current run, keyed by signal address.
    subscriptions: RefCell<SmallVec<[(usize, Subscription); 4]>>,

    disposed: Cell<bool>,
}

/// A dependency-tracking re-computation unit.
///
/// # Example
///
/// ```rust,ignore
/// let state = ReactiveState::new([("count", Value::from(0))]);
///
/// let observer = Observer::new(move || println!("count changed"));
/// observer.track(|| state.get("count"));
///
/// state.set("count", 1)?;
/// tick(); // prints "count changed"
/// ```
#[derive(Clone)]
pub struct Observer {
    inner: Rc<ObserverInner>,
}

impl Observer {
    /// Create an observer bound to `on_signal`.
    ///
    /// Nothing is tracked until [`observe`](Self::observe) is called.
    pub fn new<F>(on_signal: F) -> Self
    where
        F: Fn() + 'static,
    {
        let inner = Rc::new_cyclic(|weak: &Weak<ObserverInner>| {
            let target = weak.clone();
            let rerun: Rerun = Rc::new(move || {
                if let Some(inner) = target.upgrade() {
                    if !inner.disposed.get() {
                        tracing::trace!(observer = %inner.id, "observer re-run");
                        (inner.on_signal)();
                    }
                }
            });

            let queued = rerun.clone();
            let notify: Rc<dyn Fn()> = Rc::new(move || schedule::queue(queued.clone()));

            ObserverInner {
                id: SubscriberId::new(),
                on_signal: Box::new(on_signal),
                rerun,
                notify,
                subscriptions: RefCell::new(SmallVec::new()),
                disposed: Cell::new(false),
            }
        });

        Self { inner }
    }

    /// Get the observer's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// The innermost tracking observer, if any.
    pub fn current() -> Option<Observer> {
        ObserverScope::current()
    }

    /// Start a tracked run.
    ///
    /// Releases the previous run's subscriptions and makes this observer the
    /// innermost tracking scope until the returned guard is dropped.
    pub fn observe(&self) -> ObserverScope {
        self.clear_subscriptions();
        ObserverScope::enter(self.clone())
    }

    /// Run `f` inside a tracked scope and return its result.
    pub fn track<R>(&self, f: impl FnOnce() -> R) -> R {
        let _scope = self.observe();
        f()
    }

    /// Record a dependency on `signal` for the current run.
    pub fn subscribe_signal(&self, signal: &Signal) {
        if self.inner.disposed.get() {
            return;
        }

        let address = signal.identity();
        let mut subscriptions = self.inner.subscriptions.borrow_mut();
        if subscriptions.iter().any(|(existing, _)| *existing == address) {
            return;
        }

        let subscription = signal.subscribe_rc(self.inner.notify.clone());
        subscriptions.push((address, subscription));
    }

    /// Release all subscriptions permanently.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.clear_subscriptions();
        tracing::trace!(observer = %self.inner.id, "observer disposed");
    }

    /// Check if the observer has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of signals recorded by the current run.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }

    /// Submit this observer's re-run to the scheduler, as a notification would.
    pub fn schedule(&self) {
        schedule::queue(self.inner.rerun.clone());
    }

    fn clear_subscriptions(&self) {
        // Take first so the drops below never run under the borrow.
        let released = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(released);
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.inner.id)
            .field("subscriptions", &self.subscription_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::tick;

    fn counting_observer() -> (Observer, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let observer = Observer::new(move || runs_clone.set(runs_clone.get() + 1));
        (observer, runs)
    }

    #[test]
    fn notification_defers_rerun_to_checkpoint() {
        let signal = Signal::new();
        let (observer, runs) = counting_observer();

        observer.track(|| signal.track());
        signal.notify();

        assert_eq!(runs.get(), 0);
        tick();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn observe_releases_previous_subscriptions() {
        let a = Signal::new();
        let b = Signal::new();
        let (observer, runs) = counting_observer();

        observer.track(|| a.track());
        assert_eq!(a.subscriber_count(), 1);

        observer.track(|| b.track());
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 1);

        a.notify();
        tick();
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn repeated_reads_subscribe_once() {
        let signal = Signal::new();
        let (observer, _runs) = counting_observer();

        observer.track(|| {
            signal.track();
            signal.track();
        });

        assert_eq!(observer.subscription_count(), 1);
        assert_eq!(signal.subscriber_count(), 1);
    }

    #[test]
    fn reads_attribute_to_innermost_observer() {
        let outer_signal = Signal::new();
        let inner_signal = Signal::new();
        let (outer, _) = counting_observer();
        let (inner, _) = counting_observer();

        outer.track(|| {
            outer_signal.track();
            inner.track(|| inner_signal.track());
        });

        assert_eq!(outer.subscription_count(), 1);
        assert_eq!(inner.subscription_count(), 1);
        assert_eq!(inner_signal.subscriber_count(), 1);
    }

    #[test]
    fn untracked_read_registers_nothing() {
        let signal = Signal::new();
        signal.track();
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn disposed_observer_never_reruns() {
        let signal = Signal::new();
        let (observer, runs) = counting_observer();

        observer.track(|| signal.track());
        signal.notify();
        observer.dispose();
        tick();

        assert_eq!(runs.get(), 0);
        assert_eq!(signal.subscriber_count(), 0);

        observer.track(|| signal.track());
        assert_eq!(observer.subscription_count(), 0);
    }

    #[test]
    fn panicking_body_still_unwinds_stack() {
        let (observer, _) = counting_observer();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            observer.track(|| panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(Observer::current().is_none());
    }
}
