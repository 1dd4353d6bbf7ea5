//! Reactive async values.
//!
//! An [`AsyncValue`] wraps a future and exposes its settlement as reactive
//! state: status, value and error are all read through one signal, which
//! notifies exactly once when the future settles.

use std::cell::RefCell;
use std::fmt::{self, Display};
use std::future::Future;
use std::rc::Rc;

use crate::reactive::Signal;
use crate::schedule::spawn_local;

/// Settlement state of an [`AsyncValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncStatus {
    Pending,
    Resolved,
    Rejected,
}

enum Outcome<T> {
    Pending,
    Resolved(T),
    Rejected(Rc<str>),
}

struct AsyncCell<T> {
    signal: Signal,
    outcome: RefCell<Outcome<T>>,
}

impl<T> AsyncCell<T> {
    fn status(&self) -> AsyncStatus {
        self.signal.track();
        match &*self.outcome.borrow() {
            Outcome::Pending => AsyncStatus::Pending,
            Outcome::Resolved(_) => AsyncStatus::Resolved,
            Outcome::Rejected(_) => AsyncStatus::Rejected,
        }
    }

    /// Settle once; later settlements are ignored.
    fn settle(&self, outcome: Outcome<T>) {
        {
            let mut current = self.outcome.borrow_mut();
            if !matches!(*current, Outcome::Pending) {
                return;
            }
            *current = outcome;
        }
        self.signal.notify();
    }
}

trait Settlement {
    fn status(&self) -> AsyncStatus;
}

impl<T> Settlement for AsyncCell<T> {
    fn status(&self) -> AsyncStatus {
        AsyncCell::status(self)
    }
}

/// A type-erased reference to an [`AsyncValue`], as handed to boundaries.
#[derive(Clone)]
pub struct AsyncHandle(Rc<dyn Settlement>);

impl AsyncHandle {
    /// Current status. Tracked.
    pub fn status(&self) -> AsyncStatus {
        self.0.status()
    }

    pub fn is_resolved(&self) -> bool {
        self.status() == AsyncStatus::Resolved
    }
}

impl fmt::Debug for AsyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AsyncHandle").finish()
    }
}

/// A future's result as reactive state.
///
/// # Example
///
/// ```rust,ignore
/// let user = AsyncValue::new(async { fetch_user().await });
///
/// // inside a render
/// match user.value() {
///     Some(user) => text(user.name),
///     None => text("loading"),
/// }
/// ```
pub struct AsyncValue<T> {
    cell: Rc<AsyncCell<T>>,
}

impl<T: 'static> AsyncValue<T> {
    /// Spawn `future` on the local executor and track its outcome.
    pub fn new<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + 'static,
        E: Display,
    {
        let value = Self::pending();
        let target = Rc::downgrade(&value.cell);

        spawn_local(async move {
            let outcome = match future.await {
                Ok(value) => Outcome::Resolved(value),
                Err(err) => Outcome::Rejected(Rc::from(err.to_string())),
            };
            match target.upgrade() {
                Some(cell) => cell.settle(outcome),
                None => tracing::trace!("async value dropped before settling"),
            }
        });

        value
    }

    /// An already resolved value.
    pub fn resolved(value: T) -> Self {
        let this = Self::pending();
        *this.cell.outcome.borrow_mut() = Outcome::Resolved(value);
        this
    }

    fn pending() -> Self {
        Self {
            cell: Rc::new(AsyncCell {
                signal: Signal::new(),
                outcome: RefCell::new(Outcome::Pending),
            }),
        }
    }

    /// Current status. Tracked.
    pub fn status(&self) -> AsyncStatus {
        self.cell.status()
    }

    /// The resolved value, if any. Tracked.
    pub fn value(&self) -> Option<T>
    where
        T: Clone,
    {
        self.cell.signal.track();
        match &*self.cell.outcome.borrow() {
            Outcome::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The rejection message, if any. Tracked.
    pub fn error(&self) -> Option<Rc<str>> {
        self.cell.signal.track();
        match &*self.cell.outcome.borrow() {
            Outcome::Rejected(err) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn handle(&self) -> AsyncHandle {
        AsyncHandle(self.cell.clone())
    }
}

impl<T> Clone for AsyncValue<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for AsyncValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &*self.cell.outcome.borrow() {
            Outcome::Pending => AsyncStatus::Pending,
            Outcome::Resolved(_) => AsyncStatus::Resolved,
            Outcome::Rejected(_) => AsyncStatus::Rejected,
        };
        f.debug_struct("AsyncValue").field("status", &status).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
