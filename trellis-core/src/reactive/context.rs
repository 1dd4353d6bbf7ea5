//! Observer Tracking Stack
//!
//! The tracking stack records which observer is currently executing so that
//! reactive reads can subscribe it. It is a thread-local stack: a child
//! component rendering during its parent's render pushes its own observer,
//! and reads are attributed to the top entry only.
//!
//! # Implementation
//!
//! Entering a scope returns an [`ObserverScope`] guard. The guard pops the
//! stack on drop, so the stack unwinds on every exit path, including a panic
//! inside the tracked body.

use std::cell::RefCell;

use super::observer::Observer;

thread_local! {
    static OBSERVER_STACK: RefCell<Vec<Observer>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the tracking stack when dropped.
#[must_use = "the observer stops tracking as soon as the scope is dropped"]
pub struct ObserverScope {
    observer: Observer,
}

impl ObserverScope {
    /// Push `observer` as the innermost tracking scope.
    pub(crate) fn enter(observer: Observer) -> Self {
        OBSERVER_STACK.with(|stack| stack.borrow_mut().push(observer.clone()));
        Self { observer }
    }

    /// The innermost tracking observer, if any.
    pub fn current() -> Option<Observer> {
        OBSERVER_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Check if there is an active tracking scope.
    pub fn is_active() -> bool {
        OBSERVER_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Depth of the tracking stack.
    pub fn depth() -> usize {
        OBSERVER_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ObserverScope {
    fn drop(&mut self) {
        OBSERVER_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.id(),
                    self.observer.id(),
                    "ObserverScope mismatch: expected {}, got {}",
                    self.observer.id(),
                    entry.id()
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_tracks_observer() {
        let observer = Observer::new(|| {});

        assert!(!ObserverScope::is_active());
        assert!(ObserverScope::current().is_none());

        {
            let _scope = ObserverScope::enter(observer.clone());
            assert!(ObserverScope::is_active());
            assert_eq!(ObserverScope::current().map(|o| o.id()), Some(observer.id()));
        }

        assert!(!ObserverScope::is_active());
    }

    #[test]
    fn nested_scopes() {
        let outer = Observer::new(|| {});
        let inner = Observer::new(|| {});

        {
            let _outer = ObserverScope::enter(outer.clone());
            {
                let _inner = ObserverScope::enter(inner.clone());
                assert_eq!(ObserverScope::current().map(|o| o.id()), Some(inner.id()));
                assert_eq!(ObserverScope::depth(), 2);
            }
            assert_eq!(ObserverScope::current().map(|o| o.id()), Some(outer.id()));
        }

        assert_eq!(ObserverScope::depth(), 0);
    }

    #[test]
    fn stack_unwinds_on_panic() {
        let observer = Observer::new(|| {});

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = ObserverScope::enter(observer.clone());
            panic!("render failed");
        }));

        assert!(result.is_err());
        assert!(!ObserverScope::is_active());
    }
}
