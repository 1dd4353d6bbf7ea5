//! Component Scope Stack
//!
//! Records which component instance is running setup or render, so that
//! setup-only operations (mount and cleanup callbacks, contexts, async
//! declarations) can find it. Same discipline as the observer tracking
//! stack: entering returns a guard that pops on drop.

use std::cell::RefCell;
use std::rc::Rc;

use super::instance::ComponentInstance;

thread_local! {
    static COMPONENT_STACK: RefCell<Vec<Rc<ComponentInstance>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the component stack when dropped.
#[must_use = "the component stops being current as soon as the scope is dropped"]
pub(crate) struct ComponentScope {
    instance: Rc<ComponentInstance>,
}

impl ComponentScope {
    pub(crate) fn enter(instance: Rc<ComponentInstance>) -> Self {
        COMPONENT_STACK.with(|stack| stack.borrow_mut().push(instance.clone()));
        Self { instance }
    }
}

impl Drop for ComponentScope {
    fn drop(&mut self) {
        COMPONENT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert!(
                    Rc::ptr_eq(&entry, &self.instance),
                    "ComponentScope mismatch: expected {}, got {}",
                    self.instance.id(),
                    entry.id()
                );
            }
        });
    }
}

/// The component currently running setup or render, if any.
pub fn current_component() -> Option<Rc<ComponentInstance>> {
    COMPONENT_STACK.with(|stack| stack.borrow().last().cloned())
}
