//! Context tokens.
//!
//! A [`Context`] is an opaque key. A component sets a value for it during
//! setup; descendants read the nearest value by walking the parent chain.

use std::any::type_name;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::scope::current_component;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ContextId(u64);

thread_local! {
    static NEXT_CONTEXT: Cell<u64> = const { Cell::new(0) };
}

impl ContextId {
    fn next() -> Self {
        NEXT_CONTEXT.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }
}

/// A typed context key.
///
/// # Example
///
/// ```rust,ignore
/// thread_local! { static THEME: Context<String> = Context::new(); }
///
/// // in a provider's setup
/// THEME.with(|theme| theme.set("dark".to_string()))?;
///
/// // in any descendant's setup
/// let theme = THEME.with(|theme| theme.get())?;
/// ```
pub struct Context<T> {
    id: ContextId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Context<T> {
    pub fn new() -> Self {
        Self {
            id: ContextId::next(),
            _marker: PhantomData,
        }
    }

    /// Provide `value` to the current component and its descendants.
    pub fn set(&self, value: T) -> Result<()> {
        let instance = current_component().ok_or_else(|| Error::outside_setup("context set"))?;
        instance.provide(self.id, Rc::new(value));
        Ok(())
    }

    /// The nearest value set by the current component or an ancestor.
    pub fn get(&self) -> Result<Rc<T>> {
        let instance = current_component().ok_or_else(|| Error::outside_setup("context get"))?;
        instance
            .lookup(self.id)
            .and_then(|value| value.downcast::<T>().ok())
            .ok_or(Error::ContextNotFound {
                context: type_name::<T>(),
            })
    }
}

impl<T: 'static> Default for Context<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id.0)
            .field("type", &type_name::<T>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_outside_setup_fails() {
        let context = Context::<u32>::new();
        assert_eq!(
            context.set(1),
            Err(Error::OutsideSetup {
                operation: "context set"
            })
        );
        assert_eq!(
            context.get().map(|v| *v),
            Err(Error::OutsideSetup {
                operation: "context get"
            })
        );
    }

    #[test]
    fn tokens_are_distinct() {
        let a = Context::<u32>::new();
        let b = Context::<u32>::new();
        assert_ne!(a.id, b.id);
        assert_eq!(a.clone().id, a.id);
    }
}
