//! Reactive State Container
//!
//! A fixed-shape record whose fields are individually observable. Each field
//! captured at construction owns one [`Signal`] and one value slot; no signal
//! is shared between fields.
//!
//! Reads through [`ReactiveState::get`] subscribe the innermost tracking
//! observer. Writes through [`ReactiveState::set`] always store and always
//! notify, even when the new value equals the old one. Coalescing redundant
//! work is the scheduler's job, not the container's.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::signal::Signal;
use super::value::Value;
use crate::error::{Error, Result};

struct Field {
    signal: Signal,
    value: RefCell<Value>,
}

/// A record of individually observable fields.
///
/// Cloning the container clones the handle; all clones share fields.
///
/// # Example
///
/// ```rust,ignore
/// let state = ReactiveState::new([("count", Value::from(0)), ("label", "clicks".into())]);
///
/// state.set("count", 1)?;
/// assert_eq!(state.get_int("count")?, 1);
/// ```
#[derive(Clone)]
pub struct ReactiveState {
    fields: Rc<IndexMap<Rc<str>, Field>>,
}

impl ReactiveState {
    /// Capture the given fields. The shape is fixed from here on.
    pub fn new<K, I>(seed: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let fields = seed
            .into_iter()
            .map(|(name, value)| {
                let field = Field {
                    signal: Signal::new(),
                    value: RefCell::new(value),
                };
                (Rc::from(name.as_ref()), field)
            })
            .collect();

        Self {
            fields: Rc::new(fields),
        }
    }

    fn field(&self, name: &str) -> Result<&Field> {
        self.fields.get(name).ok_or_else(|| Error::UnknownField {
            field: name.to_string(),
        })
    }

    /// Read a field, subscribing the current observer.
    pub fn get(&self, name: &str) -> Result<Value> {
        let field = self.field(name)?;
        field.signal.track();
        Ok(field.value.borrow().clone())
    }

    /// Read a field without subscribing.
    pub fn peek(&self, name: &str) -> Result<Value> {
        Ok(self.field(name)?.value.borrow().clone())
    }

    /// Store `value` and notify the field's subscribers.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.field(name)?;
        *field.value.borrow_mut() = value.into();
        tracing::trace!(field = name, "reactive field written");
        field.signal.notify();
        Ok(())
    }

    /// Replace a field with `f(current)` and notify.
    pub fn update(&self, name: &str, f: impl FnOnce(&Value) -> Value) -> Result<()> {
        let next = f(&self.peek(name)?);
        self.set(name, next)
    }

    /// Whether `name` was captured at construction.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in construction order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get_int(&self, name: &str) -> Result<i64> {
        self.get(name)?.as_int().ok_or_else(|| mismatch(name, "int"))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        self.get(name)?.as_bool().ok_or_else(|| mismatch(name, "bool"))
    }

    pub fn get_str(&self, name: &str) -> Result<Rc<str>> {
        match self.get(name)? {
            Value::Str(s) => Ok(s),
            _ => Err(mismatch(name, "string")),
        }
    }

    pub fn get_opaque<T: Any>(&self, name: &str) -> Result<Rc<T>> {
        self.get(name)?
            .downcast::<T>()
            .ok_or_else(|| mismatch(name, "opaque"))
    }

    /// Subscriber count of a field's signal.
    pub fn subscriber_count(&self, name: &str) -> Result<usize> {
        Ok(self.field(name)?.signal.subscriber_count())
    }
}

fn mismatch(field: &str, expected: &'static str) -> Error {
    Error::TypeMismatch {
        field: field.to_string(),
        expected,
    }
}

impl fmt::Debug for ReactiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, field) in self.fields.iter() {
            map.entry(name, &*field.value.borrow());
        }
        map.finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
