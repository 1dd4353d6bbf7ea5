//! Async Values and Suspense
//!
//! Components declare async work during setup with [`use_async`] (spawn a
//! future) or [`suspend`] (declare an existing [`AsyncValue`]). The
//! declaration is relayed up the component parent chain to the nearest
//! boundary registered with [`on_async`](crate::component::on_async). The
//! stock boundary is the [`suspense`] component.
//!
//! A declaration with no boundary anywhere above fails at the call site
//! with [`Error::NoBoundary`].

mod boundary;
mod value;

use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

pub use boundary::suspense;
pub use value::{AsyncHandle, AsyncStatus, AsyncValue};

use crate::component::current_component;
use crate::error::{Error, Result};

/// Receives async values declared beneath a boundary.
pub(crate) type AsyncListener = Rc<dyn Fn(AsyncHandle)>;

/// Spawn `future` and declare it to the nearest boundary.
pub fn use_async<T, E, F>(future: F) -> Result<AsyncValue<T>>
where
    T: 'static,
    E: Display,
    F: Future<Output = std::result::Result<T, E>> + 'static,
{
    let instance = current_component().ok_or_else(|| Error::outside_setup("use_async"))?;
    let boundary = instance.async_boundary().ok_or(Error::NoBoundary)?;

    let value = AsyncValue::new(future);
    boundary(value.handle());
    Ok(value)
}

/// Declare an existing async value to the nearest boundary.
pub fn suspend<T: 'static>(value: &AsyncValue<T>) -> Result<()> {
    let instance = current_component().ok_or_else(|| Error::outside_setup("suspend"))?;
    instance.notify_async(value.handle())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
