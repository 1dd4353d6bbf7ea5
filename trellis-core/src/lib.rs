//! Trellis Core
//!
//! This crate provides the runtime for the Trellis reactive UI framework.
//! It implements:
//!
//! - Fine-grained reactivity (signals, observers, reactive state)
//! - A batching scheduler with an interactive input fast path
//! - Components with lifecycle callbacks, contexts and async boundaries
//! - A keyed virtual tree reconciled into a pluggable rendering host
//!
//! The runtime is single-threaded. All shared state is thread-local and
//! reference counted; nothing here is `Send`.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: signals, observers and the reactive state container
//! - `schedule`: checkpoint queue, local executor and re-run batching
//! - `component`: component instances, setup-scope hooks and contexts
//! - `suspense`: async values and the suspense boundary
//! - `vdom`: node descriptions, reconciliation and the render entry point
//! - `host`: the rendering target interface and an in-memory host
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::prelude::*;
//!
//! fn counter(_props: &ReactiveState) -> Result<RenderFn> {
//!     let state = ReactiveState::new([("count", Value::from(0))]);
//!     let writer = state.clone();
//!     let increment = Handler::new(move |_| {
//!         let _ = writer.update("count", |v| Value::from(v.as_int().unwrap_or(0) + 1));
//!     });
//!
//!     Ok(render_fn(move || {
//!         let count = state.get_int("count").unwrap_or_default();
//!         h("button", Props::new().with("onclick", increment.clone()), vec![text(count.to_string())])
//!     }))
//! }
//!
//! let memory = MemoryHost::new();
//! let host: Rc<dyn Host> = memory.clone();
//! install_event_batching(&host, memory.root());
//! render(component(counter, Props::new(), vec![]), &host, memory.root())?;
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod reactive;
pub mod schedule;
pub mod suspense;
pub mod vdom;

pub use error::{Error, Result};

/// Everything needed to write components and mount them.
pub mod prelude {
    pub use crate::component::{
        current_component, on_async, on_cleanup, on_mount, render_fn, Context, RenderFn,
        Rendered, Setup,
    };
    pub use crate::error::{Error, Result};
    pub use crate::host::{Host, HostNode, MemoryHost};
    pub use crate::reactive::{Handler, Observer, ReactiveState, Signal, Value};
    pub use crate::schedule::{install_event_batching, tick};
    pub use crate::suspense::{suspend, suspense, use_async, AsyncStatus, AsyncValue};
    pub use crate::vdom::{
        component, fragment, h, keyed_fragment, render, text, unmount, Hooks, Props, VNode,
    };
    pub use std::rc::Rc;
}
