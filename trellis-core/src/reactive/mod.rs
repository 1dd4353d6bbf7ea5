//! Reactive Primitives
//!
//! This module implements the dependency-tracking half of the runtime:
//! signals, observers and reactive state containers. Reactivity exists only
//! to drive re-rendering; there are no memos or standalone effects.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is a payload-free "something changed" edge. Containers pair a
//! value slot with a signal and notify after every write.
//!
//! ## Observers
//!
//! An [`Observer`] records the signals read during its last tracked run and
//! submits its re-run to the scheduler when one of them notifies. Each
//! component instance drives its render through one observer.
//!
//! ## Reactive state
//!
//! A [`ReactiveState`] is a fixed set of named fields, each backed by its own
//! signal. Component props live in one; applications create others ad hoc.
//!
//! # Implementation Notes
//!
//! The tracking stack is thread-local and unwound by guards, so a failing
//! render never leaves a stale observer on the stack.

mod context;
mod observer;
mod signal;
mod state;
mod subscriber;
mod value;

pub use context::ObserverScope;
pub use observer::Observer;
pub use signal::{Signal, Subscription};
pub use state::ReactiveState;
pub use subscriber::SubscriberId;
pub use value::{Handler, Value};
