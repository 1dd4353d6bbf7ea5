//! Update Scheduling
//!
//! Observers never re-run inline. This module decides when they run:
//!
//! - [`checkpoint`](queue_microtask): the asynchronous checkpoint queue and the
//!   local executor for futures, both driven by [`tick`].
//! - [`batch`](queue): the pending re-run set with its default and interactive
//!   flush paths.
//! - [`install_event_batching`]: the input boundary that maps interactive event
//!   dispatch onto the interactive path.

mod batch;
mod checkpoint;
mod interactive;

pub use batch::{
    enter_interactive, exit_interactive, flush, interactive, interactive_depth, pending_count,
    queue, Rerun,
};
pub use checkpoint::{has_pending_checkpoint, queue_microtask, spawn_local, tick};
pub use interactive::install_event_batching;
