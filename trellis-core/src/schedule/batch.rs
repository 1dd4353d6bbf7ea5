//! Batching Scheduler
//!
//! Re-runs submitted by observers are never executed inline. They collect in
//! a pending set that is flushed along one of two paths:
//!
//! 1. **Default path.** The first submission of a window arms a task at the
//!    next checkpoint, which drains the whole pending set.
//!
//! 2. **Interactive path.** While an interactive input dispatch is running
//!    (depth above zero) submissions are held without arming the checkpoint.
//!    When the outermost dispatch exits, the pending set is flushed
//!    synchronously.
//!
//! # Coalescing
//!
//! With `coalesce_reruns` enabled (the default) the pending set is keyed by
//! re-run identity, so an observer notified by several signals in one window
//! runs once. With it disabled every submission executes; re-runs must be
//! idempotent with respect to current state either way.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use super::checkpoint::queue_microtask;
use crate::config;

/// A deferred re-computation submitted to the scheduler.
pub type Rerun = Rc<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    /// Keyed by the re-run's address.
    Coalesced(usize),
    /// Keyed by submission order.
    Submission(u64),
}

#[derive(Default)]
struct Pending {
    reruns: IndexMap<Slot, Rerun>,
    submissions: u64,
}

thread_local! {
    static PENDING: RefCell<Pending> = RefCell::new(Pending::default());
    static INTERACTIVE_DEPTH: Cell<usize> = const { Cell::new(0) };
    static CHECKPOINT_ARMED: Cell<bool> = const { Cell::new(false) };
}

/// Submit `rerun` for the next flush.
pub fn queue(rerun: Rerun) {
    PENDING.with(|pending| {
        let mut pending = pending.borrow_mut();
        let slot = if config::coalesce_reruns() {
            Slot::Coalesced(Rc::as_ptr(&rerun) as *const () as usize)
        } else {
            pending.submissions += 1;
            Slot::Submission(pending.submissions)
        };
        pending.reruns.entry(slot).or_insert(rerun);
    });

    if interactive_depth() == 0 {
        arm_checkpoint();
    }
}

/// Number of re-runs waiting for a flush.
pub fn pending_count() -> usize {
    PENDING.with(|pending| pending.borrow().reruns.len())
}

/// Current interactive dispatch nesting depth.
pub fn interactive_depth() -> usize {
    INTERACTIVE_DEPTH.with(Cell::get)
}

/// Mark the start of an interactive input dispatch.
///
/// Also arms the default checkpoint, so pending work is still flushed if the
/// matching [`exit_interactive`] never arrives.
pub fn enter_interactive() {
    let depth = INTERACTIVE_DEPTH.with(|d| {
        d.set(d.get() + 1);
        d.get()
    });
    tracing::debug!(depth, "interactive dispatch entered");
    arm_checkpoint();
}

/// Mark the end of an interactive input dispatch.
///
/// Leaving the outermost dispatch flushes every pending re-run immediately.
pub fn exit_interactive() {
    let depth = INTERACTIVE_DEPTH.with(|d| {
        let depth = d.get();
        if depth > 0 {
            d.set(depth - 1);
        }
        depth
    });

    if depth == 0 {
        tracing::warn!("interactive exit without matching enter; ignored");
        return;
    }

    tracing::debug!(depth = depth - 1, "interactive dispatch exited");
    if depth == 1 && pending_count() > 0 {
        flush();
    }
}

/// Run `f` as one interactive dispatch.
///
/// The depth is restored even if `f` panics.
pub fn interactive<R>(f: impl FnOnce() -> R) -> R {
    struct Exit;

    impl Drop for Exit {
        fn drop(&mut self) {
            exit_interactive();
        }
    }

    enter_interactive();
    let _exit = Exit;
    f()
}

/// Execute every pending re-run now.
pub fn flush() {
    let batch = PENDING.with(|pending| std::mem::take(&mut pending.borrow_mut().reruns));
    if batch.is_empty() {
        return;
    }

    tracing::debug!(reruns = batch.len(), "flushing scheduled re-runs");
    for rerun in batch.into_values() {
        rerun();
    }
}

fn arm_checkpoint() {
    if CHECKPOINT_ARMED.with(|armed| armed.replace(true)) {
        return;
    }

    queue_microtask(|| {
        CHECKPOINT_ARMED.with(|armed| armed.set(false));

        // Dispatch is synchronous, so a depth still open here means an exit
        // was skipped (propagation stopped before the bubble listener).
        let stale = INTERACTIVE_DEPTH.with(|d| d.replace(0));
        if stale > 0 {
            tracing::warn!(depth = stale, "resetting interactive depth left open by skipped exit");
        }

        flush();
    });
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
