//! Checkpoint Queue
//!
//! The asynchronous checkpoint is the point after the current synchronous
//! work completes and before the next externally triggered work starts. It is
//! modelled as a thread-local FIFO of one-shot tasks, drained by [`tick`].
//!
//! Futures backing async values run on a thread-local
//! [`LocalPool`](futures::executor::LocalPool). [`tick`] interleaves the two:
//! the checkpoint queue is drained completely before every poll of the pool,
//! so re-runs scheduled by one settled future are flushed before the next
//! future makes progress.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static CHECKPOINT: RefCell<VecDeque<Task>> = RefCell::new(VecDeque::new());
    static POOL: RefCell<LocalPool> = RefCell::new(LocalPool::new());
    static SPAWNER: LocalSpawner = POOL.with(|pool| pool.borrow().spawner());
}

/// Run `task` at the next checkpoint.
pub fn queue_microtask(task: impl FnOnce() + 'static) {
    CHECKPOINT.with(|queue| queue.borrow_mut().push_back(Box::new(task)));
}

/// Spawn `future` on the thread-local executor driven by [`tick`].
pub fn spawn_local(future: impl Future<Output = ()> + 'static) {
    let spawned = SPAWNER.with(|spawner| spawner.spawn_local(future));
    if let Err(err) = spawned {
        tracing::error!(error = %err, "failed to spawn local future");
    }
}

/// Whether checkpoint tasks are waiting to run.
pub fn has_pending_checkpoint() -> bool {
    CHECKPOINT.with(|queue| !queue.borrow().is_empty())
}

/// Drain the checkpoint queue and drive local futures until both are idle.
///
/// Embedders call this from their event loop after dispatching external
/// work. Tasks queued while draining run in the same call.
pub fn tick() {
    loop {
        drain_checkpoint();

        let progressed = POOL.with(|pool| match pool.try_borrow_mut() {
            Ok(mut pool) => pool.try_run_one(),
            Err(_) => {
                tracing::warn!("tick called from inside a local future; skipping executor");
                false
            }
        });

        if !progressed && !has_pending_checkpoint() {
            break;
        }
    }
}

fn drain_checkpoint() {
    loop {
        // Pop under a short borrow so tasks can queue more work.
        let next = CHECKPOINT.with(|queue| queue.borrow_mut().pop_front());
        match next {
            Some(task) => task(),
            None => break,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn tasks_run_in_submission_order_at_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            queue_microtask(move || log.borrow_mut().push(i));
        }

        assert!(log.borrow().is_empty());
        assert!(has_pending_checkpoint());

        tick();
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(!has_pending_checkpoint());
    }

    #[test]
    fn tasks_queued_while_draining_run_in_same_tick() {
        let ran = Rc::new(Cell::new(false));
        let ran_clone = ran.clone();

        queue_microtask(move || {
            queue_microtask(move || ran_clone.set(true));
        });

        tick();
        assert!(ran.get());
    }

    #[test]
    fn tick_drives_local_futures() {
        let (tx, rx) = futures::channel::oneshot::channel::<u32>();
        let received = Rc::new(Cell::new(0));
        let received_clone = received.clone();

        spawn_local(async move {
            if let Ok(value) = rx.await {
                received_clone.set(value);
            }
        });

        tick();
        assert_eq!(received.get(), 0);

        tx.send(9).unwrap();
        tick();
        assert_eq!(received.get(), 9);
    }

    #[test]
    fn checkpoint_work_from_futures_runs_in_same_tick() {
        let ran = Rc::new(Cell::new(false));
        let ran_clone = ran.clone();

        spawn_local(async move {
            queue_microtask(move || ran_clone.set(true));
        });

        tick();
        assert!(ran.get());
    }
}
