//! Interactive Input Boundary
//!
//! Installs the listeners that drive the interactive depth counter. For every
//! configured event type a capture listener on the target enters an
//! interactive dispatch and a bubble listener exits it. Bubble listeners are
//! added at the next checkpoint so that they run after any bubble handlers
//! the application installs on the same target during start-up.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::batch::{enter_interactive, exit_interactive};
use super::checkpoint::queue_microtask;
use crate::config;
use crate::host::{Host, HostNode, Phase};
use crate::reactive::Handler;

thread_local! {
    static INSTALLED: RefCell<HashSet<(usize, HostNode)>> = RefCell::new(HashSet::new());
}

/// Attach interactive batching listeners to `target`.
///
/// Safe to call once per target; later calls for the same host and target
/// are ignored.
pub fn install_event_batching(host: &Rc<dyn Host>, target: HostNode) {
    let key = (Rc::as_ptr(host) as *const () as usize, target);
    let fresh = INSTALLED.with(|installed| installed.borrow_mut().insert(key));
    if !fresh {
        tracing::warn!(%target, "event batching already installed on target");
        return;
    }

    let events = config::current().interactive_events;
    tracing::debug!(%target, events = events.len(), "installing event batching");

    let on_capture = Handler::new(|_| enter_interactive());
    for event_type in &events {
        host.add_event_listener(target, event_type, Phase::Capture, on_capture.clone());
    }

    let host = host.clone();
    queue_microtask(move || {
        let on_bubble = Handler::new(|_| exit_interactive());
        for event_type in &events {
            host.add_event_listener(target, event_type, Phase::Bubble, on_bubble.clone());
        }
    });
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::reactive::Value;
    use crate::schedule::{interactive_depth, queue, tick, Rerun};
    use std::cell::Cell;

    fn setup() -> (Rc<MemoryHost>, Rc<dyn Host>, HostNode) {
        let memory = MemoryHost::new();
        let host: Rc<dyn Host> = memory.clone();
        let button = memory.create_element("button");
        memory.replace_children(memory.root(), &[button]);
        (memory, host, button)
    }

    #[test]
    fn click_flushes_before_dispatch_returns() {
        let (memory, host, button) = setup();
        install_event_batching(&host, memory.root());
        tick();

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let rerun: Rerun = Rc::new(move || runs_clone.set(runs_clone.get() + 1));

        let observed_depth = Rc::new(Cell::new(0));
        let depth_clone = observed_depth.clone();
        let queued = rerun.clone();
        memory.set_attribute(
            button,
            "onclick",
            &Value::from(Handler::new(move |_| {
                depth_clone.set(interactive_depth());
                queue(queued.clone());
                queue(queued.clone());
            })),
        );

        memory.dispatch(button, "click");
        assert_eq!(observed_depth.get(), 1);
        assert_eq!(runs.get(), 1);
        assert_eq!(interactive_depth(), 0);
    }

    #[test]
    fn non_interactive_events_use_default_path() {
        let (memory, host, button) = setup();
        install_event_batching(&host, memory.root());
        tick();

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let rerun: Rerun = Rc::new(move || runs_clone.set(runs_clone.get() + 1));
        memory.set_attribute(
            button,
            "onscroll",
            &Value::from(Handler::new(move |_| queue(rerun.clone()))),
        );

        memory.dispatch(button, "scroll");
        assert_eq!(runs.get(), 0);
        tick();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn second_install_is_ignored() {
        let (memory, host, button) = setup();
        install_event_batching(&host, memory.root());
        install_event_batching(&host, memory.root());
        tick();

        let depth = Rc::new(Cell::new(0));
        let depth_clone = depth.clone();
        memory.set_attribute(
            button,
            "onclick",
            &Value::from(Handler::new(move |_| depth_clone.set(interactive_depth()))),
        );

        memory.dispatch(button, "click");
        assert_eq!(depth.get(), 1);
        assert_eq!(interactive_depth(), 0);
    }

    #[test]
    fn stopped_propagation_recovers_at_checkpoint() {
        let (memory, host, button) = setup();
        install_event_batching(&host, memory.root());
        tick();

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let rerun: Rerun = Rc::new(move || runs_clone.set(runs_clone.get() + 1));
        memory.set_attribute(
            button,
            "onclick",
            &Value::from(Handler::new(move |event| {
                queue(rerun.clone());
                event.stop_propagation();
            })),
        );

        memory.dispatch(button, "click");
        assert_eq!(runs.get(), 0);
        assert_eq!(interactive_depth(), 1);

        tick();
        assert_eq!(runs.get(), 1);
        assert_eq!(interactive_depth(), 0);
    }
}
