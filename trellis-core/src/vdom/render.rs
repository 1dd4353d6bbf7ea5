//! Rendering entry point.
//!
//! Each host target gets one root node. The first [`render`] into a target
//! mounts the tree; later calls reconcile against what is already there.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::node::VNode;
use super::reconcile::{reconcile, MountCx};
use crate::error::Result;
use crate::host::{Host, HostNode};

type RootKey = (usize, HostNode);

thread_local! {
    static ROOTS: RefCell<HashMap<RootKey, VNode>> = RefCell::new(HashMap::new());
}

fn root_key(host: &Rc<dyn Host>, target: HostNode) -> RootKey {
    (Rc::as_ptr(host) as *const () as usize, target)
}

/// Render `tree` into `target`.
///
/// Mount callbacks run before this returns. A component whose setup fails
/// renders nothing; the first such failure is returned after the rest of
/// the tree has been committed.
pub fn render(tree: VNode, host: &Rc<dyn Host>, target: HostNode) -> Result<()> {
    let key = root_key(host, target);
    let root = ROOTS.with(|roots| {
        roots
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| VNode::root(host.clone(), target))
            .clone()
    });

    let mut cx = MountCx::new(host.clone());
    let previous = root.take_children();
    let first = previous.is_empty();
    let reconciled = reconcile(&root, previous, vec![tree], &mut cx);
    root.set_children(reconciled.children);

    if reconciled.structural {
        root.request_resync();
    }

    tracing::debug!(%target, first, structural = reconciled.structural, "rendered tree");
    cx.commit()
}

/// Tear down whatever was rendered into `target`.
///
/// Returns false when nothing was rendered there.
pub fn unmount(host: &Rc<dyn Host>, target: HostNode) -> bool {
    let root = ROOTS.with(|roots| roots.borrow_mut().remove(&root_key(host, target)));
    match root {
        Some(root) => {
            root.unmount(true);
            tracing::debug!(%target, "unmounted root");
            true
        }
        None => false,
    }
}

/// The tree currently rendered into `target`.
pub fn rendered(host: &Rc<dyn Host>, target: HostNode) -> Option<VNode> {
    ROOTS.with(|roots| {
        roots
            .borrow()
            .get(&root_key(host, target))
            .and_then(|root| root.children().into_iter().next())
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::vdom::{h, text, Props};

    #[test]
    fn first_render_mounts_then_patches() {
        let memory = MemoryHost::new();
        let host: Rc<dyn Host> = memory.clone();

        render(h("p", Props::new(), vec![text("one")]), &host, memory.root()).unwrap();
        let paragraph = memory.children(memory.root())[0];

        render(h("p", Props::new(), vec![text("two")]), &host, memory.root()).unwrap();

        assert_eq!(memory.children(memory.root()), vec![paragraph]);
        assert_eq!(memory.inner_markup(memory.root()), "<p>two</p>");
        assert!(rendered(&host, memory.root()).is_some_and(|node| node.is_mounted()));
    }

    #[test]
    fn unmount_clears_target() {
        let memory = MemoryHost::new();
        let host: Rc<dyn Host> = memory.clone();

        render(h("p", Props::new(), vec![]), &host, memory.root()).unwrap();
        assert!(unmount(&host, memory.root()));
        assert!(memory.children(memory.root()).is_empty());
        assert!(!unmount(&host, memory.root()));
    }
}
