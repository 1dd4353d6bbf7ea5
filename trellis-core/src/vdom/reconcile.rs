//! Keyed Child Reconciliation
//!
//! Given the mounted children of a node and a new list of descriptions,
//! produce the new mounted list while reusing, patching, creating and
//! destroying nodes:
//!
//! 1. Index the previous children by explicit key, or by position when a
//!    child has no key.
//! 2. Walk the new list in order. A match that is the very same node is
//!    kept. A compatible match is patched in place. An incompatible match
//!    is replaced by a newly mounted node. No match mounts a new node.
//! 3. Unmount every previous child left unclaimed.
//!
//! The result reports a structural change whenever membership or order
//! changed, so the caller knows to resync real child order.

use std::mem;
use std::rc::Rc;

use indexmap::IndexMap;

use super::node::{compatible, Key, Lifecycle, VNode, Variant};
use crate::error::{Error, Result};
use crate::host::Host;

/// Lookup slot for a child: explicit key, else position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Key(Key),
    Index(usize),
}

impl Slot {
    fn of(node: &VNode, index: usize) -> Self {
        node.key().map_or(Slot::Index(index), Slot::Key)
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug)]
pub(crate) struct Reconciled {
    pub(crate) children: Vec<VNode>,
    pub(crate) structural: bool,
}

/// State threaded through one top-level mount or patch.
///
/// Insert hooks and component mount callbacks are queued in post-order and
/// fire from [`MountCx::commit`], after real nodes have been attached.
pub(crate) struct MountCx {
    host: Rc<dyn Host>,
    inserted: Vec<VNode>,
    errors: Vec<Error>,
}

impl MountCx {
    pub(crate) fn new(host: Rc<dyn Host>) -> Self {
        Self {
            host,
            inserted: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub(crate) fn queue_insert(&mut self, node: VNode) {
        self.inserted.push(node);
    }

    /// Record a failure without aborting the rest of the pass.
    pub(crate) fn fail(&mut self, err: Error) {
        self.errors.push(err);
    }

    /// Fire queued insert callbacks and report the first recorded failure.
    pub(crate) fn commit(mut self) -> Result<()> {
        for node in mem::take(&mut self.inserted) {
            // Replaced before the pass finished.
            if node.lifecycle() != Lifecycle::Mounted {
                continue;
            }
            if node.variant() == Variant::Component {
                if let Some(instance) = node.instance() {
                    instance.run_mounts();
                }
            }
            if let Some(insert) = node.hooks().insert {
                insert(&node);
            }
        }

        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The node to mount for `node`: itself if never mounted, else a copy.
pub(crate) fn claim(node: VNode) -> VNode {
    if node.lifecycle() == Lifecycle::Fresh {
        node
    } else {
        tracing::trace!(?node, "node already consumed, mounting a copy");
        node.fresh_copy()
    }
}

/// Reconcile `previous` (mounted under `owner`) against `next`.
pub(crate) fn reconcile(
    owner: &VNode,
    previous: Vec<VNode>,
    next: Vec<VNode>,
    cx: &mut MountCx,
) -> Reconciled {
    if previous.is_empty() {
        let children = next
            .into_iter()
            .map(|child| {
                let child = claim(child);
                child.mount(owner, cx);
                child
            })
            .collect();
        return Reconciled {
            children,
            structural: true,
        };
    }

    if next.is_empty() {
        for child in &previous {
            child.unmount(true);
        }
        return Reconciled {
            children: Vec::new(),
            structural: true,
        };
    }

    let mut structural = false;
    let mut index: IndexMap<Slot, (usize, VNode)> = IndexMap::with_capacity(previous.len());
    for (position, child) in previous.into_iter().enumerate() {
        let slot = Slot::of(&child, position);
        if let Some((_, displaced)) = index.insert(slot.clone(), (position, child)) {
            tracing::warn!(?slot, "duplicate key among siblings, unmounting the earlier node");
            displaced.unmount(true);
            structural = true;
        }
    }

    let mut children = Vec::with_capacity(next.len());

    for (position, child) in next.into_iter().enumerate() {
        match index.shift_remove(&Slot::of(&child, position)) {
            Some((previous_position, existing)) if existing.ptr_eq(&child) => {
                structural |= previous_position != position;
                children.push(existing);
            }
            Some((previous_position, existing)) if compatible(&existing, &child) => {
                structural |= existing.patch(&child, cx);
                structural |= previous_position != position;
                children.push(existing);
            }
            Some((_, existing)) => {
                let replacement = claim(child);
                replacement.mount(owner, cx);
                existing.unmount(true);
                structural = true;
                children.push(replacement);
            }
            None => {
                let created = claim(child);
                created.mount(owner, cx);
                structural = true;
                children.push(created);
            }
        }
    }

    for (_, (_, leftover)) in index {
        leftover.unmount(true);
        structural = true;
    }

    tracing::trace!(children = children.len(), structural, "reconciled children");
    Reconciled {
        children,
        structural,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::reactive::Value;
    use crate::vdom::{fragment, fragment_with, h, keyed_fragment, text, Hooks, Props};
    use std::cell::{Cell, RefCell};

    fn setup() -> (Rc<MemoryHost>, VNode) {
        let memory = MemoryHost::new();
        let host: Rc<dyn Host> = memory.clone();
        let root = VNode::root(host, memory.root());
        (memory, root)
    }

    fn run(root: &VNode, next: Vec<VNode>) -> bool {
        let host = root.host().unwrap();
        let mut cx = MountCx::new(host.clone());
        let previous = root.take_children();
        let reconciled = reconcile(root, previous, next, &mut cx);
        root.set_children(reconciled.children);
        if reconciled.structural {
            root.request_resync();
        }
        cx.commit().unwrap();
        reconciled.structural
    }

    fn item(key: &str) -> VNode {
        h("li", Props::new().key(key), vec![text(key)])
    }

    #[test]
    fn keyed_swap_reuses_nodes() {
        let (memory, root) = setup();
        run(&root, vec![item("a"), item("b")]);
        let before = memory.children(memory.root());

        let structural = run(&root, vec![item("b"), item("a")]);
        let after = memory.children(memory.root());

        assert!(structural);
        assert_eq!(after, vec![before[1], before[0]]);
        assert_eq!(memory.inner_markup(memory.root()), "<li>b</li><li>a</li>");
    }

    #[test]
    fn keyed_append_keeps_prefix() {
        let (memory, root) = setup();
        run(&root, vec![item("a"), item("b")]);
        let before = memory.children(memory.root());

        run(&root, vec![item("a"), item("b"), item("c")]);
        let after = memory.children(memory.root());

        assert_eq!(after.len(), 3);
        assert_eq!(&after[..2], &before[..]);
    }

    #[test]
    fn identical_list_is_not_structural() {
        let (_memory, root) = setup();
        run(&root, vec![item("a"), item("b")]);
        assert!(!run(&root, vec![item("a"), item("b")]));
    }

    #[test]
    fn same_node_instance_is_kept_without_patch() {
        let (_memory, root) = setup();
        let patched = Rc::new(RefCell::new(0));
        let patched_clone = patched.clone();
        let hooks = Hooks::new().on_prepatch(move |_, _| *patched_clone.borrow_mut() += 1);
        let node = h("p", Props::new().hook(hooks), vec![]);

        run(&root, vec![node.clone()]);
        run(&root, vec![node.clone()]);

        assert_eq!(*patched.borrow(), 0);
        assert!(root.children()[0].ptr_eq(&node));
    }

    #[test]
    fn incompatible_match_is_replaced() {
        let (memory, root) = setup();
        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let log = destroyed.clone();
        let hooks = Hooks::new().on_destroy(move |node| log.borrow_mut().push(node.tag()));

        run(&root, vec![h("p", Props::new().hook(hooks), vec![])]);
        let old = memory.children(memory.root())[0];

        run(&root, vec![h("span", Props::new(), vec![])]);

        assert_eq!(destroyed.borrow().len(), 1);
        assert!(memory.parent(old).is_none());
        assert_eq!(memory.inner_markup(memory.root()), "<span></span>");
    }

    #[test]
    fn null_attribute_is_removed() {
        let (memory, root) = setup();
        run(&root, vec![h("a", Props::new().with("title", "t"), vec![])]);
        run(&root, vec![h("a", Props::new().with("title", Value::Null), vec![])]);
        assert_eq!(memory.inner_markup(memory.root()), "<a></a>");

        run(&root, vec![h("a", Props::new().with("title", None::<&str>), vec![])]);
        assert_eq!(memory.inner_markup(memory.root()), "<a></a>");

        run(&root, vec![h("a", Props::new().with("title", "u"), vec![])]);
        assert_eq!(memory.inner_markup(memory.root()), "<a title=\"u\"></a>");
    }

    #[test]
    fn fragment_hooks_pair_insert_with_destroy() {
        let (memory, root) = setup();
        let inserted = Rc::new(Cell::new(0));
        let destroyed = Rc::new(Cell::new(0));
        let (on_insert, on_destroy) = (inserted.clone(), destroyed.clone());
        let hooks = Hooks::new()
            .on_insert(move |_| on_insert.set(on_insert.get() + 1))
            .on_destroy(move |_| on_destroy.set(on_destroy.get() + 1));

        run(&root, vec![fragment_with(Props::new().hook(hooks), vec![text("x")])]);
        assert_eq!((inserted.get(), destroyed.get()), (1, 0));
        assert_eq!(memory.inner_markup(memory.root()), "x");

        run(&root, Vec::new());
        assert_eq!((inserted.get(), destroyed.get()), (1, 1));
    }

    #[test]
    fn duplicate_previous_keys_are_all_released() {
        let (memory, root) = setup();
        let destroyed = Rc::new(RefCell::new(Vec::new()));
        let leaf = |label: &'static str| {
            let log = destroyed.clone();
            h(
                "li",
                Props::new()
                    .key("k")
                    .hook(Hooks::new().on_destroy(move |_| log.borrow_mut().push(label))),
                vec![text(label)],
            )
        };

        run(&root, vec![leaf("a"), leaf("b")]);
        run(&root, vec![leaf("z")]);

        assert_eq!(*destroyed.borrow(), vec!["a"]);
        assert_eq!(memory.inner_markup(memory.root()), "<li>z</li>");
    }

    #[test]
    fn text_patch_updates_in_place() {
        let (memory, root) = setup();
        run(&root, vec![text("one")]);
        let node = memory.children(memory.root())[0];

        run(&root, vec![text("two")]);

        assert_eq!(memory.children(memory.root()), vec![node]);
        assert_eq!(memory.text(node).as_deref(), Some("two"));
    }

    #[test]
    fn attributes_are_diffed() {
        let (memory, root) = setup();
        run(
            &root,
            vec![h("a", Props::new().with("href", "/x").with("title", "t"), vec![])],
        );
        run(&root, vec![h("a", Props::new().with("href", "/y"), vec![])]);

        let link = memory.children(memory.root())[0];
        assert_eq!(memory.attribute(link, "href").as_deref(), Some("/y"));
        assert_eq!(memory.attribute(link, "title"), None);
    }

    #[test]
    fn consumed_node_is_mounted_as_copy() {
        let (memory, root) = setup();
        let shared = h("b", Props::new(), vec![text("x")]);

        run(&root, vec![h("div", Props::new(), vec![shared.clone()])]);
        run(
            &root,
            vec![
                h("div", Props::new(), vec![shared.clone()]),
                h("div", Props::new(), vec![shared.clone()]),
            ],
        );

        assert_eq!(
            memory.inner_markup(memory.root()),
            "<div><b>x</b></div><div><b>x</b></div>"
        );
    }

    #[test]
    fn fragment_children_are_flattened_into_parent() {
        let (memory, root) = setup();
        run(
            &root,
            vec![h(
                "ul",
                Props::new(),
                vec![fragment(vec![item("a"), item("b")]), item("c")],
            )],
        );
        assert_eq!(
            memory.inner_markup(memory.root()),
            "<ul><li>a</li><li>b</li><li>c</li></ul>"
        );

        run(
            &root,
            vec![h(
                "ul",
                Props::new(),
                vec![fragment(vec![item("b"), item("a"), item("z")]), item("c")],
            )],
        );
        assert_eq!(
            memory.inner_markup(memory.root()),
            "<ul><li>b</li><li>a</li><li>z</li><li>c</li></ul>"
        );
    }

    #[test]
    fn keyed_fragment_moves_as_unit() {
        let (memory, root) = setup();
        let pair = |k: &str| keyed_fragment(k, vec![text(k), text("!")]);

        run(&root, vec![pair("x"), pair("y")]);
        run(&root, vec![pair("y"), pair("x")]);

        assert_eq!(memory.inner_markup(memory.root()), "y!x!");
    }

    #[test]
    fn clearing_children_unmounts_all() {
        let (memory, root) = setup();
        run(&root, vec![item("a"), item("b")]);
        let old = memory.children(memory.root());

        assert!(run(&root, Vec::new()));
        assert!(memory.children(memory.root()).is_empty());
        assert!(old.iter().all(|node| memory.parent(*node).is_none()));
    }

    #[test]
    fn insert_hooks_fire_after_attach() {
        let (memory, root) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let outer_seen = seen.clone();
        let inner_seen = seen.clone();
        let probe = memory.clone();

        let inner = h(
            "i",
            Props::new().hook(Hooks::new().on_insert(move |_| inner_seen.borrow_mut().push("inner"))),
            vec![],
        );
        let outer = h(
            "div",
            Props::new().hook(Hooks::new().on_insert(move |_| {
                let attached = probe.children(probe.root()).len();
                outer_seen.borrow_mut().push(if attached == 1 { "outer" } else { "detached" });
            })),
            vec![inner],
        );

        run(&root, vec![outer]);
        assert_eq!(*seen.borrow(), vec!["inner", "outer"]);
    }
}
