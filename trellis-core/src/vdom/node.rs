//! Tree Nodes
//!
//! A [`VNode`] is a shared handle to one node of the render tree. The node
//! kind is a closed sum type, so mount, patch, unmount and the compatibility
//! predicate all match exhaustively.
//!
//! # Lifecycle
//!
//! `Fresh -> Mounted -> Unmounted`. A node is mounted at most once and
//! unmounted at most once. Patching keeps the mounted node and copies the
//! successor's data into it, so node identity, host nodes and component
//! instances survive. The reconciler never mounts a consumed node; it mounts
//! a structural copy instead.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::{smallvec, SmallVec};

use super::factory::Props;
use super::hooks::Hooks;
use super::reconcile::{claim, reconcile, MountCx};
use crate::component::{self, ComponentInstance, Setup};
use crate::host::{Host, HostNode};
use crate::reactive::Value;

/// Explicit reconciliation identity among siblings.
pub type Key = Rc<str>;

/// Real nodes contributed by one mount.
pub(crate) type HostNodes = SmallVec<[HostNode; 1]>;

/// The node variants, without their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Root,
    Element,
    Text,
    Fragment,
    Component,
}

/// Where a node is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Fresh,
    Mounted,
    Unmounted,
}

pub(crate) struct ComponentSlot {
    pub(crate) setup: Setup,
    pub(crate) props: Props,
    pub(crate) children: Vec<VNode>,
    /// Component whose render created this node.
    pub(crate) owner: Option<Weak<ComponentInstance>>,
    pub(crate) instance: Option<Rc<ComponentInstance>>,
}

pub(crate) enum NodeKind {
    Root {
        target: HostNode,
        children: Vec<VNode>,
    },
    Element {
        tag: Rc<str>,
        attributes: IndexMap<Rc<str>, Value>,
        children: Vec<VNode>,
        elm: Option<HostNode>,
    },
    Text {
        text: Rc<str>,
        elm: Option<HostNode>,
    },
    Fragment {
        children: Vec<VNode>,
        /// Children stay mounted but contribute no host nodes.
        hidden: bool,
    },
    Component(ComponentSlot),
}

impl NodeKind {
    fn variant(&self) -> Variant {
        match self {
            NodeKind::Root { .. } => Variant::Root,
            NodeKind::Element { .. } => Variant::Element,
            NodeKind::Text { .. } => Variant::Text,
            NodeKind::Fragment { .. } => Variant::Fragment,
            NodeKind::Component(_) => Variant::Component,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<VNode>> {
        match self {
            NodeKind::Root { children, .. }
            | NodeKind::Element { children, .. }
            | NodeKind::Fragment { children, .. } => Some(children),
            NodeKind::Text { .. } | NodeKind::Component(_) => None,
        }
    }
}

pub(crate) struct NodeCell {
    key: Option<Key>,
    hooks: RefCell<Hooks>,
    lifecycle: Cell<Lifecycle>,
    parent: RefCell<Weak<NodeCell>>,
    host: RefCell<Option<Rc<dyn Host>>>,
    kind: RefCell<NodeKind>,
}

/// A node of the render tree.
#[derive(Clone)]
pub struct VNode(Rc<NodeCell>);

/// Non-owning reference to a [`VNode`].
#[derive(Clone, Default)]
pub(crate) struct WeakVNode(Weak<NodeCell>);

impl WeakVNode {
    pub(crate) fn upgrade(&self) -> Option<VNode> {
        self.0.upgrade().map(VNode)
    }
}

impl VNode {
    pub(crate) fn new(kind: NodeKind, key: Option<Key>, hooks: Hooks) -> Self {
        Self(Rc::new(NodeCell {
            key,
            hooks: RefCell::new(hooks),
            lifecycle: Cell::new(Lifecycle::Fresh),
            parent: RefCell::new(Weak::new()),
            host: RefCell::new(None),
            kind: RefCell::new(kind),
        }))
    }

    /// A mounted root over `target`.
    pub(crate) fn root(host: Rc<dyn Host>, target: HostNode) -> Self {
        let root = Self::new(
            NodeKind::Root {
                target,
                children: Vec::new(),
            },
            None,
            Hooks::default(),
        );
        *root.0.host.borrow_mut() = Some(host);
        root.0.lifecycle.set(Lifecycle::Mounted);
        root
    }

    pub fn key(&self) -> Option<Key> {
        self.0.key.clone()
    }

    pub fn variant(&self) -> Variant {
        self.0.kind.borrow().variant()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.0.lifecycle.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle() == Lifecycle::Mounted
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn tag(&self) -> Option<Rc<str>> {
        match &*self.kind() {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<Rc<str>> {
        match &*self.kind() {
            NodeKind::Text { text, .. } => Some(text.clone()),
            _ => None,
        }
    }

    /// Current value of an element attribute.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match &*self.kind() {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            _ => None,
        }
    }

    /// The component instance behind a mounted component node.
    pub fn instance(&self) -> Option<Rc<ComponentInstance>> {
        match &*self.kind() {
            NodeKind::Component(slot) => slot.instance.clone(),
            _ => None,
        }
    }

    /// Child nodes. For components, the instance's current output.
    pub fn children(&self) -> Vec<VNode> {
        let instance = match &*self.kind() {
            NodeKind::Root { children, .. }
            | NodeKind::Element { children, .. }
            | NodeKind::Fragment { children, .. } => return children.clone(),
            NodeKind::Text { .. } => return Vec::new(),
            NodeKind::Component(slot) => slot.instance.clone(),
        };
        instance.map(|i| i.output()).unwrap_or_default()
    }

    /// Real nodes this node owns or delegates to, in order.
    pub fn host_nodes(&self) -> Vec<HostNode> {
        let children = match &*self.kind() {
            NodeKind::Root { target, .. } => return vec![*target],
            NodeKind::Element { elm, .. } | NodeKind::Text { elm, .. } => {
                return elm.iter().copied().collect()
            }
            NodeKind::Fragment { hidden: true, .. } => return Vec::new(),
            NodeKind::Fragment { children, .. } => children.clone(),
            NodeKind::Component(_) => self.children(),
        };
        children.iter().flat_map(VNode::host_nodes).collect()
    }

    pub(crate) fn kind(&self) -> Ref<'_, NodeKind> {
        self.0.kind.borrow()
    }

    pub(crate) fn hooks(&self) -> Hooks {
        self.0.hooks.borrow().clone()
    }

    pub(crate) fn downgrade(&self) -> WeakVNode {
        WeakVNode(Rc::downgrade(&self.0))
    }

    pub(crate) fn parent(&self) -> Option<VNode> {
        self.0.parent.borrow().upgrade().map(VNode)
    }

    pub(crate) fn host(&self) -> Option<Rc<dyn Host>> {
        self.0.host.borrow().clone()
    }

    /// Nearest mounted component instance above this node.
    pub(crate) fn enclosing_instance(&self) -> Option<Rc<ComponentInstance>> {
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            if let Some(instance) = node.instance() {
                return Some(instance);
            }
            cursor = node.parent();
        }
        None
    }

    pub(crate) fn take_children(&self) -> Vec<VNode> {
        self.0
            .kind
            .borrow_mut()
            .children_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub(crate) fn set_children(&self, next: Vec<VNode>) {
        if let Some(children) = self.0.kind.borrow_mut().children_mut() {
            *children = next;
        }
    }

    /// Keep a component node's arguments current so copies see them.
    pub(crate) fn replace_arguments(&self, props: Props, children: Vec<VNode>) {
        if let NodeKind::Component(slot) = &mut *self.0.kind.borrow_mut() {
            slot.props = props;
            slot.children = children;
        }
    }

    pub(crate) fn set_instance(&self, instance: Rc<ComponentInstance>) {
        if let NodeKind::Component(slot) = &mut *self.0.kind.borrow_mut() {
            slot.instance = Some(instance);
        }
    }

    /// Materialize this node against `parent`.
    ///
    /// Returns the real nodes the caller must attach.
    pub(crate) fn mount(&self, parent: &VNode, cx: &mut MountCx) -> HostNodes {
        debug_assert_eq!(self.lifecycle(), Lifecycle::Fresh, "node mounted twice");

        *self.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
        *self.0.host.borrow_mut() = Some(cx.host().clone());
        self.0.lifecycle.set(Lifecycle::Mounted);

        let host = cx.host().clone();
        let mounted = match self.variant() {
            Variant::Text => {
                let elm = match &mut *self.0.kind.borrow_mut() {
                    NodeKind::Text { text, elm } => {
                        let node = host.create_text(text);
                        *elm = Some(node);
                        node
                    }
                    _ => unreachable!("variant checked above"),
                };
                smallvec![elm]
            }
            Variant::Element => {
                let elm = match &mut *self.0.kind.borrow_mut() {
                    NodeKind::Element {
                        tag,
                        attributes,
                        elm,
                        ..
                    } => {
                        let node = host.create_element(tag);
                        for (name, value) in attributes.iter().filter(|(_, value)| !value.is_null()) {
                            host.set_attribute(node, name, value);
                        }
                        *elm = Some(node);
                        node
                    }
                    _ => unreachable!("variant checked above"),
                };
                let nodes = self.mount_children(cx);
                host.replace_children(elm, &nodes);
                if self.0.hooks.borrow().insert.is_some() {
                    cx.queue_insert(self.clone());
                }
                smallvec![elm]
            }
            Variant::Fragment => {
                let nodes = self.mount_children(cx);
                if self.0.hooks.borrow().insert.is_some() {
                    cx.queue_insert(self.clone());
                }
                if self.is_hidden() {
                    HostNodes::new()
                } else {
                    nodes.into_iter().collect()
                }
            }
            Variant::Component => component::mount_node(self, cx),
            Variant::Root => {
                tracing::warn!("root nodes cannot be mounted as children");
                HostNodes::new()
            }
        };

        tracing::trace!(variant = ?self.variant(), host_nodes = mounted.len(), "mounted node");
        mounted
    }

    fn mount_children(&self, cx: &mut MountCx) -> Vec<HostNode> {
        let children = self.take_children();
        let mut nodes = Vec::new();
        let mut mounted = Vec::with_capacity(children.len());

        for child in children {
            let child = claim(child);
            nodes.extend(child.mount(self, cx));
            mounted.push(child);
        }

        self.set_children(mounted);
        nodes
    }

    fn is_hidden(&self) -> bool {
        matches!(&*self.kind(), NodeKind::Fragment { hidden: true, .. })
    }

    /// Update this mounted node in place from a compatible successor.
    ///
    /// Returns true when the real nodes this node contributes to its parent
    /// changed order or membership.
    pub(crate) fn patch(&self, next: &VNode, cx: &mut MountCx) -> bool {
        if self.ptr_eq(next) {
            return false;
        }

        let hooks = next.hooks();
        if let Some(prepatch) = &hooks.prepatch {
            prepatch(self, next);
        }

        let structural = match self.variant() {
            Variant::Element => self.patch_element(next, cx),
            Variant::Text => {
                self.patch_text(next);
                false
            }
            Variant::Fragment => self.patch_fragment(next, cx),
            Variant::Component => {
                component::patch_node(self, next);
                false
            }
            Variant::Root => false,
        };

        *self.0.hooks.borrow_mut() = hooks.clone();
        if let Some(postpatch) = &hooks.postpatch {
            postpatch(self, next);
        }

        tracing::trace!(variant = ?self.variant(), structural, "patched node");
        structural
    }

    fn patch_text(&self, next: &VNode) {
        let next_text = match next.text() {
            Some(text) => text,
            None => return,
        };

        let host = self.host();
        if let NodeKind::Text { text, elm } = &mut *self.0.kind.borrow_mut() {
            if *text != next_text {
                if let (Some(host), Some(elm)) = (host, *elm) {
                    host.set_text(elm, &next_text);
                }
                *text = next_text;
            }
        }
    }

    fn patch_element(&self, next: &VNode, cx: &mut MountCx) -> bool {
        let (next_attributes, next_children) = match &*next.kind() {
            NodeKind::Element {
                attributes,
                children,
                ..
            } => (attributes.clone(), children.clone()),
            _ => return false,
        };

        let host = cx.host().clone();
        let elm = match &mut *self.0.kind.borrow_mut() {
            NodeKind::Element {
                attributes, elm, ..
            } => {
                if let Some(elm) = *elm {
                    for (name, value) in &next_attributes {
                        let current = attributes.get(name);
                        if current.is_some_and(|current| Value::same(current, value)) {
                            continue;
                        }
                        // Null means absent.
                        if !value.is_null() {
                            host.set_attribute(elm, name, value);
                        } else if current.is_some() {
                            host.remove_attribute(elm, name);
                        }
                    }
                    for (name, value) in attributes.iter() {
                        if !value.is_null() && !next_attributes.contains_key(name) {
                            host.remove_attribute(elm, name);
                        }
                    }
                }
                *attributes = next_attributes;
                *elm
            }
            _ => return false,
        };

        let previous = self.take_children();
        let reconciled = reconcile(self, previous, next_children, cx);
        self.set_children(reconciled.children);

        if reconciled.structural {
            if let Some(elm) = elm {
                self.resync_into(&host, elm);
            }
        }
        false
    }

    fn patch_fragment(&self, next: &VNode, cx: &mut MountCx) -> bool {
        let (next_children, next_hidden) = match &*next.kind() {
            NodeKind::Fragment { children, hidden } => (children.clone(), *hidden),
            _ => return false,
        };

        let previous = self.take_children();
        let reconciled = reconcile(self, previous, next_children, cx);
        self.set_children(reconciled.children);

        let visibility_changed = match &mut *self.0.kind.borrow_mut() {
            NodeKind::Fragment { hidden, .. } => std::mem::replace(hidden, next_hidden) != next_hidden,
            _ => false,
        };

        // A hidden fragment's reordering is invisible to the parent.
        visibility_changed || (reconciled.structural && !next_hidden)
    }

    /// Release this node and everything below it.
    ///
    /// With `detach` set, the node's own real node is removed from its
    /// parent; descendants of a removed real node are not detached
    /// individually.
    pub(crate) fn unmount(&self, detach: bool) {
        if self.lifecycle() != Lifecycle::Mounted {
            tracing::trace!(lifecycle = ?self.lifecycle(), "skipping unmount of unmounted node");
            return;
        }
        self.0.lifecycle.set(Lifecycle::Unmounted);

        match self.variant() {
            Variant::Element => {
                for child in self.children() {
                    child.unmount(false);
                }
                self.detach(detach);
            }
            Variant::Text => self.detach(detach),
            Variant::Fragment => {
                for child in self.children() {
                    child.unmount(detach);
                }
            }
            Variant::Root => {
                for child in self.children() {
                    child.unmount(true);
                }
            }
            Variant::Component => {
                if let Some(instance) = self.instance() {
                    instance.teardown(detach);
                }
            }
        }

        let destroy = self.0.hooks.borrow().destroy.clone();
        if let Some(destroy) = destroy {
            destroy(self);
        }
        tracing::trace!(variant = ?self.variant(), "unmounted node");
    }

    fn detach(&self, detach: bool) {
        if !detach {
            return;
        }
        let elm = match &*self.kind() {
            NodeKind::Element { elm, .. } | NodeKind::Text { elm, .. } => *elm,
            _ => None,
        };
        if let (Some(host), Some(elm)) = (self.host(), elm) {
            host.remove(elm);
        }
    }

    /// Re-apply child ordering at the nearest node that owns a real node.
    ///
    /// Fragments and components own none, so they forward upward.
    pub(crate) fn request_resync(&self) {
        let target = match &*self.kind() {
            NodeKind::Root { target, .. } => Some(*target),
            NodeKind::Element { elm, .. } => *elm,
            NodeKind::Fragment { hidden: true, .. } => return,
            NodeKind::Text { .. } | NodeKind::Fragment { .. } | NodeKind::Component(_) => None,
        };

        match (target, self.host()) {
            (Some(target), Some(host)) => self.resync_into(&host, target),
            _ => {
                if let Some(parent) = self.parent() {
                    parent.request_resync();
                }
            }
        }
    }

    pub(crate) fn resync_into(&self, host: &Rc<dyn Host>, target: HostNode) {
        let nodes: Vec<HostNode> = self.children().iter().flat_map(VNode::host_nodes).collect();
        tracing::trace!(%target, children = nodes.len(), "resyncing child order");
        host.replace_children(target, &nodes);
    }

    /// A fresh, unmounted copy of this node's description.
    pub(crate) fn fresh_copy(&self) -> VNode {
        let kind = match &*self.kind() {
            NodeKind::Element {
                tag,
                attributes,
                children,
                ..
            } => NodeKind::Element {
                tag: tag.clone(),
                attributes: attributes.clone(),
                children: children.iter().map(VNode::fresh_copy).collect(),
                elm: None,
            },
            NodeKind::Text { text, .. } => NodeKind::Text {
                text: text.clone(),
                elm: None,
            },
            NodeKind::Fragment { children, hidden } => NodeKind::Fragment {
                children: children.iter().map(VNode::fresh_copy).collect(),
                hidden: *hidden,
            },
            NodeKind::Component(slot) => NodeKind::Component(ComponentSlot {
                setup: slot.setup,
                props: slot.props.clone(),
                children: slot.children.clone(),
                owner: slot.owner.clone(),
                instance: None,
            }),
            // Roots are never children, so they are never claimed.
            NodeKind::Root { children, .. } => NodeKind::Fragment {
                children: children.iter().map(VNode::fresh_copy).collect(),
                hidden: false,
            },
        };
        VNode::new(kind, self.key(), self.hooks())
    }
}

/// Whether `next` can be patched into `prev`.
///
/// Same variant, plus the same tag for elements and the same setup function
/// for components.
pub fn compatible(prev: &VNode, next: &VNode) -> bool {
    match (&*prev.kind(), &*next.kind()) {
        (NodeKind::Element { tag: a, .. }, NodeKind::Element { tag: b, .. }) => a == b,
        (NodeKind::Component(a), NodeKind::Component(b)) => component::same_setup(a.setup, b.setup),
        (NodeKind::Text { .. }, NodeKind::Text { .. })
        | (NodeKind::Fragment { .. }, NodeKind::Fragment { .. })
        | (NodeKind::Root { .. }, NodeKind::Root { .. }) => true,
        _ => false,
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VNode");
        s.field("variant", &self.variant());
        if let Some(key) = &self.0.key {
            s.field("key", key);
        }
        if let Some(tag) = self.tag() {
            s.field("tag", &tag);
        }
        if let Some(text) = self.text() {
            s.field("text", &text);
        }
        s.field("lifecycle", &self.lifecycle()).finish()
    }
}
