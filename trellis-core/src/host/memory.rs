//! In-memory display tree.
//!
//! Nodes live in an arena indexed by [`HostNode`]. Dispatch follows the DOM
//! model: capture listeners run from the top of the tree down to the target,
//! then element handlers and bubble listeners run from the target up.

use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Event, Host, HostNode, Phase};
use crate::reactive::{Handler, Value};

#[derive(Debug)]
enum Content {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        handlers: IndexMap<String, Handler>,
    },
    Text(String),
}

#[derive(Debug)]
struct Slot {
    content: Content,
    parent: Option<HostNode>,
    children: Vec<HostNode>,
    listeners: Vec<(String, Phase, Handler)>,
}

/// An in-memory [`Host`].
#[derive(Debug)]
pub struct MemoryHost {
    slots: RefCell<Vec<Slot>>,
    root: HostNode,
    created: Cell<usize>,
}

impl MemoryHost {
    /// Create a host with a single `root` element.
    pub fn new() -> Rc<Self> {
        let host = Self {
            slots: RefCell::new(Vec::new()),
            root: HostNode::from_raw(0),
            created: Cell::new(0),
        };
        host.alloc(Content::Element {
            tag: "root".into(),
            attributes: IndexMap::new(),
            handlers: IndexMap::new(),
        });
        host.created.set(0);
        Rc::new(host)
    }

    /// The root element.
    pub fn root(&self) -> HostNode {
        self.root
    }

    /// Number of nodes created since construction, excluding the root.
    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.with_slot(node, |slot| slot.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: HostNode) -> Option<HostNode> {
        self.with_slot(node, |slot| slot.parent).flatten()
    }

    pub fn tag(&self, node: HostNode) -> Option<String> {
        self.with_slot(node, |slot| match &slot.content {
            Content::Element { tag, .. } => Some(tag.clone()),
            Content::Text(_) => None,
        })
        .flatten()
    }

    pub fn text(&self, node: HostNode) -> Option<String> {
        self.with_slot(node, |slot| match &slot.content {
            Content::Text(text) => Some(text.clone()),
            Content::Element { .. } => None,
        })
        .flatten()
    }

    pub fn attribute(&self, node: HostNode, name: &str) -> Option<String> {
        self.with_slot(node, |slot| match &slot.content {
            Content::Element { attributes, .. } => attributes.get(name).cloned(),
            Content::Text(_) => None,
        })
        .flatten()
    }

    /// First attached element, in document order, whose `name` attribute
    /// equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<HostNode> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.attribute(node, name).as_deref() == Some(value) {
                return Some(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        None
    }

    /// Compact markup of `node` and its subtree.
    pub fn serialize(&self, node: HostNode) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Compact markup of the children of `node`.
    pub fn inner_markup(&self, node: HostNode) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Dispatch an event of `event_type` at `target`.
    pub fn dispatch(&self, target: HostNode, event_type: &str) {
        let event = Event::new(event_type, target);

        let mut path = vec![target];
        let mut cursor = self.parent(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.parent(node);
        }

        tracing::trace!(%target, event_type, depth = path.len(), "dispatching event");

        for &node in path.iter().rev() {
            for listener in self.listeners(node, event_type, Phase::Capture) {
                listener.call(&event);
            }
            if event.is_propagation_stopped() {
                return;
            }
        }

        for &node in &path {
            if let Some(handler) = self.handler(node, event_type) {
                handler.call(&event);
            }
            for listener in self.listeners(node, event_type, Phase::Bubble) {
                listener.call(&event);
            }
            if event.is_propagation_stopped() {
                return;
            }
        }
    }

    fn alloc(&self, content: Content) -> HostNode {
        let mut slots = self.slots.borrow_mut();
        let node = HostNode::from_raw(slots.len() as u64);
        slots.push(Slot {
            content,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        self.created.set(self.created.get() + 1);
        node
    }

    fn with_slot<R>(&self, node: HostNode, f: impl FnOnce(&Slot) -> R) -> Option<R> {
        self.slots.borrow().get(node.raw() as usize).map(f)
    }

    fn with_slot_mut<R>(&self, node: HostNode, f: impl FnOnce(&mut Slot) -> R) -> Option<R> {
        self.slots.borrow_mut().get_mut(node.raw() as usize).map(f)
    }

    fn listeners(&self, node: HostNode, event_type: &str, phase: Phase) -> Vec<Handler> {
        self.with_slot(node, |slot| {
            slot.listeners
                .iter()
                .filter(|(ty, p, _)| ty == event_type && *p == phase)
                .map(|(_, _, handler)| handler.clone())
                .collect()
        })
        .unwrap_or_default()
    }

    fn handler(&self, node: HostNode, event_type: &str) -> Option<Handler> {
        self.with_slot(node, |slot| match &slot.content {
            Content::Element { handlers, .. } => handlers.get(event_type).cloned(),
            Content::Text(_) => None,
        })
        .flatten()
    }

    fn detach(slots: &mut [Slot], node: HostNode) {
        let index = node.raw() as usize;
        if let Some(parent) = slots.get_mut(index).and_then(|slot| slot.parent.take()) {
            if let Some(parent_slot) = slots.get_mut(parent.raw() as usize) {
                parent_slot.children.retain(|child| *child != node);
            }
        }
    }

    fn write_node(&self, node: HostNode, out: &mut String) {
        let (open, close) = match self.with_slot(node, |slot| match &slot.content {
            Content::Text(text) => (text.clone(), None),
            Content::Element {
                tag, attributes, ..
            } => {
                let mut open = format!("<{tag}");
                for (name, value) in attributes {
                    let _ = write!(open, " {name}=\"{value}\"");
                }
                open.push('>');
                (open, Some(format!("</{tag}>")))
            }
        }) {
            Some(parts) => parts,
            None => return,
        };

        out.push_str(&open);
        if let Some(close) = close {
            for child in self.children(node) {
                self.write_node(child, out);
            }
            out.push_str(&close);
        }
    }
}

fn event_name(attribute: &str) -> Option<String> {
    attribute
        .strip_prefix("on")
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.trim_start_matches(':').to_ascii_lowercase())
}

impl Host for MemoryHost {
    fn create_element(&self, tag: &str) -> HostNode {
        self.alloc(Content::Element {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            handlers: IndexMap::new(),
        })
    }

    fn create_text(&self, text: &str) -> HostNode {
        self.alloc(Content::Text(text.to_string()))
    }

    fn set_text(&self, node: HostNode, text: &str) {
        self.with_slot_mut(node, |slot| {
            if let Content::Text(current) = &mut slot.content {
                *current = text.to_string();
            }
        });
    }

    fn set_attribute(&self, node: HostNode, name: &str, value: &Value) {
        self.with_slot_mut(node, |slot| {
            if let Content::Element {
                attributes,
                handlers,
                ..
            } = &mut slot.content
            {
                match (value, event_name(name)) {
                    (Value::Handler(handler), Some(event)) => {
                        handlers.insert(event, handler.clone());
                    }
                    _ => {
                        if let Some(text) = value.to_attribute_string() {
                            attributes.insert(name.to_string(), text);
                        }
                    }
                }
            }
        });
    }

    fn remove_attribute(&self, node: HostNode, name: &str) {
        self.with_slot_mut(node, |slot| {
            if let Content::Element {
                attributes,
                handlers,
                ..
            } = &mut slot.content
            {
                attributes.shift_remove(name);
                if let Some(event) = event_name(name) {
                    handlers.shift_remove(&event);
                }
            }
        });
    }

    fn replace_children(&self, parent: HostNode, children: &[HostNode]) {
        let mut slots = self.slots.borrow_mut();

        let previous = slots
            .get_mut(parent.raw() as usize)
            .map(|slot| std::mem::take(&mut slot.children))
            .unwrap_or_default();
        for child in previous {
            if let Some(slot) = slots.get_mut(child.raw() as usize) {
                slot.parent = None;
            }
        }

        for &child in children {
            Self::detach(&mut slots, child);
            if let Some(slot) = slots.get_mut(child.raw() as usize) {
                slot.parent = Some(parent);
            }
        }

        if let Some(slot) = slots.get_mut(parent.raw() as usize) {
            slot.children = children.to_vec();
        }
    }

    fn remove(&self, node: HostNode) {
        Self::detach(&mut self.slots.borrow_mut(), node);
    }

    fn add_event_listener(&self, node: HostNode, event_type: &str, phase: Phase, listener: Handler) {
        self.with_slot_mut(node, |slot| {
            slot.listeners.push((event_type.to_string(), phase, listener));
        });
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
