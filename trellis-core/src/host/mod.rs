//! Rendering Target Interface
//!
//! The reconciler never touches a concrete output surface directly. It talks
//! to a [`Host`]: a narrow, object-safe set of primitive operations (create a
//! node, set an attribute, order children, listen for events). Host nodes are
//! opaque [`HostNode`] handles issued by the host.
//!
//! [`MemoryHost`] is an in-memory display tree implementing the interface.

mod memory;

use std::cell::Cell;
use std::fmt;

use crate::reactive::{Handler, Value};

pub use memory::MemoryHost;

/// Opaque handle to a node owned by a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNode(u64);

impl HostNode {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// Listener phase, as in DOM event dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs top-down before the target's own handlers.
    Capture,
    /// Runs at the target and then bottom-up.
    Bubble,
}

/// An event travelling through a host tree.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    target: HostNode,
    stopped: Cell<bool>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: HostNode) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            stopped: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> HostNode {
        self.target
    }

    /// Stop the event from reaching further nodes.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Primitive operations of a rendering target.
pub trait Host {
    /// Create a detached element node.
    fn create_element(&self, tag: &str) -> HostNode;

    /// Create a detached text node.
    fn create_text(&self, text: &str) -> HostNode;

    /// Replace the content of a text node.
    fn set_text(&self, node: HostNode, text: &str);

    /// Set or replace an attribute. Handler values become event handlers.
    fn set_attribute(&self, node: HostNode, name: &str, value: &Value);

    fn remove_attribute(&self, node: HostNode, name: &str);

    /// Make `children` the exact, ordered child list of `parent`, moving
    /// nodes that are attached elsewhere.
    fn replace_children(&self, parent: HostNode, children: &[HostNode]);

    /// Detach `node` from its parent, if any.
    fn remove(&self, node: HostNode);

    fn add_event_listener(&self, node: HostNode, event_type: &str, phase: Phase, listener: Handler);
}
