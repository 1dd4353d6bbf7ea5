//! Node factory functions.
//!
//! Props carry two reserved keys: `key` becomes the node's reconciliation
//! key and `hook` its [`Hooks`]. Both are stripped before the remaining
//! entries reach an element's attributes or a component's props.

use std::rc::Rc;

use indexmap::IndexMap;

use super::hooks::Hooks;
use super::node::{ComponentSlot, Key, NodeKind, VNode};
use crate::component::{current_component, Setup};
use crate::reactive::Value;

const KEY: &str = "key";
const HOOK: &str = "hook";

/// Ordered name/value pairs handed to a factory function.
#[derive(Clone, Default, Debug)]
pub struct Props {
    entries: IndexMap<Rc<str>, Value>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.entries.insert(Rc::from(name), value.into());
        self
    }

    /// Set the reconciliation key.
    pub fn key(self, key: impl Into<Value>) -> Self {
        self.with(KEY, key)
    }

    /// Attach lifecycle hooks.
    pub fn hook(self, hooks: Hooks) -> Self {
        self.with(HOOK, Value::opaque(hooks))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (&**name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Split off the reserved entries.
    fn into_parts(mut self) -> (IndexMap<Rc<str>, Value>, Option<Key>, Hooks) {
        let key = self.entries.shift_remove(KEY).and_then(|value| match value {
            Value::Str(s) => Some(s),
            Value::Null => None,
            other => other.to_attribute_string().map(Rc::from),
        });
        let hooks = self
            .entries
            .shift_remove(HOOK)
            .and_then(|value| value.downcast::<Hooks>())
            .map(|hooks| (*hooks).clone())
            .unwrap_or_default();
        (self.entries, key, hooks)
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Props::new(), |props, (name, value)| props.with(name.as_ref(), value))
    }
}

/// An element node.
pub fn h(tag: &str, props: Props, children: Vec<VNode>) -> VNode {
    let (attributes, key, hooks) = props.into_parts();
    VNode::new(
        NodeKind::Element {
            tag: Rc::from(tag),
            attributes,
            children,
            elm: None,
        },
        key,
        hooks,
    )
}

/// A text node.
pub fn text(content: impl AsRef<str>) -> VNode {
    VNode::new(
        NodeKind::Text {
            text: Rc::from(content.as_ref()),
            elm: None,
        },
        None,
        Hooks::default(),
    )
}

/// An unkeyed fragment.
pub fn fragment(children: Vec<VNode>) -> VNode {
    fragment_with(Props::new(), children)
}

/// A fragment that reconciles as a unit under `key`.
pub fn keyed_fragment(key: impl Into<Value>, children: Vec<VNode>) -> VNode {
    fragment_with(Props::new().key(key), children)
}

/// A fragment with props. Only the reserved entries are used.
pub fn fragment_with(props: Props, children: Vec<VNode>) -> VNode {
    let (_, key, hooks) = props.into_parts();
    VNode::new(
        NodeKind::Fragment {
            children,
            hidden: false,
        },
        key,
        hooks,
    )
}

/// A fragment whose children stay mounted but show nothing.
pub(crate) fn hidden_fragment(key: &str, children: Vec<VNode>, hidden: bool) -> VNode {
    VNode::new(
        NodeKind::Fragment { children, hidden },
        Some(Rc::from(key)),
        Hooks::default(),
    )
}

/// A component node.
///
/// The component rendering this call, if any, is recorded as the node's
/// owner and serves as the parent instance when no mounted ancestor is
/// found.
pub fn component(setup: Setup, props: Props, children: Vec<VNode>) -> VNode {
    let (entries, key, hooks) = props.into_parts();
    let owner = current_component().map(|instance| Rc::downgrade(&instance));
    VNode::new(
        NodeKind::Component(ComponentSlot {
            setup,
            props: entries.into_iter().collect(),
            children,
            owner,
            instance: None,
        }),
        key,
        hooks,
    )
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
