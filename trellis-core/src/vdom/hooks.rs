//! Per-node lifecycle hooks, passed through the reserved `hook` prop.

use std::fmt;
use std::rc::Rc;

use super::node::VNode;

pub type NodeHook = Rc<dyn Fn(&VNode)>;
pub type PatchHook = Rc<dyn Fn(&VNode, &VNode)>;

/// Callbacks fired at points in a node's lifecycle.
///
/// `insert` runs once after the node's real output is attached. `destroy`
/// runs once when the node is unmounted. `prepatch` and `postpatch` bracket
/// every in-place update and receive `(mounted, successor)`.
#[derive(Clone, Default)]
pub struct Hooks {
    pub insert: Option<NodeHook>,
    pub destroy: Option<NodeHook>,
    pub prepatch: Option<PatchHook>,
    pub postpatch: Option<PatchHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_insert(mut self, f: impl Fn(&VNode) + 'static) -> Self {
        self.insert = Some(Rc::new(f));
        self
    }

    pub fn on_destroy(mut self, f: impl Fn(&VNode) + 'static) -> Self {
        self.destroy = Some(Rc::new(f));
        self
    }

    pub fn on_prepatch(mut self, f: impl Fn(&VNode, &VNode) + 'static) -> Self {
        self.prepatch = Some(Rc::new(f));
        self
    }

    pub fn on_postpatch(mut self, f: impl Fn(&VNode, &VNode) + 'static) -> Self {
        self.postpatch = Some(Rc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.insert.is_none()
            && self.destroy.is_none()
            && self.prepatch.is_none()
            && self.postpatch.is_none()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("insert", &self.insert.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("prepatch", &self.prepatch.is_some())
            .field("postpatch", &self.postpatch.is_some())
            .finish()
    }
}
