//! Components
//!
//! A component is a plain function from reactive props to a render
//! function:
//!
//! ```rust,ignore
//! fn greeting(props: &ReactiveState) -> Result<RenderFn> {
//!     on_mount(|| tracing::info!("greeting mounted"))?;
//!     let props = props.clone();
//!     Ok(render_fn(move || {
//!         let name = props.get_str("name").unwrap_or_else(|_| "world".into());
//!         h("p", Props::new(), vec![text(format!("hello {name}"))])
//!     }))
//! }
//!
//! render(component(greeting, Props::new().with("name", "trellis"), vec![]), &host, root)?;
//! ```
//!
//! Setup runs once per instance. The render function runs on mount and
//! again whenever a reactive field it read changes.

mod context;
mod instance;
mod lifecycle;
mod scope;

pub use context::Context;
pub use instance::{ComponentInstance, InstanceState};
pub use lifecycle::{on_async, on_cleanup, on_mount};
pub use scope::current_component;

pub(crate) use instance::{mount_node, patch_node};

use crate::error::Result;
use crate::reactive::ReactiveState;
use crate::vdom::VNode;

/// A component's setup function.
pub type Setup = fn(&ReactiveState) -> Result<RenderFn>;

/// A component's render function.
pub type RenderFn = Box<dyn Fn() -> Rendered>;

/// Output of one render: a single node or an ordered list.
#[derive(Debug, Clone, Default)]
pub struct Rendered(Vec<VNode>);

impl Rendered {
    pub fn into_nodes(self) -> Vec<VNode> {
        self.0
    }
}

impl From<VNode> for Rendered {
    fn from(node: VNode) -> Self {
        Rendered(vec![node])
    }
}

impl From<Vec<VNode>> for Rendered {
    fn from(nodes: Vec<VNode>) -> Self {
        Rendered(nodes)
    }
}

impl From<Option<VNode>> for Rendered {
    fn from(node: Option<VNode>) -> Self {
        Rendered(node.into_iter().collect())
    }
}

/// Box a closure as a [`RenderFn`].
pub fn render_fn<R, F>(f: F) -> RenderFn
where
    R: Into<Rendered>,
    F: Fn() -> R + 'static,
{
    Box::new(move || f().into())
}

/// Whether two setup functions are the same function.
pub(crate) fn same_setup(a: Setup, b: Setup) -> bool {
    a as usize == b as usize
}
