//! Render Tree
//!
//! Declarative node descriptions, their materialization into a [`Host`]
//! and keyed reconciliation between successive descriptions.
//!
//! - [`h`], [`text`], [`fragment`] and [`component`] build fresh nodes.
//! - [`render`] mounts or reconciles a tree into a host target.
//! - Component re-renders reconcile the component's own subtree and resync
//!   real child order at the nearest ancestor that owns a real node.
//!
//! [`Host`]: crate::host::Host

mod factory;
mod hooks;
mod node;
mod reconcile;
mod render;

pub use factory::{component, fragment, fragment_with, h, keyed_fragment, text, Props};
pub use hooks::{Hooks, NodeHook, PatchHook};
pub use node::{compatible, Key, Lifecycle, VNode, Variant};
pub use render::{render, rendered, unmount};

pub(crate) use factory::hidden_fragment;
pub(crate) use node::{HostNodes, NodeKind, WeakVNode};
pub(crate) use reconcile::{claim, reconcile, MountCx};
