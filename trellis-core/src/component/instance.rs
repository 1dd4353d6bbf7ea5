//! Component Instance
//!
//! A component is a setup function run once per instance. Setup receives the
//! instance's reactive props, may register lifecycle callbacks, contexts and
//! async values, and returns the render function. Every render runs inside
//! the instance's [`Observer`], so the instance re-renders exactly when a
//! field it read changes.
//!
//! # Lifecycle
//!
//! `Constructing -> Mounted -> Unmounted`. The first render happens
//! synchronously during mount. Later renders are observer re-runs and go
//! through the scheduler; each one reconciles against the previous output
//! and resyncs real child order upward when membership or order changed.
//!
//! # Parent chain
//!
//! The parent is the nearest mounted component above this one in the render
//! tree, falling back to the component that created the node. It is a weak
//! reference used for context lookup and async relay only.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::context::ContextId;
use super::scope::{current_component, ComponentScope};
use super::{RenderFn, Setup};
use crate::error::{Error, Result};
use crate::reactive::{Observer, ReactiveState, SubscriberId, Value};
use crate::suspense::{AsyncHandle, AsyncListener};
use crate::vdom::{claim, reconcile, HostNodes, MountCx, NodeKind, Props, VNode, WeakVNode};

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Constructing,
    Mounted,
    Unmounted,
}

type Callback = Box<dyn FnOnce()>;

/// A mounted component.
pub struct ComponentInstance {
    setup: Setup,
    parent: Option<Weak<ComponentInstance>>,
    contexts: RefCell<Option<HashMap<ContextId, Rc<dyn Any>>>>,
    on_mounts: RefCell<Vec<Callback>>,
    on_cleanups: RefCell<Vec<Callback>>,
    async_listener: RefCell<Option<AsyncListener>>,
    props: ReactiveState,
    observer: Observer,
    render: RefCell<Option<RenderFn>>,
    output: RefCell<Vec<VNode>>,
    node: WeakVNode,
    state: Cell<InstanceState>,
}

impl ComponentInstance {
    pub(crate) fn new(
        setup: Setup,
        props: &Props,
        children: Vec<VNode>,
        parent: Option<Rc<ComponentInstance>>,
        node: WeakVNode,
    ) -> Rc<Self> {
        let seed = props
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .chain(std::iter::once((String::from("children"), Value::Nodes(children))));

        Rc::new_cyclic(|weak: &Weak<ComponentInstance>| {
            let target = weak.clone();
            let observer = Observer::new(move || {
                if let Some(instance) = target.upgrade() {
                    instance.rerender();
                }
            });

            ComponentInstance {
                setup,
                parent: parent.as_ref().map(Rc::downgrade),
                contexts: RefCell::new(None),
                on_mounts: RefCell::new(Vec::new()),
                on_cleanups: RefCell::new(Vec::new()),
                async_listener: RefCell::new(None),
                props: ReactiveState::new(seed),
                observer,
                render: RefCell::new(None),
                output: RefCell::new(Vec::new()),
                node,
                state: Cell::new(InstanceState::Constructing),
            }
        })
    }

    pub fn id(&self) -> SubscriberId {
        self.observer.id()
    }

    pub fn props(&self) -> &ReactiveState {
        &self.props
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn parent(&self) -> Option<Rc<ComponentInstance>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn state(&self) -> InstanceState {
        self.state.get()
    }

    /// The nodes produced by the latest render.
    pub fn output(&self) -> Vec<VNode> {
        self.output.borrow().clone()
    }

    /// The component node this instance renders for.
    pub fn node(&self) -> Option<VNode> {
        self.node.upgrade()
    }

    /// Run setup and the first render.
    fn initialize(self: &Rc<Self>) -> Result<Vec<VNode>> {
        let _scope = ComponentScope::enter(self.clone());
        let render = (self.setup)(&self.props)?;
        let nodes = self.execute(&render);
        *self.render.borrow_mut() = Some(render);
        Ok(nodes)
    }

    fn execute(&self, render: &RenderFn) -> Vec<VNode> {
        let _tracking = self.observer.observe();
        render().into_nodes()
    }

    /// Re-render after a tracked field changed.
    fn rerender(self: &Rc<Self>) {
        if self.state.get() != InstanceState::Mounted {
            return;
        }
        let Some(node) = self.node() else {
            return;
        };
        let Some(host) = node.host() else {
            return;
        };

        let nodes = {
            let _scope = ComponentScope::enter(self.clone());
            let render = self.render.borrow();
            let Some(render) = render.as_ref() else {
                return;
            };
            self.execute(render)
        };

        let mut cx = MountCx::new(host);
        let previous = std::mem::take(&mut *self.output.borrow_mut());
        let reconciled = reconcile(&node, previous, nodes, &mut cx);
        *self.output.borrow_mut() = reconciled.children;

        if reconciled.structural {
            node.request_resync();
        }

        tracing::trace!(instance = %self.id(), structural = reconciled.structural, "component re-rendered");
        if let Err(err) = cx.commit() {
            tracing::error!(instance = %self.id(), error = %err, "component re-render failed");
        }
    }

    pub(crate) fn add_mount(&self, callback: Callback) {
        self.on_mounts.borrow_mut().push(callback);
    }

    pub(crate) fn add_cleanup(&self, callback: Callback) {
        self.on_cleanups.borrow_mut().push(callback);
    }

    pub(crate) fn set_async_listener(&self, listener: AsyncListener) {
        *self.async_listener.borrow_mut() = Some(listener);
    }

    /// Fire mount callbacks. Each runs once.
    pub(crate) fn run_mounts(&self) {
        let callbacks = std::mem::take(&mut *self.on_mounts.borrow_mut());
        for callback in callbacks {
            callback();
        }
    }

    /// Stop re-rendering, release the output and fire cleanup callbacks.
    pub(crate) fn teardown(&self, detach: bool) {
        if self.state.replace(InstanceState::Unmounted) == InstanceState::Unmounted {
            return;
        }
        self.observer.dispose();

        let output = std::mem::take(&mut *self.output.borrow_mut());
        for child in &output {
            child.unmount(detach);
        }

        let callbacks = std::mem::take(&mut *self.on_cleanups.borrow_mut());
        for callback in callbacks {
            callback();
        }
        tracing::trace!(instance = %self.id(), "component torn down");
    }

    pub(crate) fn provide(&self, id: ContextId, value: Rc<dyn Any>) {
        self.contexts
            .borrow_mut()
            .get_or_insert_with(HashMap::new)
            .insert(id, value);
    }

    /// Look `id` up here, then in each ancestor.
    pub(crate) fn lookup(&self, id: ContextId) -> Option<Rc<dyn Any>> {
        let local = self
            .contexts
            .borrow()
            .as_ref()
            .and_then(|contexts| contexts.get(&id).cloned());
        local.or_else(|| self.parent().and_then(|parent| parent.lookup(id)))
    }

    /// Hand `handle` to the nearest boundary, starting with this instance.
    pub(crate) fn notify_async(&self, handle: AsyncHandle) -> Result<()> {
        let listener = self.async_boundary().ok_or(Error::NoBoundary)?;
        listener(handle);
        Ok(())
    }

    pub(crate) fn async_boundary(&self) -> Option<AsyncListener> {
        let local = self.async_listener.borrow().clone();
        local.or_else(|| self.parent().and_then(|parent| parent.async_boundary()))
    }

    /// Write incoming props into the existing container.
    ///
    /// Only fields whose value changed are written, so only their
    /// subscribers re-run. Fields absent at construction are ignored.
    pub(crate) fn receive(&self, props: &Props, children: Vec<VNode>) {
        let incoming = props
            .iter()
            .map(|(name, value)| (name, value.clone()))
            .chain(std::iter::once(("children", Value::Nodes(children))));

        for (name, value) in incoming {
            match self.props.peek(name) {
                Ok(current) if Value::same(&current, &value) => {}
                Ok(_) => {
                    if let Err(err) = self.props.set(name, value) {
                        tracing::error!(instance = %self.id(), error = %err, "prop write failed");
                    }
                }
                Err(_) => {
                    tracing::debug!(instance = %self.id(), prop = name, "ignoring prop not present at construction");
                }
            }
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id())
            .field("state", &self.state.get())
            .field("props", &self.props)
            .field("output", &self.output.borrow().len())
            .finish()
    }
}

/// Mount a component node: construct, run setup and first render, then
/// mount the output beneath the node.
pub(crate) fn mount_node(node: &VNode, cx: &mut MountCx) -> HostNodes {
    let Some((setup, props, children, owner)) = (match &*node.kind() {
        NodeKind::Component(slot) => Some((
            slot.setup,
            slot.props.clone(),
            slot.children.clone(),
            slot.owner.clone(),
        )),
        _ => None,
    }) else {
        return HostNodes::new();
    };

    let parent = node
        .enclosing_instance()
        .or_else(|| owner.and_then(|owner| owner.upgrade()))
        .or_else(current_component);

    let instance = ComponentInstance::new(setup, &props, children, parent, node.downgrade());
    node.set_instance(instance.clone());

    let rendered = match instance.initialize() {
        Ok(nodes) => nodes,
        Err(err) => {
            tracing::error!(instance = %instance.id(), error = %err, "component setup failed");
            cx.fail(err);
            Vec::new()
        }
    };

    let mut host_nodes = HostNodes::new();
    let mut output = Vec::with_capacity(rendered.len());
    for child in rendered {
        let child = claim(child);
        host_nodes.extend(child.mount(node, cx));
        output.push(child);
    }

    *instance.output.borrow_mut() = output;
    instance.state.set(InstanceState::Mounted);
    cx.queue_insert(node.clone());

    tracing::trace!(instance = %instance.id(), "component mounted");
    host_nodes
}

/// Propagate a compatible successor's props into the mounted instance.
pub(crate) fn patch_node(node: &VNode, next: &VNode) {
    let Some((props, children)) = (match &*next.kind() {
        NodeKind::Component(slot) => Some((slot.props.clone(), slot.children.clone())),
        _ => None,
    }) else {
        return;
    };

    if let Some(instance) = node.instance() {
        instance.receive(&props, children.clone());
    }
    node.replace_arguments(props, children);
}
