//! Suspense boundary component.
//!
//! The boundary collects every async value declared beneath it. While any
//! of them is not resolved it shows its `fallback` prop; once all are
//! resolved it shows its children. A rejected value keeps the fallback up.
//!
//! Children stay mounted while the fallback is shown, inside a fragment
//! that contributes no real nodes. Declaring components therefore keep
//! their instances and their async values across the switch.

use crate::component::{on_async, render_fn, RenderFn};
use crate::error::Result;
use crate::reactive::{ReactiveState, Value};
use crate::vdom::{hidden_fragment, keyed_fragment, VNode};

use super::value::AsyncHandle;

const SUSPENDING: &str = "suspending";

/// The boundary's setup function. Props: `fallback` (nodes) and children.
///
/// ```rust,ignore
/// component(suspense, Props::new().with("fallback", text("loading")), vec![component(profile, Props::new(), vec![])])
/// ```
pub fn suspense(props: &ReactiveState) -> Result<RenderFn> {
    let state = ReactiveState::new([(SUSPENDING, Value::opaque(Vec::<AsyncHandle>::new()))]);

    let collector = state.clone();
    on_async(move |handle| {
        let mut suspending = collector
            .peek(SUSPENDING)
            .ok()
            .and_then(|value| value.downcast::<Vec<AsyncHandle>>())
            .map(|list| (*list).clone())
            .unwrap_or_default();
        suspending.push(handle);

        tracing::debug!(pending = suspending.len(), "suspense boundary received async value");
        if let Err(err) = collector.set(SUSPENDING, Value::opaque(suspending)) {
            tracing::error!(error = %err, "suspense boundary could not record async value");
        }
    })?;

    let props = props.clone();
    Ok(render_fn(move || {
        let ready = state
            .get_opaque::<Vec<AsyncHandle>>(SUSPENDING)
            .map(|suspending| suspending.iter().filter(|handle| !handle.is_resolved()).count() == 0)
            .unwrap_or(true);

        let children = nodes(&props, "children");
        let mut output = vec![hidden_fragment("content", children, !ready)];
        if !ready {
            output.push(keyed_fragment("fallback", nodes(&props, "fallback")));
        }
        output
    }))
}

fn nodes(props: &ReactiveState, name: &str) -> Vec<VNode> {
    props
        .get(name)
        .ok()
        .and_then(|value| value.as_nodes().map(<[VNode]>::to_vec))
        .unwrap_or_default()
}
