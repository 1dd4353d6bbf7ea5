//! Setup-only lifecycle registration.
//!
//! Each function attaches a callback to the component currently running
//! setup and fails with [`Error::OutsideSetup`] when there is none.

use std::rc::Rc;

use super::scope::current_component;
use crate::error::{Error, Result};
use crate::suspense::AsyncHandle;

/// Run `f` once, after the component's output is attached.
pub fn on_mount(f: impl FnOnce() + 'static) -> Result<()> {
    let instance = current_component().ok_or_else(|| Error::outside_setup("on_mount"))?;
    instance.add_mount(Box::new(f));
    Ok(())
}

/// Run `f` once, when the component is torn down.
pub fn on_cleanup(f: impl FnOnce() + 'static) -> Result<()> {
    let instance = current_component().ok_or_else(|| Error::outside_setup("on_cleanup"))?;
    instance.add_cleanup(Box::new(f));
    Ok(())
}

/// Make the current component an async boundary.
///
/// Async values declared by this component or any descendant without a
/// nearer boundary are handed to `listener`.
pub fn on_async(listener: impl Fn(AsyncHandle) + 'static) -> Result<()> {
    let instance = current_component().ok_or_else(|| Error::outside_setup("on_async"))?;
    instance.set_async_listener(Rc::new(listener));
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{current_component, render_fn, Context, RenderFn};
    use crate::host::{Host, MemoryHost};
    use crate::reactive::{ReactiveState, Value};
    use crate::schedule::tick;
    use crate::vdom::{component, h, render, text, Props};
    use std::cell::{Cell, RefCell};

    thread_local! {
        static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        static THEME: Context<String> = Context::new();
    }

    fn log(entry: impl Into<String>) {
        LOG.with(|log| log.borrow_mut().push(entry.into()));
    }

    fn take_log() -> Vec<String> {
        LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
    }

    fn mount_host() -> (Rc<MemoryHost>, Rc<dyn Host>) {
        let memory = MemoryHost::new();
        let host: Rc<dyn Host> = memory.clone();
        (memory, host)
    }

    fn tracked(props: &ReactiveState) -> Result<RenderFn> {
        let name = props.peek("name")?.as_str().unwrap_or("?").to_string();
        let on_mount_name = name.clone();
        on_mount(move || log(format!("mount {on_mount_name}")))?;
        on_cleanup(move || log(format!("cleanup {name}")))?;
        Ok(render_fn(|| h("span", Props::new(), vec![])))
    }

    #[test]
    fn registration_outside_setup_fails() {
        assert_eq!(
            on_mount(|| {}),
            Err(Error::OutsideSetup {
                operation: "on_mount"
            })
        );
        assert_eq!(
            on_cleanup(|| {}),
            Err(Error::OutsideSetup {
                operation: "on_cleanup"
            })
        );
        assert!(on_async(|_| {}).is_err());
        assert!(current_component().is_none());
    }

    #[test]
    fn mount_and_cleanup_fire_once() {
        let (memory, host) = mount_host();
        take_log();

        render(
            component(tracked, Props::new().with("name", "a"), vec![]),
            &host,
            memory.root(),
        )
        .unwrap();
        assert_eq!(take_log(), vec!["mount a"]);

        render(
            component(tracked, Props::new().with("name", "a"), vec![]),
            &host,
            memory.root(),
        )
        .unwrap();
        assert!(take_log().is_empty());

        render(h("p", Props::new(), vec![]), &host, memory.root()).unwrap();
        assert_eq!(take_log(), vec!["cleanup a"]);
    }

    #[test]
    fn cleanup_runs_when_ancestor_is_replaced() {
        let (memory, host) = mount_host();
        take_log();

        let wrapped = |tag: &str| {
            h(
                tag,
                Props::new(),
                vec![component(tracked, Props::new().with("name", "inner"), vec![])],
            )
        };

        render(wrapped("div"), &host, memory.root()).unwrap();
        render(wrapped("section"), &host, memory.root()).unwrap();

        assert_eq!(
            take_log(),
            vec!["mount inner", "cleanup inner", "mount inner"]
        );
    }

    fn counter(props: &ReactiveState) -> Result<RenderFn> {
        let props = props.clone();
        let state = ReactiveState::new([("count", Value::from(0))]);
        let button_state = state.clone();
        let renders = Rc::new(Cell::new(0));
        Ok(render_fn(move || {
            renders.set(renders.get() + 1);
            let label = props.get_str("label").unwrap_or_else(|_| Rc::from(""));
            let count = state.get_int("count").unwrap_or_default();
            let target = button_state.clone();
            h(
                "button",
                Props::new()
                    .with("id", "counter")
                    .with("renders", renders.get())
                    .with(
                        "onclick",
                        crate::reactive::Handler::new(move |_| {
                            let _ = target.update("count", |v| Value::from(v.as_int().unwrap_or(0) + 1));
                        }),
                    ),
                vec![text(format!("{label} {count}"))],
            )
        }))
    }

    #[test]
    fn state_write_rerenders_in_place() {
        let (memory, host) = mount_host();
        render(
            component(counter, Props::new().with("label", "clicks"), vec![]),
            &host,
            memory.root(),
        )
        .unwrap();

        let button = memory.find_by_attribute("id", "counter").unwrap();
        memory.dispatch(button, "click");
        tick();

        assert_eq!(memory.find_by_attribute("id", "counter"), Some(button));
        assert_eq!(memory.inner_markup(button), "clicks 1");
    }

    #[test]
    fn unchanged_props_do_not_rerender_child() {
        let (memory, host) = mount_host();
        let tree = || component(counter, Props::new().with("label", "same"), vec![]);

        render(tree(), &host, memory.root()).unwrap();
        render(tree(), &host, memory.root()).unwrap();
        tick();

        let button = memory.find_by_attribute("id", "counter").unwrap();
        assert_eq!(memory.attribute(button, "renders").as_deref(), Some("1"));

        render(
            component(counter, Props::new().with("label", "changed"), vec![]),
            &host,
            memory.root(),
        )
        .unwrap();
        tick();
        assert_eq!(memory.attribute(button, "renders").as_deref(), Some("2"));
        assert_eq!(memory.inner_markup(button), "changed 0");
    }

    fn provider(props: &ReactiveState) -> Result<RenderFn> {
        THEME.with(|theme| theme.set("dark".to_string()))?;
        let children = props.peek("children")?;
        Ok(render_fn(move || children.as_nodes().map(<[_]>::to_vec).unwrap_or_default()))
    }

    fn consumer(_props: &ReactiveState) -> Result<RenderFn> {
        let theme = THEME.with(|theme| theme.get())?;
        Ok(render_fn(move || text(theme.as_str())))
    }

    #[test]
    fn context_reaches_descendants() {
        let (memory, host) = mount_host();
        let tree = component(
            provider,
            Props::new(),
            vec![h("div", Props::new(), vec![component(consumer, Props::new(), vec![])])],
        );

        render(tree, &host, memory.root()).unwrap();
        assert_eq!(memory.inner_markup(memory.root()), "<div>dark</div>");
    }

    #[test]
    fn missing_context_fails_render() {
        let (memory, host) = mount_host();
        let err = render(component(consumer, Props::new(), vec![]), &host, memory.root()).unwrap_err();
        assert!(matches!(err, Error::ContextNotFound { .. }));
    }
}
