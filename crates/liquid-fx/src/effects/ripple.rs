//! Click ripples.
//!
//! One delegated click listener on the document. A click inside an element
//! matching the selector appends a zero-size `.liquid-ripple` at the click
//! offset; the `liquid-ripple-expand` keyframes grow it and a one-shot
//! timer removes it after `duration`.

use super::{log_inert, num, Effect, EffectContext, EffectFamily, EffectId, EffectState, Lifecycle};
use crate::config::RippleOptions;
use crate::host::{DomEvent, EventKind, Host, ListenTarget, Subscription, TimerHandle};
use crate::result::FxResult;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Default marker selector
pub const DEFAULT_SELECTOR: &str = "[data-ripple]";

#[derive(Debug)]
struct RippleState<P: Host> {
    host: Rc<P>,
    lifecycle: Lifecycle,
    selector: String,
    options: RippleOptions,
    click: Option<Subscription<P>>,
    live: BTreeMap<u64, (P::Node, TimerHandle)>,
    next_key: u64,
}

/// Click ripple controller
#[derive(Debug)]
pub struct RippleEffect<P: Host> {
    id: EffectId,
    inner: Option<Rc<RefCell<RippleState<P>>>>,
}

impl<P: Host> RippleEffect<P> {
    /// Create a ripple controller for elements matching `selector`
    ///
    /// Nothing is attached until [`Effect::start`]. Inert under reduced
    /// motion or with invalid options.
    pub fn new(ctx: &EffectContext<P>, selector: &str, options: RippleOptions) -> Self {
        let id = EffectId::new();
        if ctx.reduced_motion() {
            tracing::debug!(effect = %id, family = "ripple", "reduced motion, skipping");
            return Self { id, inner: None };
        }
        if let Err(err) = options.validate() {
            log_inert(EffectFamily::Ripple, id, &err);
            return Self { id, inner: None };
        }
        let state = RippleState {
            host: Rc::clone(ctx.host()),
            lifecycle: Lifecycle::new(id, EffectFamily::Ripple, EffectState::Mounted),
            selector: selector.to_string(),
            options,
            click: None,
            live: BTreeMap::new(),
            next_key: 0,
        };
        Self {
            id,
            inner: Some(Rc::new(RefCell::new(state))),
        }
    }

    /// Number of ripples currently in the document
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |cell| cell.borrow().live.len())
    }

    /// Ripple nodes currently in the document, oldest first
    #[must_use]
    pub fn live_nodes(&self) -> Vec<P::Node> {
        self.inner.as_ref().map_or_else(Vec::new, |cell| {
            cell.borrow().live.values().map(|(n, _)| n.clone()).collect()
        })
    }

    fn attach(cell: &Rc<RefCell<RippleState<P>>>) -> FxResult<()> {
        let host = Rc::clone(&cell.borrow().host);
        let weak = Rc::downgrade(cell);
        let listener = host.listen(
            ListenTarget::Document,
            EventKind::Click,
            false,
            Box::new(move |event| {
                if let Some(cell) = weak.upgrade() {
                    on_click(&cell, event);
                }
            }),
        )?;
        cell.borrow_mut().click = Some(Subscription::listener(&host, listener));
        Ok(())
    }
}

fn on_click<P: Host>(cell: &Rc<RefCell<RippleState<P>>>, event: &DomEvent<P::Node>) {
    let Some(target) = &event.target else {
        return;
    };
    let matched = {
        let state = cell.borrow();
        state.host.closest(target, &state.selector)
    };
    let Some(element) = matched else {
        return;
    };
    if let Err(err) = spawn(cell, &element, event.client_x, event.client_y) {
        let id = cell.borrow().lifecycle.id;
        tracing::warn!(effect = %id, error = %err, "ripple not created");
    }
}

fn spawn<P: Host>(
    cell: &Rc<RefCell<RippleState<P>>>,
    element: &P::Node,
    client_x: f64,
    client_y: f64,
) -> FxResult<()> {
    let (host, options) = {
        let state = cell.borrow();
        (Rc::clone(&state.host), state.options.clone())
    };
    let rect = host.bounding_rect(element);
    let left = format!("{}px", num(client_x - rect.left));
    let top = format!("{}px", num(client_y - rect.top));

    let ripple = host.create_with_class("span", "liquid-ripple")?;
    host.set_styles(
        &ripple,
        &[
            ("position", "absolute"),
            ("left", &left),
            ("top", &top),
            ("width", "0"),
            ("height", "0"),
            ("border-radius", "50%"),
            ("background", &format!("rgba({}, 0.2)", options.color)),
            ("transform", "translate(-50%, -50%)"),
            ("pointer-events", "none"),
            (
                "animation",
                &format!("liquid-ripple-expand {}ms ease-out forwards", options.duration),
            ),
        ],
    )?;

    if host.computed_style(element, "position").as_deref() == Some("static") {
        host.set_style(element, "position", "relative")?;
    }
    host.set_style(element, "overflow", "hidden")?;
    host.append_child(element, &ripple)?;

    let key = {
        let mut state = cell.borrow_mut();
        state.next_key += 1;
        state.next_key
    };
    let weak = Rc::downgrade(cell);
    let node = ripple.clone();
    let expire_host = Rc::clone(&host);
    let timer = host.set_timeout(
        Box::new(move || {
            expire_host.remove_node(&node);
            if let Some(cell) = weak.upgrade() {
                cell.borrow_mut().live.remove(&key);
            }
        }),
        options.duration,
    );
    cell.borrow_mut().live.insert(key, (ripple, timer));
    Ok(())
}

impl<P: Host> Effect for RippleEffect<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Ripple
    }

    fn state(&self) -> EffectState {
        self.inner
            .as_ref()
            .map_or(EffectState::Inert, |cell| cell.borrow().lifecycle.state)
    }

    fn start(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        if cell.borrow().lifecycle.state != EffectState::Mounted {
            return;
        }
        match Self::attach(cell) {
            Ok(()) => {
                cell.borrow_mut().lifecycle.state = EffectState::Running;
                tracing::debug!(effect = %self.id, family = "ripple", "started");
            }
            Err(err) => log_inert(EffectFamily::Ripple, self.id, &err),
        }
    }

    fn pause(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        let mut state = cell.borrow_mut();
        if state.lifecycle.state == EffectState::Running {
            state.click = None;
            state.lifecycle.state = EffectState::Paused;
        }
    }

    fn resume(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        if cell.borrow().lifecycle.state != EffectState::Paused {
            return;
        }
        match Self::attach(cell) {
            Ok(()) => cell.borrow_mut().lifecycle.state = EffectState::Running,
            Err(err) => tracing::warn!(effect = %self.id, error = %err, "ripple listener not restored"),
        }
    }

    fn destroy(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        let (host, click, live) = {
            let mut state = cell.borrow_mut();
            if state.lifecycle.state == EffectState::Destroyed {
                return;
            }
            state.lifecycle.state = EffectState::Destroyed;
            (
                Rc::clone(&state.host),
                state.click.take(),
                std::mem::take(&mut state.live),
            )
        };
        drop(click);
        for (node, timer) in live.into_values() {
            host.clear_timeout(timer);
            host.remove_node(&node);
        }
        tracing::debug!(effect = %self.id, family = "ripple", "destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MockHost, NodeId, Rect};
    use crate::motion::MotionPreference;

    fn setup() -> (Rc<MockHost>, EffectContext<MockHost>, NodeId) {
        let host = Rc::new(MockHost::new());
        let button = host.add_to_body("button", &[("data-ripple", "")]);
        host.set_rect(button, Rect::new(100.0, 200.0, 100.0, 50.0));
        let ctx = EffectContext::new(Rc::clone(&host));
        (host, ctx, button)
    }

    #[test]
    fn test_click_spawns_ripple_at_offset() {
        let (host, ctx, button) = setup();
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        host.click(button, 130.0, 210.0);

        let nodes = ripple.live_nodes();
        assert_eq!(nodes.len(), 1);
        let node = host.node(nodes[0]).unwrap();
        assert!(node.has_class("liquid-ripple"));
        assert_eq!(node.get_style("left"), Some("30px"));
        assert_eq!(node.get_style("top"), Some("10px"));
        assert_eq!(
            node.get_style("background"),
            Some("rgba(var(--color-primary-rgb, 26, 26, 26), 0.2)")
        );
        assert_eq!(
            node.get_style("animation"),
            Some("liquid-ripple-expand 800ms ease-out forwards")
        );
        assert_eq!(host.parent(nodes[0]), Some(button));

        let target = host.node(button).unwrap();
        assert_eq!(target.get_style("position"), Some("relative"));
        assert_eq!(target.get_style("overflow"), Some("hidden"));
    }

    #[test]
    fn test_ripple_removed_after_duration() {
        let (host, ctx, button) = setup();
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        host.click(button, 130.0, 210.0);
        let node = ripple.live_nodes()[0];

        host.advance_time(799.0);
        assert!(host.is_connected(node));
        host.advance_time(1.0);
        assert!(!host.is_connected(node));
        assert_eq!(ripple.live_count(), 0);
    }

    #[test]
    fn test_click_on_descendant_uses_marked_ancestor() {
        let (host, ctx, button) = setup();
        let label = host.add_element(button, "span", &[]);
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        host.click(label, 150.0, 225.0);
        let node = ripple.live_nodes()[0];
        assert_eq!(host.parent(node), Some(button));
        assert_eq!(host.style(&node, "left").as_deref(), Some("50px"));
    }

    #[test]
    fn test_positioned_element_keeps_position() {
        let (host, ctx, button) = setup();
        host.set_style(&button, "position", "absolute").unwrap();
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        host.click(button, 100.0, 200.0);
        assert_eq!(host.style(&button, "position").as_deref(), Some("absolute"));
    }

    #[test]
    fn test_unmarked_click_ignored() {
        let (host, ctx, _button) = setup();
        let other = host.add_to_body("a", &[]);
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        host.click(other, 1.0, 1.0);
        assert_eq!(ripple.live_count(), 0);
    }

    #[test]
    fn test_no_instance_cap() {
        let (host, ctx, button) = setup();
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        for _ in 0..25 {
            host.click(button, 110.0, 210.0);
        }
        assert_eq!(ripple.live_count(), 25);
    }

    #[test]
    fn test_pause_detaches_listener() {
        let (host, ctx, button) = setup();
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        ripple.pause();
        assert_eq!(host.listener_count(), 0);
        host.click(button, 110.0, 210.0);
        assert_eq!(ripple.live_count(), 0);
        ripple.resume();
        host.click(button, 110.0, 210.0);
        assert_eq!(ripple.live_count(), 1);
    }

    #[test]
    fn test_destroy_removes_live_ripples() {
        let (host, ctx, button) = setup();
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        host.click(button, 110.0, 210.0);
        let node = ripple.live_nodes()[0];
        ripple.destroy();
        assert!(!host.is_connected(node));
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(ripple.state(), EffectState::Destroyed);
    }

    #[test]
    fn test_reduced_motion_is_inert() {
        let host = Rc::new(MockHost::new());
        let button = host.add_to_body("button", &[("data-ripple", "")]);
        let ctx = EffectContext::with_motion(Rc::clone(&host), MotionPreference::reduced());
        let mut ripple = RippleEffect::new(&ctx, DEFAULT_SELECTOR, RippleOptions::default());
        ripple.start();
        host.click(button, 1.0, 1.0);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.mutation_count(), 0);
        assert!(ripple.state().is_inert());
    }
}
