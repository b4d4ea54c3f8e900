//! 3D hover tilt.
//!
//! Pointer position inside the element box maps to a rotation around both
//! axes. Entering drops the eased transition so the tilt tracks the pointer
//! directly; leaving restores it and eases back to the neutral pose.

use super::{log_inert, num, Effect, EffectContext, EffectFamily, EffectId, EffectState, Lifecycle};
use crate::config::HoverOptions;
use crate::host::{EventKind, Host, ListenTarget, Rect, Subscription};
use crate::result::{FxError, FxResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Default marker selector
pub const DEFAULT_SELECTOR: &str = "[data-liquid-hover]";

/// Eased transition used outside of direct tracking
pub const EASED_TRANSITION: &str = "transform 0.5s cubic-bezier(0.23, 1, 0.32, 1)";

/// Pointer position normalized to the element box, `(0.5, 0.5)` for an empty box
#[must_use]
pub fn normalize(rect: Rect, client_x: f64, client_y: f64) -> (f64, f64) {
    let axis = |offset: f64, extent: f64| {
        if extent > 0.0 {
            offset / extent
        } else {
            0.5
        }
    };
    (
        axis(client_x - rect.left, rect.width),
        axis(client_y - rect.top, rect.height),
    )
}

/// Tilted transform for a pointer at `(client_x, client_y)`
#[must_use]
pub fn tilt_transform(options: &HoverOptions, rect: Rect, client_x: f64, client_y: f64) -> String {
    let (x, y) = normalize(rect, client_x, client_y);
    let rotate_x = (y - 0.5) * -options.max_tilt;
    let rotate_y = (x - 0.5) * options.max_tilt;
    format!(
        "perspective({}px) rotateX({}deg) rotateY({}deg) scale3d({s}, {s}, {s})",
        options.perspective,
        num(rotate_x),
        num(rotate_y),
        s = options.scale,
    )
}

/// Resting transform
#[must_use]
pub fn neutral_transform(options: &HoverOptions) -> String {
    format!(
        "perspective({}px) rotateX(0) rotateY(0) scale3d(1, 1, 1)",
        options.perspective
    )
}

#[derive(Debug)]
struct HoverState<P: Host> {
    host: Rc<P>,
    lifecycle: Lifecycle,
    options: HoverOptions,
    elements: Vec<P::Node>,
    listeners: Vec<Subscription<P>>,
}

/// Hover tilt controller
#[derive(Debug)]
pub struct LiquidHover<P: Host> {
    id: EffectId,
    inner: Option<Rc<RefCell<HoverState<P>>>>,
}

impl<P: Host> LiquidHover<P> {
    /// Prepare every element matching `selector`
    ///
    /// Not gated by reduced motion. Inert if nothing matches.
    pub fn new(ctx: &EffectContext<P>, selector: &str, options: HoverOptions) -> Self {
        let id = EffectId::new();
        match Self::mount(ctx, id, selector, options) {
            Ok(state) => Self {
                id,
                inner: Some(Rc::new(RefCell::new(state))),
            },
            Err(err) => {
                log_inert(EffectFamily::Hover, id, &err);
                Self { id, inner: None }
            }
        }
    }

    fn mount(
        ctx: &EffectContext<P>,
        id: EffectId,
        selector: &str,
        options: HoverOptions,
    ) -> FxResult<HoverState<P>> {
        options.validate()?;
        let host = ctx.host();
        let elements = host.query_selector_all(selector);
        if elements.is_empty() {
            return Err(FxError::ContainerNotFound {
                selector: selector.to_string(),
            });
        }
        for element in &elements {
            host.set_styles(
                element,
                &[("transition", EASED_TRANSITION), ("will-change", "transform")],
            )?;
        }
        tracing::debug!(effect = %id, family = "hover", elements = elements.len(), "mounted");
        Ok(HoverState {
            host: Rc::clone(host),
            lifecycle: Lifecycle::new(id, EffectFamily::Hover, EffectState::Mounted),
            options,
            elements,
            listeners: Vec::new(),
        })
    }

    /// Elements the tilt applies to
    #[must_use]
    pub fn elements(&self) -> Vec<P::Node> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |cell| cell.borrow().elements.clone())
    }

    fn attach(cell: &Rc<RefCell<HoverState<P>>>) -> FxResult<()> {
        let (host, elements) = {
            let state = cell.borrow();
            (Rc::clone(&state.host), state.elements.clone())
        };
        let mut listeners = Vec::with_capacity(elements.len() * 3);
        for element in elements {
            for kind in [EventKind::MouseEnter, EventKind::MouseMove, EventKind::MouseLeave] {
                let weak = Rc::downgrade(cell);
                let node = element.clone();
                let id = host.listen(
                    ListenTarget::Element(element.clone()),
                    kind,
                    false,
                    Box::new(move |event| {
                        let Some(cell) = weak.upgrade() else {
                            return;
                        };
                        let state = cell.borrow();
                        let applied = match kind {
                            EventKind::MouseEnter => state.host.set_style(&node, "transition", "none"),
                            EventKind::MouseMove => {
                                let rect = state.host.bounding_rect(&node);
                                let transform =
                                    tilt_transform(&state.options, rect, event.client_x, event.client_y);
                                state.host.set_style(&node, "transform", &transform)
                            }
                            _ => state.host.set_styles(
                                &node,
                                &[
                                    ("transition", EASED_TRANSITION),
                                    ("transform", &neutral_transform(&state.options)),
                                ],
                            ),
                        };
                        if let Err(err) = applied {
                            tracing::warn!(effect = %state.lifecycle.id, error = %err, "hover update failed");
                        }
                    }),
                )?;
                listeners.push(Subscription::listener(&host, id));
            }
        }
        cell.borrow_mut().listeners = listeners;
        Ok(())
    }

    fn settle(state: &HoverState<P>) {
        let neutral = neutral_transform(&state.options);
        for element in &state.elements {
            let settled = state.host.set_styles(
                element,
                &[("transition", EASED_TRANSITION), ("transform", &neutral)],
            );
            if let Err(err) = settled {
                tracing::warn!(effect = %state.lifecycle.id, error = %err, "hover element not settled");
            }
        }
    }
}

impl<P: Host> Effect for LiquidHover<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Hover
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
            Ok(()) => cell.borrow_mut().lifecycle.state = EffectState::Running,
            Err(err) => tracing::warn!(effect = %self.id, error = %err, "hover listeners not attached"),
        }
    }

    fn pause(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        let listeners = {
            let mut state = cell.borrow_mut();
            if state.lifecycle.state != EffectState::Running {
                return;
            }
            state.lifecycle.state = EffectState::Paused;
            std::mem::take(&mut state.listeners)
        };
        drop(listeners);
        Self::settle(&cell.borrow());
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
            Err(err) => tracing::warn!(effect = %self.id, error = %err, "hover listeners not restored"),
        }
    }

    fn destroy(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        let listeners = {
            let mut state = cell.borrow_mut();
            if state.lifecycle.state == EffectState::Destroyed {
                return;
            }
            state.lifecycle.state = EffectState::Destroyed;
            std::mem::take(&mut state.listeners)
        };
        drop(listeners);
        let state = cell.borrow();
        for element in &state.elements {
            let cleared = state.host.set_styles(
                element,
                &[("transition", ""), ("transform", ""), ("will-change", "")],
            );
            if let Err(err) = cleared {
                tracing::warn!(effect = %self.id, error = %err, "hover styles not cleared");
            }
        }
        tracing::debug!(effect = %self.id, family = "hover", "destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MockHost, NodeId};
    use crate::motion::MotionPreference;

    fn setup() -> (Rc<MockHost>, EffectContext<MockHost>, NodeId) {
        let host = Rc::new(MockHost::new());
        let card = host.add_to_body("article", &[("data-liquid-hover", "")]);
        host.set_rect(card, Rect::new(0.0, 0.0, 200.0, 100.0));
        let ctx = EffectContext::new(Rc::clone(&host));
        (host, ctx, card)
    }

    #[test]
    fn test_tilt_transform_corners() {
        let options = HoverOptions::default();
        let rect = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(
            tilt_transform(&options, rect, 100.0, 50.0),
            "perspective(1000px) rotateX(0deg) rotateY(0deg) scale3d(1.02, 1.02, 1.02)"
        );
        assert_eq!(
            tilt_transform(&options, rect, 200.0, 0.0),
            "perspective(1000px) rotateX(5deg) rotateY(5deg) scale3d(1.02, 1.02, 1.02)"
        );
        assert_eq!(
            tilt_transform(&options, rect, 0.0, 100.0),
            "perspective(1000px) rotateX(-5deg) rotateY(-5deg) scale3d(1.02, 1.02, 1.02)"
        );
    }

    #[test]
    fn test_empty_rect_is_neutral() {
        assert_eq!(normalize(Rect::default(), 40.0, 40.0), (0.5, 0.5));
    }

    #[test]
    fn test_mount_sets_transition() {
        let (host, ctx, card) = setup();
        let hover = LiquidHover::new(&ctx, DEFAULT_SELECTOR, HoverOptions::default());
        assert_eq!(hover.elements(), vec![card]);
        assert_eq!(host.style(&card, "transition").as_deref(), Some(EASED_TRANSITION));
        assert_eq!(host.style(&card, "will-change").as_deref(), Some("transform"));
    }

    #[test]
    fn test_enter_move_leave() {
        let (host, ctx, card) = setup();
        let mut hover = LiquidHover::new(&ctx, DEFAULT_SELECTOR, HoverOptions::default());
        hover.start();
        assert_eq!(host.listener_count(), 3);

        host.mouse_enter(card, 10.0, 10.0);
        assert_eq!(host.style(&card, "transition").as_deref(), Some("none"));

        host.mouse_move(card, 200.0, 0.0);
        assert_eq!(
            host.style(&card, "transform").as_deref(),
            Some("perspective(1000px) rotateX(5deg) rotateY(5deg) scale3d(1.02, 1.02, 1.02)")
        );

        host.mouse_leave(card);
        assert_eq!(host.style(&card, "transition").as_deref(), Some(EASED_TRANSITION));
        assert_eq!(
            host.style(&card, "transform").as_deref(),
            Some("perspective(1000px) rotateX(0) rotateY(0) scale3d(1, 1, 1)")
        );
    }

    #[test]
    fn test_ungated_by_reduced_motion() {
        let host = Rc::new(MockHost::new());
        host.add_to_body("div", &[("data-liquid-hover", "")]);
        let ctx = EffectContext::with_motion(Rc::clone(&host), MotionPreference::reduced());
        let hover = LiquidHover::new(&ctx, DEFAULT_SELECTOR, HoverOptions::default());
        assert_eq!(hover.state(), EffectState::Mounted);
    }

    #[test]
    fn test_no_elements_is_inert() {
        let host = Rc::new(MockHost::new());
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut hover = LiquidHover::new(&ctx, DEFAULT_SELECTOR, HoverOptions::default());
        hover.start();
        assert!(hover.state().is_inert());
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_pause_resume_destroy() {
        let (host, ctx, card) = setup();
        let mut hover = LiquidHover::new(&ctx, DEFAULT_SELECTOR, HoverOptions::default());
        hover.start();
        hover.pause();
        assert_eq!(host.listener_count(), 0);
        host.mouse_move(card, 200.0, 0.0);
        assert!(host
            .style(&card, "transform")
            .is_some_and(|t| t.contains("rotateX(0)")));

        hover.resume();
        assert_eq!(host.listener_count(), 3);

        hover.destroy();
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.style(&card, "transform").as_deref(), Some(""));
        assert_eq!(hover.state(), EffectState::Destroyed);
    }

    #[test]
    fn test_refused_styles_do_not_block_teardown() {
        let (host, ctx, card) = setup();
        let mut hover = LiquidHover::new(&ctx, DEFAULT_SELECTOR, HoverOptions::default());
        hover.start();
        host.refuse_styles(true);

        hover.pause();
        assert_eq!(hover.state(), EffectState::Paused);
        assert_eq!(host.listener_count(), 0);

        hover.destroy();
        assert_eq!(hover.state(), EffectState::Destroyed);
        assert_eq!(host.style(&card, "will-change").as_deref(), Some("transform"));
    }
}
