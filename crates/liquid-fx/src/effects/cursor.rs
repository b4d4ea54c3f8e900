//! Pointer-following cursor with a smoothed trail.
//!
//! A fixed `.liquid-cursor` head snaps to the pointer every frame while a
//! chain of `.liquid-cursor-trail` dots eases after it. The first touch
//! hides everything for the rest of the session.

use super::{
    begin, finish, log_inert, num, proceed, suspend, Animate, Effect, EffectContext, EffectFamily,
    EffectId, EffectState, Lifecycle,
};
use crate::config::CursorOptions;
use crate::host::{EventKind, Host, ListenTarget, Subscription};
use crate::motion::HOVER_QUERY;
use crate::result::{FxError, FxResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Presence of this marker anywhere in the document enables the cursor
pub const MARKER_SELECTOR: &str = "[data-liquid-cursor]";

/// Trail positions eased toward the pointer
///
/// Nodes update in order within a step: node 0 closes `smoothing` of the
/// distance to the pointer, node `i` closes `smoothing` of the distance to
/// node `i - 1`'s freshly updated position.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailChain {
    pointer: (f64, f64),
    nodes: Vec<(f64, f64)>,
    smoothing: f64,
}

impl TrailChain {
    /// Chain of `len` nodes resting at the origin
    #[must_use]
    pub fn new(len: usize, smoothing: f64) -> Self {
        Self {
            pointer: (0.0, 0.0),
            nodes: vec![(0.0, 0.0); len],
            smoothing,
        }
    }

    /// Record the raw pointer position
    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.pointer = (x, y);
    }

    /// Last recorded pointer position
    #[must_use]
    pub const fn pointer(&self) -> (f64, f64) {
        self.pointer
    }

    /// Advance every node one frame
    pub fn step(&mut self) {
        let mut lead = self.pointer;
        for node in &mut self.nodes {
            node.0 += (lead.0 - node.0) * self.smoothing;
            node.1 += (lead.1 - node.1) * self.smoothing;
            lead = *node;
        }
    }

    /// Current node positions, nearest the pointer first
    #[must_use]
    pub fn nodes(&self) -> &[(f64, f64)] {
        &self.nodes
    }
}

/// Diameter of trail dot `index`, never negative
#[must_use]
pub fn trail_size(size: f64, index: usize) -> f64 {
    (size - index as f64 * 1.5).max(0.0)
}

/// Opacity of trail dot `index`, never negative
#[must_use]
pub fn trail_opacity(index: usize) -> f64 {
    (0.3 - index as f64 * 0.02).max(0.0)
}

#[derive(Debug)]
struct CursorState<P: Host> {
    host: Rc<P>,
    lifecycle: Lifecycle,
    head: P::Node,
    trail: Vec<P::Node>,
    chain: TrailChain,
    touched: bool,
    pointer: Option<Subscription<P>>,
    touch: Option<Subscription<P>>,
}

impl<P: Host> CursorState<P> {
    fn hide_all(&mut self) {
        self.touched = true;
        for node in std::iter::once(&self.head).chain(&self.trail) {
            if let Err(err) = self.host.set_style(node, "display", "none") {
                tracing::warn!(effect = %self.lifecycle.id, error = %err, "cursor node not hidden");
            }
        }
        tracing::debug!(effect = %self.lifecycle.id, "touch input detected, cursor hidden");
    }
}

impl<P: Host> Animate for CursorState<P> {
    type Host = P;

    fn host(&self) -> &Rc<P> {
        &self.host
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_frame(&mut self) -> FxResult<()> {
        let (x, y) = self.chain.pointer();
        self.host.set_styles(
            &self.head,
            &[("left", &format!("{}px", num(x))), ("top", &format!("{}px", num(y)))],
        )?;
        self.chain.step();
        for (node, (x, y)) in self.trail.iter().zip(self.chain.nodes()) {
            self.host.set_styles(
                node,
                &[("left", &format!("{}px", num(*x))), ("top", &format!("{}px", num(*y)))],
            )?;
        }
        Ok(())
    }
}

/// Cursor trail controller
#[derive(Debug)]
pub struct LiquidCursor<P: Host> {
    id: EffectId,
    inner: Option<Rc<RefCell<CursorState<P>>>>,
}

impl<P: Host> LiquidCursor<P> {
    /// Mount the cursor and its trail under `<body>`
    ///
    /// Inert under reduced motion, on devices without hover, or when no
    /// element carries the marker attribute.
    pub fn new(ctx: &EffectContext<P>, options: CursorOptions) -> Self {
        let id = EffectId::new();
        if ctx.reduced_motion() {
            tracing::debug!(effect = %id, family = "cursor", "reduced motion, skipping");
            return Self { id, inner: None };
        }
        if !ctx.host().media_matches(HOVER_QUERY) {
            tracing::debug!(effect = %id, family = "cursor", "no hover capability, skipping");
            return Self { id, inner: None };
        }
        match Self::mount(ctx, id, &options) {
            Ok(state) => Self {
                id,
                inner: Some(Rc::new(RefCell::new(state))),
            },
            Err(err) => {
                log_inert(EffectFamily::Cursor, id, &err);
                Self { id, inner: None }
            }
        }
    }

    fn mount(ctx: &EffectContext<P>, id: EffectId, options: &CursorOptions) -> FxResult<CursorState<P>> {
        options.validate()?;
        let host = ctx.host();
        if host.query_selector(MARKER_SELECTOR).is_none() {
            return Err(FxError::ContainerNotFound {
                selector: MARKER_SELECTOR.to_string(),
            });
        }
        let body = host
            .body()
            .ok_or_else(|| FxError::host_unavailable("document has no body"))?;

        let head = host.create_with_class("div", "liquid-cursor")?;
        host.set_attribute(&head, "aria-hidden", "true")?;
        let size = format!("{}px", num(options.size));
        host.set_styles(
            &head,
            &[
                ("position", "fixed"),
                ("width", &size),
                ("height", &size),
                ("background", &options.color),
                ("border-radius", "50%"),
                ("pointer-events", "none"),
                ("z-index", "9999"),
                ("opacity", "0.5"),
                ("mix-blend-mode", "difference"),
                ("transform", "translate(-50%, -50%)"),
                ("transition", "transform 0.1s ease-out"),
            ],
        )?;

        let mut trail = Vec::with_capacity(options.trail_length);
        for index in 0..options.trail_length {
            let dot = host.create_with_class("div", "liquid-cursor-trail")?;
            host.set_attribute(&dot, "aria-hidden", "true")?;
            let size = format!("{}px", num(trail_size(options.size, index)));
            host.set_styles(
                &dot,
                &[
                    ("position", "fixed"),
                    ("width", &size),
                    ("height", &size),
                    ("background", &options.color),
                    ("border-radius", "50%"),
                    ("pointer-events", "none"),
                    ("z-index", "9998"),
                    ("opacity", &num(trail_opacity(index)).to_string()),
                    ("mix-blend-mode", "difference"),
                    ("transform", "translate(-50%, -50%)"),
                ],
            )?;
            trail.push(dot);
        }

        let attached = std::iter::once(&head)
            .chain(&trail)
            .try_for_each(|node| host.append_child(&body, node));
        if let Err(err) = attached {
            for node in std::iter::once(&head).chain(&trail) {
                host.remove_node(node);
            }
            return Err(err);
        }
        tracing::debug!(effect = %id, family = "cursor", trail = trail.len(), "mounted");

        Ok(CursorState {
            host: Rc::clone(host),
            lifecycle: Lifecycle::new(id, EffectFamily::Cursor, EffectState::Mounted),
            head,
            chain: TrailChain::new(trail.len(), options.smoothing),
            trail,
            touched: false,
            pointer: None,
            touch: None,
        })
    }

    /// The `.liquid-cursor` head
    #[must_use]
    pub fn head(&self) -> Option<P::Node> {
        self.inner.as_ref().map(|cell| cell.borrow().head.clone())
    }

    /// Trail dots, nearest the pointer first
    #[must_use]
    pub fn trail(&self) -> Vec<P::Node> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |cell| cell.borrow().trail.clone())
    }

    /// Current trail positions
    #[must_use]
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |cell| cell.borrow().chain.nodes().to_vec())
    }

    /// Whether touch input switched the cursor off
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.inner.as_ref().is_some_and(|cell| cell.borrow().touched)
    }

    fn listen(cell: &Rc<RefCell<CursorState<P>>>) -> FxResult<()> {
        let host = Rc::clone(&cell.borrow().host);

        let weak = Rc::downgrade(cell);
        let pointer = host.listen(
            ListenTarget::Document,
            EventKind::MouseMove,
            false,
            Box::new(move |event| {
                if let Some(cell) = weak.upgrade() {
                    cell.borrow_mut().chain.set_pointer(event.client_x, event.client_y);
                }
            }),
        )?;
        cell.borrow_mut().pointer = Some(Subscription::listener(&host, pointer));

        let weak = Rc::downgrade(cell);
        let touch = host.listen(
            ListenTarget::Document,
            EventKind::TouchStart,
            true,
            Box::new(move |_| {
                let Some(cell) = weak.upgrade() else {
                    return;
                };
                let mut state = cell.borrow_mut();
                state.hide_all();
                // once-listener is already gone from the host
                if let Some(touch) = state.touch.take() {
                    touch.detach();
                }
            }),
        )?;
        cell.borrow_mut().touch = Some(Subscription::listener(&host, touch));
        Ok(())
    }
}

impl<P: Host> Effect for LiquidCursor<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Cursor
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
        if let Err(err) = Self::listen(cell) {
            tracing::warn!(effect = %self.id, error = %err, "cursor listeners not attached");
            return;
        }
        begin(cell);
    }

    fn pause(&mut self) {
        if let Some(cell) = &self.inner {
            suspend(cell);
        }
    }

    fn resume(&mut self) {
        if let Some(cell) = &self.inner {
            proceed(cell);
        }
    }

    fn destroy(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        if !finish(cell) {
            return;
        }
        let (host, nodes, pointer, touch) = {
            let mut state = cell.borrow_mut();
            let mut nodes = vec![state.head.clone()];
            nodes.extend(state.trail.iter().cloned());
            (
                Rc::clone(&state.host),
                nodes,
                state.pointer.take(),
                state.touch.take(),
            )
        };
        drop(pointer);
        drop(touch);
        for node in &nodes {
            host.remove_node(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;
    use crate::motion::MotionPreference;

    fn hover_host() -> Rc<MockHost> {
        let host = Rc::new(MockHost::new());
        host.set_media(HOVER_QUERY, true);
        host.add_to_body("div", &[("data-liquid-cursor", "")]);
        host
    }

    fn distance((x, y): (f64, f64), (tx, ty): (f64, f64)) -> f64 {
        (tx - x).hypot(ty - y)
    }

    #[test]
    fn test_chain_first_step() {
        let mut chain = TrailChain::new(3, 0.3);
        chain.set_pointer(100.0, 100.0);
        chain.step();
        let nodes = chain.nodes();
        assert!((nodes[0].0 - 30.0).abs() < 1e-9);
        assert!((nodes[1].0 - 9.0).abs() < 1e-9);
        assert!((nodes[2].0 - 2.7).abs() < 1e-9);
    }

    #[test]
    fn test_trail_geometry_clamped() {
        assert_eq!(trail_size(20.0, 0), 20.0);
        assert_eq!(trail_size(20.0, 4), 14.0);
        assert_eq!(trail_size(10.0, 9), 0.0);
        assert!((trail_opacity(5) - 0.2).abs() < 1e-9);
        assert_eq!(trail_opacity(20), 0.0);
    }

    #[test]
    fn test_failed_attach_leaves_no_orphans() {
        let host = hover_host();
        let body = host.body().unwrap();
        let before = host.children(body);
        host.fail_inserts_after(1);
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut cursor = LiquidCursor::new(&ctx, CursorOptions::default());
        cursor.start();
        assert!(cursor.state().is_inert());
        assert_eq!(host.children(body), before);
        assert!(host.query_selector_all(".liquid-cursor").is_empty());
        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn test_mount_structure() {
        let host = hover_host();
        let ctx = EffectContext::new(Rc::clone(&host));
        let cursor = LiquidCursor::new(&ctx, CursorOptions::default());
        assert_eq!(cursor.state(), EffectState::Mounted);

        let head = cursor.head().unwrap();
        let node = host.node(head).unwrap();
        assert!(node.has_class("liquid-cursor"));
        assert_eq!(node.get_style("width"), Some("20px"));
        assert_eq!(node.get_style("z-index"), Some("9999"));
        assert_eq!(node.get_attr("aria-hidden"), Some("true"));

        let trail = cursor.trail();
        assert_eq!(trail.len(), 10);
        let third = host.node(trail[2]).unwrap();
        assert_eq!(third.get_style("width"), Some("17px"));
        let opacity: f64 = third.get_style("opacity").unwrap().parse().unwrap();
        assert!((opacity - 0.26).abs() < 1e-9);
        assert_eq!(host.parent(trail[9]), host.body());
    }

    #[test]
    fn test_frames_follow_pointer() {
        let host = hover_host();
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut cursor = LiquidCursor::new(&ctx, CursorOptions::default());
        cursor.start();
        let body = host.body().unwrap();
        host.mouse_move(body, 100.0, 100.0);

        let mut previous: Vec<f64> = cursor
            .positions()
            .into_iter()
            .map(|p| distance(p, (100.0, 100.0)))
            .collect();
        for _ in 0..15 {
            host.advance_frame();
            let current: Vec<f64> = cursor
                .positions()
                .into_iter()
                .map(|p| distance(p, (100.0, 100.0)))
                .collect();
            for (now, before) in current.iter().zip(&previous) {
                assert!(now < before);
            }
            previous = current;
        }
        let head = cursor.head().unwrap();
        assert_eq!(host.style(&head, "left").as_deref(), Some("100px"));
        assert_eq!(host.style(&head, "top").as_deref(), Some("100px"));
    }

    #[test]
    fn test_touch_hides_for_session() {
        let host = hover_host();
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut cursor = LiquidCursor::new(&ctx, CursorOptions::default());
        cursor.start();
        let body = host.body().unwrap();
        host.touch_start(body);
        assert!(cursor.is_touched());
        assert_eq!(host.listener_count_of(EventKind::TouchStart), 0);

        host.mouse_move(body, 40.0, 40.0);
        host.advance_frames(5);
        let head = cursor.head().unwrap();
        assert_eq!(host.style(&head, "display").as_deref(), Some("none"));
        for dot in cursor.trail() {
            assert_eq!(host.style(&dot, "display").as_deref(), Some("none"));
        }
    }

    #[test]
    fn test_destroy_removes_everything() {
        let host = hover_host();
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut cursor = LiquidCursor::new(&ctx, CursorOptions::default());
        cursor.start();
        let head = cursor.head().unwrap();
        cursor.destroy();
        assert!(!host.is_connected(head));
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(cursor.state(), EffectState::Destroyed);
    }

    #[test]
    fn test_gates() {
        let host = Rc::new(MockHost::new());
        host.set_media(HOVER_QUERY, true);
        let ctx = EffectContext::new(Rc::clone(&host));
        assert!(LiquidCursor::new(&ctx, CursorOptions::default()).state().is_inert());

        let host = hover_host();
        host.set_media(HOVER_QUERY, false);
        let ctx = EffectContext::new(Rc::clone(&host));
        assert!(LiquidCursor::new(&ctx, CursorOptions::default()).state().is_inert());

        let host = hover_host();
        let ctx = EffectContext::with_motion(Rc::clone(&host), MotionPreference::reduced());
        let mut cursor = LiquidCursor::new(&ctx, CursorOptions::default());
        cursor.start();
        assert!(cursor.state().is_inert());
        assert_eq!(host.mutation_count(), 0);
        assert_eq!(host.pending_frames(), 0);
    }
}
