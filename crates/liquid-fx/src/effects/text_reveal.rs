//! Staggered per-character text reveal.
//!
//! Each marked element keeps its text as `aria-label` and has its content
//! replaced by one hidden, displaced `.liquid-char` span per character, with
//! a transition delay of `index * stagger` ms. The first time the element
//! crosses the visibility threshold every span transitions in, and the
//! element is no longer observed.

use super::{log_inert, Effect, EffectContext, EffectFamily, EffectId, EffectState, Lifecycle};
use crate::config::TextRevealOptions;
use crate::host::{Host, IntersectionEntry, Subscription};
use crate::result::{FxError, FxResult};
use std::cell::RefCell;
use std::rc::Rc;

/// Default marker selector
pub const DEFAULT_SELECTOR: &str = "[data-liquid-text]";

/// Transform of a character before the reveal
pub const HIDDEN_TRANSFORM: &str = "translateY(100%) rotateX(-90deg)";
/// Transform of a revealed character
pub const REVEALED_TRANSFORM: &str = "translateY(0) rotateX(0)";

const CHAR_TRANSITION: &str = "opacity 0.4s ease, transform 0.6s cubic-bezier(0.19, 1, 0.22, 1)";
const NBSP: &str = "\u{a0}";

#[derive(Debug)]
struct RevealTarget<N> {
    element: N,
    text: String,
    chars: Vec<N>,
    revealed: bool,
}

#[derive(Debug)]
struct RevealState<P: Host> {
    host: Rc<P>,
    lifecycle: Lifecycle,
    options: TextRevealOptions,
    targets: Vec<RevealTarget<P::Node>>,
    observer: Option<Subscription<P>>,
}

/// Text reveal controller
#[derive(Debug)]
pub struct LiquidTextReveal<P: Host> {
    id: EffectId,
    inner: Option<Rc<RefCell<RevealState<P>>>>,
}

impl<P: Host> LiquidTextReveal<P> {
    /// Split every element matching `selector` into character spans
    ///
    /// Inert under reduced motion or if nothing matches.
    pub fn new(ctx: &EffectContext<P>, selector: &str, options: TextRevealOptions) -> Self {
        let id = EffectId::new();
        if ctx.reduced_motion() {
            tracing::debug!(effect = %id, family = "text", "reduced motion, skipping");
            return Self { id, inner: None };
        }
        match Self::mount(ctx, id, selector, options) {
            Ok(state) => Self {
                id,
                inner: Some(Rc::new(RefCell::new(state))),
            },
            Err(err) => {
                log_inert(EffectFamily::TextReveal, id, &err);
                Self { id, inner: None }
            }
        }
    }

    fn mount(
        ctx: &EffectContext<P>,
        id: EffectId,
        selector: &str,
        options: TextRevealOptions,
    ) -> FxResult<RevealState<P>> {
        options.validate()?;
        let host = ctx.host();
        let elements = host.query_selector_all(selector);
        if elements.is_empty() {
            return Err(FxError::ContainerNotFound {
                selector: selector.to_string(),
            });
        }

        // Spans are built detached; the page is untouched until all exist
        let mut targets = Vec::with_capacity(elements.len());
        for element in elements {
            let text = host.text_content(&element);
            let chars = build_chars(host.as_ref(), &text, options.stagger)?;
            targets.push(RevealTarget {
                element,
                text,
                chars,
                revealed: false,
            });
        }

        for (done, target) in targets.iter().enumerate() {
            if let Err(err) = swap_in(host.as_ref(), target) {
                for swapped in &targets[..=done] {
                    restore_text(host.as_ref(), swapped);
                }
                return Err(err);
            }
        }
        tracing::debug!(effect = %id, family = "text", elements = targets.len(), "mounted");

        Ok(RevealState {
            host: Rc::clone(host),
            lifecycle: Lifecycle::new(id, EffectFamily::TextReveal, EffectState::Mounted),
            options,
            targets,
            observer: None,
        })
    }

    /// Character spans of the `index`-th element
    #[must_use]
    pub fn chars(&self, index: usize) -> Vec<P::Node> {
        self.inner.as_ref().map_or_else(Vec::new, |cell| {
            cell.borrow()
                .targets
                .get(index)
                .map(|t| t.chars.clone())
                .unwrap_or_default()
        })
    }

    /// Number of elements already revealed
    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |cell| {
            cell.borrow().targets.iter().filter(|t| t.revealed).count()
        })
    }

    fn observe(cell: &Rc<RefCell<RevealState<P>>>) -> FxResult<()> {
        let (host, pending, threshold) = {
            let state = cell.borrow();
            let pending: Vec<P::Node> = state
                .targets
                .iter()
                .filter(|t| !t.revealed)
                .map(|t| t.element.clone())
                .collect();
            (Rc::clone(&state.host), pending, state.options.threshold)
        };
        if pending.is_empty() {
            return Ok(());
        }
        let weak = Rc::downgrade(cell);
        let observer = host.observe_intersection(
            &pending,
            threshold,
            Box::new(move |entries| {
                if let Some(cell) = weak.upgrade() {
                    on_intersect(&cell, entries);
                }
            }),
        )?;
        cell.borrow_mut().observer = Some(Subscription::observer(&host, observer));
        Ok(())
    }
}

fn build_chars<P: Host>(host: &P, text: &str, stagger: u32) -> FxResult<Vec<P::Node>> {
    let mut chars = Vec::with_capacity(text.chars().count());
    for (index, ch) in text.chars().enumerate() {
        let span = host.create_with_class("span", "liquid-char")?;
        if ch == ' ' {
            host.set_text_content(&span, NBSP)?;
        } else {
            host.set_text_content(&span, ch.encode_utf8(&mut [0; 4]))?;
        }
        let delay = format!("{}ms", index as u64 * u64::from(stagger));
        host.set_styles(
            &span,
            &[
                ("display", "inline-block"),
                ("opacity", "0"),
                ("transform", HIDDEN_TRANSFORM),
                ("transform-origin", "center bottom"),
                ("transition", CHAR_TRANSITION),
                ("transition-delay", &delay),
            ],
        )?;
        host.set_attribute(&span, "aria-hidden", "true")?;
        chars.push(span);
    }
    Ok(chars)
}

fn swap_in<P: Host>(host: &P, target: &RevealTarget<P::Node>) -> FxResult<()> {
    host.set_text_content(&target.element, "")?;
    for span in &target.chars {
        host.append_child(&target.element, span)?;
    }
    host.set_attribute(&target.element, "aria-label", &target.text)
}

fn restore_text<P: Host>(host: &P, target: &RevealTarget<P::Node>) {
    if let Err(err) = host.set_text_content(&target.element, &target.text) {
        tracing::warn!(error = %err, "text not restored");
    }
}

fn on_intersect<P: Host>(cell: &Rc<RefCell<RevealState<P>>>, entries: &[IntersectionEntry<P::Node>]) {
    let mut guard = cell.borrow_mut();
    let state = &mut *guard;
    let threshold = state.options.threshold;
    let host = Rc::clone(&state.host);
    let observer = state.observer.as_ref().and_then(Subscription::observer_id);

    for entry in entries {
        if !entry.is_intersecting || entry.ratio < threshold {
            continue;
        }
        let Some(target) = state
            .targets
            .iter_mut()
            .find(|t| t.element == entry.target && !t.revealed)
        else {
            continue;
        };
        target.revealed = true;
        for span in &target.chars {
            let revealed = host.set_styles(
                span,
                &[("opacity", "1"), ("transform", REVEALED_TRANSFORM)],
            );
            if let Err(err) = revealed {
                tracing::warn!(error = %err, "character not revealed");
            }
        }
        if let Some(observer) = observer {
            host.unobserve(observer, &entry.target);
        }
        tracing::debug!(effect = %state.lifecycle.id, chars = target.chars.len(), "text revealed");
    }
}

impl<P: Host> Effect for LiquidTextReveal<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::TextReveal
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
        match Self::observe(cell) {
            Ok(()) => cell.borrow_mut().lifecycle.state = EffectState::Running,
            Err(err) => tracing::warn!(effect = %self.id, error = %err, "text observer not attached"),
        }
    }

    fn pause(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        let observer = {
            let mut state = cell.borrow_mut();
            if state.lifecycle.state != EffectState::Running {
                return;
            }
            state.lifecycle.state = EffectState::Paused;
            state.observer.take()
        };
        drop(observer);
    }

    fn resume(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        if cell.borrow().lifecycle.state != EffectState::Paused {
            return;
        }
        match Self::observe(cell) {
            Ok(()) => cell.borrow_mut().lifecycle.state = EffectState::Running,
            Err(err) => tracing::warn!(effect = %self.id, error = %err, "text observer not restored"),
        }
    }

    fn destroy(&mut self) {
        let Some(cell) = &self.inner else {
            return;
        };
        let observer = {
            let mut state = cell.borrow_mut();
            if state.lifecycle.state == EffectState::Destroyed {
                return;
            }
            state.lifecycle.state = EffectState::Destroyed;
            state.observer.take()
        };
        drop(observer);
        let state = cell.borrow();
        for target in &state.targets {
            restore_text(state.host.as_ref(), target);
        }
        tracing::debug!(effect = %self.id, family = "text", "destroyed");
    }
}
