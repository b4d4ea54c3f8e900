//! Morphing background blobs.
//!
//! A `.liquid-blobs` wrapper is prepended to the container and filled with
//! blurred `.liquid-blob` circles. Each frame advances a fixed time
//! accumulator and moves every blob along its own sine/cosine drift while
//! its scale oscillates anisotropically.
//!
//! Document visibility changes pause and resume the loop automatically.

use super::{
    begin, finish, log_inert, num, proceed, suspend, Animate, Effect, EffectContext, EffectFamily,
    EffectId, EffectState, Lifecycle, Target,
};
use crate::config::BlobOptions;
use crate::host::{EventKind, Host, ListenTarget, Subscription};
use crate::result::FxResult;
use crate::rng::between;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

/// Drift amplitude in percent of the wrapper
const DRIFT: f64 = 30.0;
/// Scale swing around 1.0
const MORPH: f64 = 0.2;

/// Random parameters of one blob, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlobParticle {
    /// Base x position in percent, [0, 100)
    pub x: f64,
    /// Base y position in percent, [0, 100)
    pub y: f64,
    /// Diameter in px
    pub size: f64,
    /// Horizontal drift rate, [-1, 1)
    pub phase_x: f64,
    /// Vertical drift rate, [-1, 1)
    pub phase_y: f64,
    /// Morph rate, [0.5, 1)
    pub morph_speed: f64,
    /// Morph phase, [0, 2π)
    pub morph_offset: f64,
}

impl BlobParticle {
    /// Draw a particle from a unit random source
    pub fn sample(mut random: impl FnMut() -> f64, min_size: f64, max_size: f64) -> Self {
        let size = between(random(), min_size, max_size);
        Self {
            size,
            x: random() * 100.0,
            y: random() * 100.0,
            phase_x: between(random(), -1.0, 1.0),
            phase_y: between(random(), -1.0, 1.0),
            morph_speed: between(random(), 0.5, 1.0),
            morph_offset: random() * TAU,
        }
    }

    /// Translation (percent) and scale at accumulator value `t`
    #[must_use]
    pub fn pose(&self, index: usize, t: f64) -> (f64, f64, f64, f64) {
        let i = index as f64;
        let dx = (t * self.phase_x + i).sin() * DRIFT;
        let dy = (t * self.phase_y + i).cos() * DRIFT;
        let morph = t * self.morph_speed + self.morph_offset;
        (
            self.x + dx,
            self.y + dy,
            1.0 + morph.sin() * MORPH,
            1.0 + morph.cos() * MORPH,
        )
    }

    /// CSS transform at accumulator value `t`
    #[must_use]
    pub fn transform(&self, index: usize, t: f64) -> String {
        let (x, y, sx, sy) = self.pose(index, t);
        format!(
            "translate({}%, {}%) scale({}, {})",
            num(x),
            num(y),
            num(sx),
            num(sy)
        )
    }
}

#[derive(Debug)]
struct BlobState<P: Host> {
    host: Rc<P>,
    lifecycle: Lifecycle,
    options: BlobOptions,
    wrapper: P::Node,
    particles: Vec<(P::Node, BlobParticle)>,
    time: f64,
    paused_by_visibility: bool,
    visibility: Option<Subscription<P>>,
}

impl<P: Host> Animate for BlobState<P> {
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
        self.time += self.options.speed;
        for (index, (node, particle)) in self.particles.iter().enumerate() {
            self.host
                .set_style(node, "transform", &particle.transform(index, self.time))?;
        }
        Ok(())
    }
}

/// Blob background controller
#[derive(Debug)]
pub struct BlobAnimation<P: Host> {
    id: EffectId,
    inner: Option<Rc<RefCell<BlobState<P>>>>,
}

impl<P: Host> BlobAnimation<P> {
    /// Mount blobs into `target`
    ///
    /// Inert under reduced motion, when the target is missing or when the
    /// options are invalid.
    pub fn new(ctx: &EffectContext<P>, target: Target<P::Node>, options: BlobOptions) -> Self {
        let id = EffectId::new();
        if ctx.reduced_motion() {
            tracing::debug!(effect = %id, family = "blob", "reduced motion, skipping");
            return Self { id, inner: None };
        }
        match Self::mount(ctx, id, &target, options) {
            Ok(state) => Self {
                id,
                inner: Some(Rc::new(RefCell::new(state))),
            },
            Err(err) => {
                log_inert(EffectFamily::Blob, id, &err);
                Self { id, inner: None }
            }
        }
    }

    fn mount(
        ctx: &EffectContext<P>,
        id: EffectId,
        target: &Target<P::Node>,
        options: BlobOptions,
    ) -> FxResult<BlobState<P>> {
        options.validate()?;
        let host = ctx.host();
        let container = target.resolve(host.as_ref())?;

        // Build detached, attach last
        let wrapper = host.create_with_class("div", "liquid-blobs")?;
        host.set_attribute(&wrapper, "aria-hidden", "true")?;

        let mut particles = Vec::with_capacity(options.count);
        for index in 0..options.count {
            let particle = BlobParticle::sample(|| host.random(), options.min_size, options.max_size);
            let node = host.create_with_class("div", "liquid-blob")?;
            let size = format!("{}px", particle.size);
            let color = &options.colors[index % options.colors.len()];
            host.set_styles(
                &node,
                &[
                    ("position", "absolute"),
                    ("width", &size),
                    ("height", &size),
                    ("background", color),
                    ("border-radius", "50%"),
                    ("filter", "blur(40px)"),
                    ("opacity", "0.7"),
                    ("pointer-events", "none"),
                    ("will-change", "transform"),
                    ("transform", "translate3d(0, 0, 0)"),
                ],
            )?;
            host.append_child(&wrapper, &node)?;
            particles.push((node, particle));
        }

        host.set_styles(&container, &[("position", "relative"), ("overflow", "hidden")])?;
        host.prepend_child(&container, &wrapper)?;
        tracing::debug!(effect = %id, family = "blob", count = options.count, "mounted");

        Ok(BlobState {
            host: Rc::clone(host),
            lifecycle: Lifecycle::new(id, EffectFamily::Blob, EffectState::Mounted),
            options,
            wrapper,
            particles,
            time: 0.0,
            paused_by_visibility: false,
            visibility: None,
        })
    }

    /// Number of blob nodes mounted
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |cell| cell.borrow().particles.len())
    }

    /// Blob parameters, in creation order
    #[must_use]
    pub fn particles(&self) -> Vec<BlobParticle> {
        self.inner.as_ref().map_or_else(Vec::new, |cell| {
            cell.borrow().particles.iter().map(|(_, p)| *p).collect()
        })
    }

    /// Blob nodes, in creation order
    #[must_use]
    pub fn nodes(&self) -> Vec<P::Node> {
        self.inner.as_ref().map_or_else(Vec::new, |cell| {
            cell.borrow().particles.iter().map(|(n, _)| n.clone()).collect()
        })
    }

    /// The `.liquid-blobs` wrapper
    #[must_use]
    pub fn wrapper(&self) -> Option<P::Node> {
        self.inner.as_ref().map(|cell| cell.borrow().wrapper.clone())
    }

    /// Current value of the frame time accumulator
    #[must_use]
    pub fn time(&self) -> f64 {
        self.inner.as_ref().map_or(0.0, |cell| cell.borrow().time)
    }

    fn watch_visibility(cell: &Rc<RefCell<BlobState<P>>>) {
        let host = Rc::clone(&cell.borrow().host);
        let weak = Rc::downgrade(cell);
        let registered = host.listen(
            ListenTarget::Document,
            EventKind::VisibilityChange,
            false,
            Box::new(move |_| {
                let Some(cell) = weak.upgrade() else {
                    return;
                };
                let hidden = cell.borrow().host.document_hidden();
                if hidden {
                    if suspend(&cell) {
                        cell.borrow_mut().paused_by_visibility = true;
                    }
                    return;
                }
                let was_auto_paused = cell.borrow().paused_by_visibility;
                if was_auto_paused {
                    cell.borrow_mut().paused_by_visibility = false;
                    proceed(&cell);
                }
            }),
        );
        match registered {
            Ok(listener) => {
                cell.borrow_mut().visibility = Some(Subscription::listener(&host, listener));
            }
            Err(err) => {
                tracing::warn!(error = %err, "blob visibility listener unavailable");
            }
        }
    }
}

impl<P: Host> Effect for BlobAnimation<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Blob
    }

    fn state(&self) -> EffectState {
        self.inner
            .as_ref()
            .map_or(EffectState::Inert, |cell| cell.borrow().lifecycle.state)
    }

    fn start(&mut self) {
        if let Some(cell) = &self.inner {
            if begin(cell) {
                Self::watch_visibility(cell);
            }
        }
    }

    fn pause(&mut self) {
        if let Some(cell) = &self.inner {
            suspend(cell);
            cell.borrow_mut().paused_by_visibility = false;
        }
    }

    fn resume(&mut self) {
        if let Some(cell) = &self.inner {
            cell.borrow_mut().paused_by_visibility = false;
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
        let (host, wrapper, subscription) = {
            let mut state = cell.borrow_mut();
            state.particles.clear();
            (
                Rc::clone(&state.host),
                state.wrapper.clone(),
                state.visibility.take(),
            )
        };
        drop(subscription);
        host.remove_node(&wrapper);
    }
}
