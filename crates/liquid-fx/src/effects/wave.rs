//! Layered SVG wave.
//!
//! One `<svg class="liquid-wave">` with a `0 0 1440 320` viewBox holds one
//! filled path per layer. Each layer samples a sine across the width with
//! its own phase offset; the shared phase advances every frame.
//!
//! Under reduced motion the paths are drawn once at phase 0 and never
//! updated.

use super::{
    begin, finish, log_inert, proceed, suspend, Animate, Effect, EffectContext, EffectFamily,
    EffectId, EffectState, Lifecycle, Target,
};
use crate::config::WaveOptions;
use crate::host::Host;
use crate::result::FxResult;
use std::cell::RefCell;
use std::f64::consts::PI;
use std::fmt::Write as _;
use std::rc::Rc;

/// ViewBox width
pub const VIEW_WIDTH: u32 = 1440;
/// ViewBox height
pub const VIEW_HEIGHT: u32 = 320;
/// Resting line of the wave
pub const BASELINE: f64 = 160.0;
/// Horizontal sampling step
pub const STEP: usize = 20;

/// Layer fills, cycled by layer index
pub const PALETTE: [&str; 3] = [
    "var(--color-primary, #1a1a1a)",
    "var(--color-secondary, #333)",
    "var(--color-surface, #f5f5f5)",
];

/// SVG path data for one layer at `phase`
///
/// Always starts with `M0,160` and closes along the bottom edge with
/// ` L1440,320 L0,320 Z`.
#[must_use]
pub fn wave_path(amplitude: f64, frequency: f64, phase: f64) -> String {
    let mut d = String::with_capacity(1200);
    d.push_str("M0,160");
    for x in (0..=VIEW_WIDTH as usize).step_by(STEP) {
        let y = BASELINE + (x as f64 * frequency + phase).sin() * amplitude;
        let _ = write!(d, " L{x},{y}");
    }
    d.push_str(" L1440,320 L0,320 Z");
    d
}

/// Phase offset of layer `index`
#[must_use]
pub fn layer_offset(index: usize) -> f64 {
    index as f64 * PI / 3.0
}

#[derive(Debug)]
struct WaveState<P: Host> {
    host: Rc<P>,
    lifecycle: Lifecycle,
    options: WaveOptions,
    svg: P::Node,
    paths: Vec<P::Node>,
    phase: f64,
}

impl<P: Host> WaveState<P> {
    fn render(&self) -> FxResult<()> {
        for (index, path) in self.paths.iter().enumerate() {
            let d = wave_path(
                self.options.amplitude,
                self.options.frequency,
                self.phase + layer_offset(index),
            );
            self.host.set_attribute(path, "d", &d)?;
        }
        Ok(())
    }
}

impl<P: Host> Animate for WaveState<P> {
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
        self.phase += self.options.speed;
        self.render()
    }
}

/// Wave divider controller
#[derive(Debug)]
pub struct WaveAnimation<P: Host> {
    id: EffectId,
    inner: Option<Rc<RefCell<WaveState<P>>>>,
}

impl<P: Host> WaveAnimation<P> {
    /// Mount the wave into `target`
    ///
    /// Under reduced motion the wave is drawn once and stays
    /// [`EffectState::Static`].
    pub fn new(ctx: &EffectContext<P>, target: Target<P::Node>, options: WaveOptions) -> Self {
        let id = EffectId::new();
        match Self::mount(ctx, id, &target, options) {
            Ok(state) => Self {
                id,
                inner: Some(Rc::new(RefCell::new(state))),
            },
            Err(err) => {
                log_inert(EffectFamily::Wave, id, &err);
                Self { id, inner: None }
            }
        }
    }

    fn mount(
        ctx: &EffectContext<P>,
        id: EffectId,
        target: &Target<P::Node>,
        options: WaveOptions,
    ) -> FxResult<WaveState<P>> {
        options.validate()?;
        let host = ctx.host();
        let container = target.resolve(host.as_ref())?;

        let svg = host.create_svg_element("svg")?;
        host.set_attribute(&svg, "class", "liquid-wave")?;
        host.set_attribute(&svg, "viewBox", &format!("0 0 {VIEW_WIDTH} {VIEW_HEIGHT}"))?;
        host.set_attribute(&svg, "preserveAspectRatio", "none")?;
        host.set_attribute(&svg, "aria-hidden", "true")?;
        host.set_styles(
            &svg,
            &[("width", "100%"), ("height", "100%"), ("display", "block")],
        )?;

        let mut paths = Vec::with_capacity(options.layers);
        for index in 0..options.layers {
            let path = host.create_svg_element("path")?;
            host.set_attribute(&path, "fill", PALETTE[index % PALETTE.len()])?;
            let opacity = 1.0 - index as f64 * 0.2;
            host.set_style(&path, "opacity", &opacity.to_string())?;
            host.append_child(&svg, &path)?;
            paths.push(path);
        }

        let reduced = ctx.reduced_motion();
        let state = WaveState {
            host: Rc::clone(host),
            lifecycle: Lifecycle::new(
                id,
                EffectFamily::Wave,
                if reduced {
                    EffectState::Static
                } else {
                    EffectState::Mounted
                },
            ),
            options,
            svg,
            paths,
            phase: 0.0,
        };
        if reduced {
            state.render()?;
        }
        host.append_child(&container, &state.svg)?;
        tracing::debug!(effect = %id, family = "wave", layers = state.paths.len(), reduced, "mounted");
        Ok(state)
    }

    /// Path nodes, bottom layer first
    #[must_use]
    pub fn paths(&self) -> Vec<P::Node> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |cell| cell.borrow().paths.clone())
    }

    /// The `<svg>` root
    #[must_use]
    pub fn svg(&self) -> Option<P::Node> {
        self.inner.as_ref().map(|cell| cell.borrow().svg.clone())
    }

    /// Current shared phase
    #[must_use]
    pub fn phase(&self) -> f64 {
        self.inner.as_ref().map_or(0.0, |cell| cell.borrow().phase)
    }
}

impl<P: Host> Effect for WaveAnimation<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Wave
    }

    fn state(&self) -> EffectState {
        self.inner
            .as_ref()
            .map_or(EffectState::Inert, |cell| cell.borrow().lifecycle.state)
    }

    fn start(&mut self) {
        if let Some(cell) = &self.inner {
            begin(cell);
        }
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
        if finish(cell) {
            let state = cell.borrow();
            state.host.remove_node(&state.svg);
        }
    }
}
