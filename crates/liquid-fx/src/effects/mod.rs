//! Effect controllers and their shared lifecycle.
//!
//! Every controller follows the same shape:
//!
//! 1. The constructor resolves its target, checks the motion gate and its
//!    options, then mounts its DOM subtree. Any failure leaves the instance
//!    [`EffectState::Inert`] with nothing mounted or scheduled.
//! 2. [`Effect::start`] begins frame loops and attaches listeners.
//! 3. [`Effect::pause`] / [`Effect::resume`] suspend and continue without
//!    losing state.
//! 4. [`Effect::destroy`] cancels everything and removes what was mounted.
//!
//! Continuous effects keep their state in `Rc<RefCell<_>>` and implement
//! `Animate`; the frame callback holds only a `Weak`, so a dropped effect
//! stops on its next frame.

pub mod blob;
pub mod bubble;
pub mod cursor;
pub mod droplet;
pub mod hover;
pub mod ripple;
pub mod text_reveal;
pub mod wave;

pub use blob::{BlobAnimation, BlobParticle};
pub use bubble::{BubbleEffect, BubbleParticle};
pub use cursor::{LiquidCursor, TrailChain};
pub use droplet::DropletLoader;
pub use hover::{neutral_transform, tilt_transform, LiquidHover};
pub use ripple::RippleEffect;
pub use text_reveal::LiquidTextReveal;
pub use wave::{wave_path, WaveAnimation};

use crate::host::{FrameHandle, Host};
use crate::motion::MotionPreference;
use crate::result::{FxError, FxResult};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Unique identifier of one effect instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(Uuid);

impl EffectId {
    /// Generate a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Effect family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectFamily {
    /// Morphing background blobs
    Blob,
    /// Layered SVG wave
    Wave,
    /// Rising bubbles
    Bubbles,
    /// Click ripples
    Ripple,
    /// 3D hover tilt
    Hover,
    /// Per-character text reveal
    TextReveal,
    /// Pointer trail
    Cursor,
    /// Loading indicator
    Droplet,
}

impl EffectFamily {
    /// Short name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Wave => "wave",
            Self::Bubbles => "bubbles",
            Self::Ripple => "ripple",
            Self::Hover => "hover",
            Self::TextReveal => "text",
            Self::Cursor => "cursor",
            Self::Droplet => "droplet",
        }
    }

    /// Opt-in marker attribute, if the family has one
    #[must_use]
    pub const fn marker(self) -> Option<&'static str> {
        match self {
            Self::Blob => Some("data-liquid-blob"),
            Self::Wave => Some("data-liquid-wave"),
            Self::Bubbles => Some("data-liquid-bubbles"),
            Self::Ripple => Some("data-ripple"),
            Self::Hover => Some("data-liquid-hover"),
            Self::TextReveal => Some("data-liquid-text"),
            Self::Cursor => Some("data-liquid-cursor"),
            Self::Droplet => None,
        }
    }
}

impl fmt::Display for EffectFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an effect instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectState {
    /// Nothing mounted, nothing scheduled; every operation is a no-op
    Inert,
    /// DOM mounted, not started
    Mounted,
    /// Loops and listeners active
    Running,
    /// Suspended by `pause()` or a hidden document
    Paused,
    /// Rendered once under reduced motion; never animates
    Static,
    /// A frame failed; the loop stopped and will not restart
    Halted,
    /// Torn down
    Destroyed,
}

impl EffectState {
    /// Whether the instance never mounted
    #[must_use]
    pub const fn is_inert(self) -> bool {
        matches!(self, Self::Inert)
    }

    /// Lowercase name, as reported to scripts
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inert => "inert",
            Self::Mounted => "mounted",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Static => "static",
            Self::Halted => "halted",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for EffectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common lifecycle capability of every effect
pub trait Effect: fmt::Debug {
    /// Instance id
    fn id(&self) -> EffectId;

    /// Effect family
    fn family(&self) -> EffectFamily;

    /// Current lifecycle state
    fn state(&self) -> EffectState;

    /// Begin loops and attach listeners; only acts on a mounted instance
    fn start(&mut self);

    /// Suspend without losing state
    fn pause(&mut self);

    /// Continue after `pause()`
    fn resume(&mut self);

    /// Cancel everything and remove mounted nodes; idempotent
    fn destroy(&mut self);
}

/// Shared, read-only inputs handed to every constructor
#[derive(Debug)]
pub struct EffectContext<P: Host> {
    host: Rc<P>,
    motion: MotionPreference,
}

impl<P: Host> Clone for EffectContext<P> {
    fn clone(&self) -> Self {
        Self {
            host: Rc::clone(&self.host),
            motion: self.motion,
        }
    }
}

impl<P: Host> EffectContext<P> {
    /// Create a context, reading the motion preference from the host once
    #[must_use]
    pub fn new(host: Rc<P>) -> Self {
        let motion = MotionPreference::detect(host.as_ref());
        Self { host, motion }
    }

    /// Create a context with an explicit motion preference
    #[must_use]
    pub const fn with_motion(host: Rc<P>, motion: MotionPreference) -> Self {
        Self { host, motion }
    }

    /// Host handle
    #[must_use]
    pub const fn host(&self) -> &Rc<P> {
        &self.host
    }

    /// Resolved motion preference
    #[must_use]
    pub const fn motion(&self) -> MotionPreference {
        self.motion
    }

    /// Shorthand for `motion().is_reduced()`
    #[must_use]
    pub const fn reduced_motion(&self) -> bool {
        self.motion.is_reduced()
    }
}

/// Container given to a constructor: a node or a selector
#[derive(Debug, Clone, PartialEq)]
pub enum Target<N> {
    /// An element handle
    Node(N),
    /// A selector resolved with `query_selector`
    Selector(String),
}

impl<N: Clone> Target<N> {
    /// Resolve to an element
    ///
    /// # Errors
    ///
    /// Returns [`FxError::ContainerNotFound`] if the selector matches nothing
    pub fn resolve<P: Host<Node = N>>(&self, host: &P) -> FxResult<N> {
        match self {
            Self::Node(node) => Ok(node.clone()),
            Self::Selector(selector) => {
                host.query_selector(selector)
                    .ok_or_else(|| FxError::ContainerNotFound {
                        selector: selector.clone(),
                    })
            }
        }
    }
}

impl<N> From<&str> for Target<N> {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl<N> From<String> for Target<N> {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

// ============================================================================
// Frame loop
// ============================================================================

/// Identity, state and pending frame of one instance
#[derive(Debug)]
pub(crate) struct Lifecycle {
    pub(crate) id: EffectId,
    pub(crate) family: EffectFamily,
    pub(crate) state: EffectState,
    pub(crate) frame: Option<FrameHandle>,
}

impl Lifecycle {
    pub(crate) const fn new(id: EffectId, family: EffectFamily, state: EffectState) -> Self {
        Self {
            id,
            family,
            state,
            frame: None,
        }
    }
}

/// State of a continuously animated effect
pub(crate) trait Animate: 'static {
    type Host: Host;

    fn host(&self) -> &Rc<Self::Host>;

    fn lifecycle(&self) -> &Lifecycle;

    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// Advance one frame and write the result to the DOM
    fn on_frame(&mut self) -> FxResult<()>;
}

/// Run one frame now and, if it succeeds, schedule the next
pub(crate) fn tick<A: Animate>(cell: &Rc<RefCell<A>>) {
    let outcome = {
        let mut inner = cell.borrow_mut();
        inner.lifecycle_mut().frame = None;
        if inner.lifecycle().state != EffectState::Running {
            return;
        }
        inner.on_frame()
    };
    match outcome {
        Ok(()) => request_next(cell),
        Err(err) => {
            let mut inner = cell.borrow_mut();
            let lifecycle = inner.lifecycle_mut();
            lifecycle.state = EffectState::Halted;
            tracing::warn!(
                effect = %lifecycle.id,
                family = %lifecycle.family,
                error = %err,
                "frame failed, loop halted"
            );
        }
    }
}

fn request_next<A: Animate>(cell: &Rc<RefCell<A>>) {
    let host = Rc::clone(cell.borrow().host());
    let weak = Rc::downgrade(cell);
    let handle = host.request_frame(Box::new(move |_timestamp| {
        if let Some(cell) = weak.upgrade() {
            tick(&cell);
        }
    }));
    cell.borrow_mut().lifecycle_mut().frame = Some(handle);
}

/// Drop the pending frame, if any
pub(crate) fn cancel<A: Animate>(cell: &Rc<RefCell<A>>) {
    let (host, handle) = {
        let mut inner = cell.borrow_mut();
        let handle = inner.lifecycle_mut().frame.take();
        (Rc::clone(inner.host()), handle)
    };
    if let Some(handle) = handle {
        host.cancel_frame(handle);
    }
}

/// `Mounted` to `Running`; the first frame runs synchronously
pub(crate) fn begin<A: Animate>(cell: &Rc<RefCell<A>>) -> bool {
    if !transition(cell, EffectState::Mounted, EffectState::Running) {
        return false;
    }
    log_transition(cell, "started");
    tick(cell);
    true
}

/// `Running` to `Paused`
pub(crate) fn suspend<A: Animate>(cell: &Rc<RefCell<A>>) -> bool {
    if !transition(cell, EffectState::Running, EffectState::Paused) {
        return false;
    }
    cancel(cell);
    log_transition(cell, "paused");
    true
}

/// `Paused` to `Running`
pub(crate) fn proceed<A: Animate>(cell: &Rc<RefCell<A>>) -> bool {
    if !transition(cell, EffectState::Paused, EffectState::Running) {
        return false;
    }
    log_transition(cell, "resumed");
    tick(cell);
    true
}

/// Cancel the loop and mark destroyed; false if already destroyed
pub(crate) fn finish<A: Animate>(cell: &Rc<RefCell<A>>) -> bool {
    if cell.borrow().lifecycle().state == EffectState::Destroyed {
        return false;
    }
    cancel(cell);
    cell.borrow_mut().lifecycle_mut().state = EffectState::Destroyed;
    log_transition(cell, "destroyed");
    true
}

fn transition<A: Animate>(cell: &Rc<RefCell<A>>, from: EffectState, to: EffectState) -> bool {
    let mut inner = cell.borrow_mut();
    let lifecycle = inner.lifecycle_mut();
    if lifecycle.state != from {
        return false;
    }
    lifecycle.state = to;
    true
}

fn log_transition<A: Animate>(cell: &Rc<RefCell<A>>, what: &'static str) {
    let inner = cell.borrow();
    let lifecycle = inner.lifecycle();
    tracing::debug!(effect = %lifecycle.id, family = %lifecycle.family, "{what}");
}

/// Log why an instance stays inert
pub(crate) fn log_inert(family: EffectFamily, id: EffectId, reason: &FxError) {
    match reason {
        FxError::InvalidOptions { .. } | FxError::Json(_) | FxError::Dom { .. } => {
            tracing::warn!(effect = %id, %family, reason = %reason, "effect inert");
        }
        _ => tracing::debug!(effect = %id, %family, reason = %reason, "effect inert"),
    }
}

/// Render a number the way inline styles expect (`-0` prints as `0`)
pub(crate) fn num(value: f64) -> f64 {
    value + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;

    #[derive(Debug)]
    struct Counter {
        host: Rc<MockHost>,
        lifecycle: Lifecycle,
        frames: u32,
        fail_at: Option<u32>,
    }

    impl Animate for Counter {
        type Host = MockHost;

        fn host(&self) -> &Rc<MockHost> {
            &self.host
        }

        fn lifecycle(&self) -> &Lifecycle {
            &self.lifecycle
        }

        fn lifecycle_mut(&mut self) -> &mut Lifecycle {
            &mut self.lifecycle
        }

        fn on_frame(&mut self) -> FxResult<()> {
            self.frames += 1;
            if Some(self.frames) == self.fail_at {
                return Err(FxError::Detached);
            }
            Ok(())
        }
    }

    fn counter(host: &Rc<MockHost>, fail_at: Option<u32>) -> Rc<RefCell<Counter>> {
        Rc::new(RefCell::new(Counter {
            host: Rc::clone(host),
            lifecycle: Lifecycle::new(EffectId::new(), EffectFamily::Blob, EffectState::Mounted),
            frames: 0,
            fail_at,
        }))
    }

    #[test]
    fn test_begin_runs_first_frame_synchronously() {
        let host = Rc::new(MockHost::new());
        let cell = counter(&host, None);
        assert!(begin(&cell));
        assert_eq!(cell.borrow().frames, 1);
        assert_eq!(host.pending_frames(), 1);
        host.advance_frames(3);
        assert_eq!(cell.borrow().frames, 4);
        assert!(!begin(&cell));
    }

    #[test]
    fn test_suspend_and_proceed() {
        let host = Rc::new(MockHost::new());
        let cell = counter(&host, None);
        begin(&cell);
        assert!(suspend(&cell));
        assert_eq!(host.pending_frames(), 0);
        host.advance_frames(5);
        assert_eq!(cell.borrow().frames, 1);
        assert!(!suspend(&cell));

        assert!(proceed(&cell));
        assert_eq!(cell.borrow().frames, 2);
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn test_failed_frame_halts_only_that_loop() {
        let host = Rc::new(MockHost::new());
        let failing = counter(&host, Some(2));
        let healthy = counter(&host, None);
        begin(&failing);
        begin(&healthy);
        host.advance_frames(4);
        assert_eq!(failing.borrow().lifecycle.state, EffectState::Halted);
        assert_eq!(failing.borrow().frames, 2);
        assert_eq!(healthy.borrow().frames, 5);
        assert!(!proceed(&failing));
    }

    #[test]
    fn test_dropped_state_stops_loop() {
        let host = Rc::new(MockHost::new());
        let cell = counter(&host, None);
        begin(&cell);
        drop(cell);
        assert_eq!(host.advance_frame(), 1);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let host = Rc::new(MockHost::new());
        let cell = counter(&host, None);
        begin(&cell);
        assert!(finish(&cell));
        assert!(!finish(&cell));
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_target_resolve() {
        let host = MockHost::new();
        let hero = host.add_to_body("section", &[("id", "hero")]);
        assert_eq!(Target::from("#hero").resolve(&host).unwrap(), hero);
        assert_eq!(Target::Node(hero).resolve(&host).unwrap(), hero);
        assert!(matches!(
            Target::<crate::host::NodeId>::from("#missing").resolve(&host),
            Err(FxError::ContainerNotFound { .. })
        ));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(EffectState::Running.as_str(), "running");
        assert_eq!(EffectState::Static.to_string(), "static");
        assert_eq!(EffectState::Destroyed.to_string(), "destroyed");
    }

    #[test]
    fn test_family_markers() {
        assert_eq!(EffectFamily::Blob.marker(), Some("data-liquid-blob"));
        assert_eq!(EffectFamily::Ripple.marker(), Some("data-ripple"));
        assert_eq!(EffectFamily::Droplet.marker(), None);
        assert_eq!(EffectFamily::TextReveal.to_string(), "text");
    }

    #[test]
    fn test_effect_ids_unique() {
        assert_ne!(EffectId::new(), EffectId::new());
    }

    #[test]
    fn test_num_normalizes_negative_zero() {
        assert_eq!(format!("{}", num(-0.0)), "0");
        assert_eq!(format!("{}", num(-2.5)), "-2.5");
    }
}
