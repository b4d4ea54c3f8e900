//! Rising bubbles.
//!
//! Purely declarative: every `.liquid-bubble` gets its size, horizontal
//! position, rise duration and start delay once, and the `bubble-rise`
//! keyframes do the rest. No script work happens per frame.

use super::{log_inert, Effect, EffectContext, EffectFamily, EffectId, EffectState, Target};
use crate::config::BubbleOptions;
use crate::host::Host;
use crate::result::FxResult;
use crate::rng::between;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Parameters of one bubble, never changed after creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleParticle {
    /// Diameter in px
    pub size: f64,
    /// Horizontal position in percent, [0, 100)
    pub left: f64,
    /// Rise duration in seconds
    pub duration: f64,
    /// Start delay in seconds, [0, duration)
    pub delay: f64,
}

impl BubbleParticle {
    /// Draw a bubble from a unit random source
    pub fn sample(mut random: impl FnMut() -> f64, options: &BubbleOptions) -> Self {
        let size = between(random(), options.min_size, options.max_size);
        let duration = between(random(), options.min_duration, options.max_duration);
        let left = random() * 100.0;
        let delay = random() * duration;
        Self {
            size,
            left,
            duration,
            delay,
        }
    }
}

#[derive(Debug)]
struct Mounted<N> {
    wrapper: N,
    bubbles: Vec<(N, BubbleParticle)>,
}

/// Bubble background controller
#[derive(Debug)]
pub struct BubbleEffect<P: Host> {
    id: EffectId,
    host: Rc<P>,
    state: EffectState,
    mounted: Option<Mounted<P::Node>>,
}

impl<P: Host> BubbleEffect<P> {
    /// Mount bubbles into `target`; inert under reduced motion
    pub fn new(ctx: &EffectContext<P>, target: Target<P::Node>, options: BubbleOptions) -> Self {
        let id = EffectId::new();
        let host = Rc::clone(ctx.host());
        if ctx.reduced_motion() {
            tracing::debug!(effect = %id, family = "bubbles", "reduced motion, skipping");
            return Self {
                id,
                host,
                state: EffectState::Inert,
                mounted: None,
            };
        }
        match Self::mount(host.as_ref(), &target, &options) {
            Ok(mounted) => {
                tracing::debug!(effect = %id, family = "bubbles", count = options.count, "mounted");
                Self {
                    id,
                    host,
                    state: EffectState::Mounted,
                    mounted: Some(mounted),
                }
            }
            Err(err) => {
                log_inert(EffectFamily::Bubbles, id, &err);
                Self {
                    id,
                    host,
                    state: EffectState::Inert,
                    mounted: None,
                }
            }
        }
    }

    fn mount(host: &P, target: &Target<P::Node>, options: &BubbleOptions) -> FxResult<Mounted<P::Node>> {
        options.validate()?;
        let container = target.resolve(host)?;

        let wrapper = host.create_with_class("div", "liquid-bubbles")?;
        host.set_attribute(&wrapper, "aria-hidden", "true")?;
        let mut bubbles = Vec::with_capacity(options.count);
        for _ in 0..options.count {
            let particle = BubbleParticle::sample(|| host.random(), options);
            let node = host.create_with_class("div", "liquid-bubble")?;
            let size = format!("{}px", particle.size);
            host.set_styles(
                &node,
                &[
                    ("width", &size),
                    ("height", &size),
                    ("left", &format!("{}%", particle.left)),
                    ("animation-duration", &format!("{}s", particle.duration)),
                    ("animation-delay", &format!("{}s", particle.delay)),
                ],
            )?;
            host.append_child(&wrapper, &node)?;
            bubbles.push((node, particle));
        }

        host.set_style(&container, "position", "relative")?;
        host.append_child(&container, &wrapper)?;
        Ok(Mounted { wrapper, bubbles })
    }

    /// Bubble parameters, in creation order
    #[must_use]
    pub fn particles(&self) -> Vec<BubbleParticle> {
        self.mounted
            .as_ref()
            .map_or_else(Vec::new, |m| m.bubbles.iter().map(|(_, p)| *p).collect())
    }

    /// The `.liquid-bubbles` wrapper
    #[must_use]
    pub fn wrapper(&self) -> Option<P::Node> {
        self.mounted.as_ref().map(|m| m.wrapper.clone())
    }

    fn set_play_state(&self, value: &str) {
        let Some(mounted) = &self.mounted else {
            return;
        };
        for (node, _) in &mounted.bubbles {
            if let Err(err) = self.host.set_style(node, "animation-play-state", value) {
                tracing::warn!(effect = %self.id, error = %err, "bubble play state not applied");
            }
        }
    }
}

impl<P: Host> Effect for BubbleEffect<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Bubbles
    }

    fn state(&self) -> EffectState {
        self.state
    }

    fn start(&mut self) {
        if self.state == EffectState::Mounted {
            self.state = EffectState::Running;
        }
    }

    fn pause(&mut self) {
        if self.state == EffectState::Running {
            self.set_play_state("paused");
            self.state = EffectState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state == EffectState::Paused {
            self.set_play_state("running");
            self.state = EffectState::Running;
        }
    }

    fn destroy(&mut self) {
        if matches!(self.state, EffectState::Inert | EffectState::Destroyed) {
            return;
        }
        if let Some(mounted) = self.mounted.take() {
            self.host.remove_node(&mounted.wrapper);
        }
        self.state = EffectState::Destroyed;
        tracing::debug!(effect = %self.id, family = "bubbles", "destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;
    use crate::motion::MotionPreference;

    #[test]
    fn test_mount_and_parameters() {
        let host = Rc::new(MockHost::new());
        let footer = host.add_to_body("footer", &[("data-liquid-bubbles", "")]);
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut bubbles = BubbleEffect::new(&ctx, Target::Node(footer), BubbleOptions::default());
        assert_eq!(bubbles.state(), EffectState::Mounted);

        let wrapper = bubbles.wrapper().unwrap();
        assert_eq!(host.children(wrapper).len(), 15);
        assert_eq!(host.style(&footer, "position").as_deref(), Some("relative"));

        for p in bubbles.particles() {
            assert!((5.0..20.0).contains(&p.size));
            assert!((5.0..12.0).contains(&p.duration));
            assert!((0.0..p.duration).contains(&p.delay));
            assert!((0.0..100.0).contains(&p.left));
        }

        bubbles.start();
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(bubbles.state(), EffectState::Running);
    }

    #[test]
    fn test_styles_written_once() {
        let host = Rc::new(MockHost::new());
        let footer = host.add_to_body("footer", &[]);
        let ctx = EffectContext::new(Rc::clone(&host));
        let bubbles = BubbleEffect::new(&ctx, Target::Node(footer), BubbleOptions::default());
        let first = host.children(bubbles.wrapper().unwrap())[0];
        let p = bubbles.particles()[0];
        let node = host.node(first).unwrap();
        assert_eq!(node.get_style("width"), Some(format!("{}px", p.size).as_str()));
        assert_eq!(
            node.get_style("animation-delay"),
            Some(format!("{}s", p.delay).as_str())
        );
    }

    #[test]
    fn test_pause_sets_play_state() {
        let host = Rc::new(MockHost::new());
        let footer = host.add_to_body("footer", &[]);
        let ctx = EffectContext::new(Rc::clone(&host));
        let options = BubbleOptions {
            count: 2,
            ..BubbleOptions::default()
        };
        let mut bubbles = BubbleEffect::new(&ctx, Target::Node(footer), options);
        bubbles.start();
        bubbles.pause();
        let first = host.children(bubbles.wrapper().unwrap())[0];
        assert_eq!(host.style(&first, "animation-play-state").as_deref(), Some("paused"));
        bubbles.resume();
        assert_eq!(host.style(&first, "animation-play-state").as_deref(), Some("running"));
    }

    #[test]
    fn test_destroy_removes_wrapper() {
        let host = Rc::new(MockHost::new());
        let footer = host.add_to_body("footer", &[]);
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut bubbles = BubbleEffect::new(&ctx, Target::Node(footer), BubbleOptions::default());
        let wrapper = bubbles.wrapper().unwrap();
        bubbles.destroy();
        assert!(!host.is_connected(wrapper));
        assert!(host.children(footer).is_empty());
        assert_eq!(bubbles.state(), EffectState::Destroyed);
    }

    #[test]
    fn test_reduced_motion_is_inert() {
        let host = Rc::new(MockHost::new());
        let footer = host.add_to_body("footer", &[]);
        let ctx = EffectContext::with_motion(Rc::clone(&host), MotionPreference::reduced());
        let bubbles = BubbleEffect::new(&ctx, Target::Node(footer), BubbleOptions::default());
        assert!(bubbles.state().is_inert());
        assert_eq!(host.mutation_count(), 0);
    }
}
