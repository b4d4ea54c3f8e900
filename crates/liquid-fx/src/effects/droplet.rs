//! Droplet loading indicator.
//!
//! Three `.droplet` dots bounce through the `droplet-fall` keyframes with
//! staggered delays from the shared stylesheet; the controller only mounts,
//! shows, hides and removes them. Not gated by reduced motion: the
//! stylesheet's reduced-motion block stops the animation instead.

use super::{log_inert, Effect, EffectContext, EffectFamily, EffectId, EffectState, Target};
use crate::host::Host;
use crate::result::FxResult;
use std::rc::Rc;

/// Number of droplets in the loader
pub const DROPLETS: usize = 3;

/// Loading indicator controller
#[derive(Debug)]
pub struct DropletLoader<P: Host> {
    id: EffectId,
    host: Rc<P>,
    state: EffectState,
    element: Option<P::Node>,
    droplets: Vec<P::Node>,
}

impl<P: Host> DropletLoader<P> {
    /// Mount the loader at the end of `target`
    pub fn new(ctx: &EffectContext<P>, target: Target<P::Node>) -> Self {
        let id = EffectId::new();
        let host = Rc::clone(ctx.host());
        match Self::mount(host.as_ref(), &target) {
            Ok((element, droplets)) => {
                tracing::debug!(effect = %id, family = "droplet", "mounted");
                Self {
                    id,
                    host,
                    state: EffectState::Mounted,
                    element: Some(element),
                    droplets,
                }
            }
            Err(err) => {
                log_inert(EffectFamily::Droplet, id, &err);
                Self {
                    id,
                    host,
                    state: EffectState::Inert,
                    element: None,
                    droplets: Vec::new(),
                }
            }
        }
    }

    fn mount(host: &P, target: &Target<P::Node>) -> FxResult<(P::Node, Vec<P::Node>)> {
        let container = target.resolve(host)?;
        let element = host.create_with_class("div", "liquid-droplet-loader")?;
        host.set_attribute(&element, "role", "status")?;
        host.set_attribute(&element, "aria-label", "Loading")?;
        let mut droplets = Vec::with_capacity(DROPLETS);
        for _ in 0..DROPLETS {
            let droplet = host.create_with_class("div", "droplet")?;
            host.append_child(&element, &droplet)?;
            droplets.push(droplet);
        }
        host.append_child(&container, &element)?;
        Ok((element, droplets))
    }

    /// The `.liquid-droplet-loader` element
    #[must_use]
    pub fn element(&self) -> Option<P::Node> {
        self.element.clone()
    }

    /// Make the loader visible
    pub fn show(&self) {
        self.set_display("flex");
    }

    /// Hide the loader
    pub fn hide(&self) {
        self.set_display("none");
    }

    fn set_display(&self, value: &str) {
        if let Some(element) = &self.element {
            if let Err(err) = self.host.set_style(element, "display", value) {
                tracing::warn!(effect = %self.id, error = %err, "loader display not applied");
            }
        }
    }

    fn set_play_state(&self, value: &str) {
        for droplet in &self.droplets {
            if let Err(err) = self.host.set_style(droplet, "animation-play-state", value) {
                tracing::warn!(effect = %self.id, error = %err, "droplet play state not applied");
            }
        }
    }
}

impl<P: Host> Effect for DropletLoader<P> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn family(&self) -> EffectFamily {
        EffectFamily::Droplet
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
        if let Some(element) = self.element.take() {
            self.host.remove_node(&element);
            self.droplets.clear();
            self.state = EffectState::Destroyed;
            tracing::debug!(effect = %self.id, family = "droplet", "destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MockHost;
    use crate::motion::MotionPreference;

    #[test]
    fn test_mount_structure() {
        let host = Rc::new(MockHost::new());
        let slot = host.add_to_body("div", &[("id", "cart-loading")]);
        let ctx = EffectContext::new(Rc::clone(&host));
        let loader = DropletLoader::new(&ctx, Target::from("#cart-loading"));

        let element = loader.element().unwrap();
        assert_eq!(host.parent(element), Some(slot));
        let node = host.node(element).unwrap();
        assert!(node.has_class("liquid-droplet-loader"));
        assert_eq!(node.get_attr("role"), Some("status"));
        assert_eq!(node.get_attr("aria-label"), Some("Loading"));
        let droplets = host.children(element);
        assert_eq!(droplets.len(), 3);
        assert!(droplets
            .iter()
            .all(|d| host.node(*d).unwrap().has_class("droplet")));
    }

    #[test]
    fn test_show_hide() {
        let host = Rc::new(MockHost::new());
        let slot = host.add_to_body("div", &[]);
        let ctx = EffectContext::new(Rc::clone(&host));
        let loader = DropletLoader::new(&ctx, Target::Node(slot));
        let element = loader.element().unwrap();
        loader.hide();
        assert_eq!(host.style(&element, "display").as_deref(), Some("none"));
        loader.show();
        assert_eq!(host.style(&element, "display").as_deref(), Some("flex"));
    }

    #[test]
    fn test_not_gated_by_reduced_motion() {
        let host = Rc::new(MockHost::new());
        let slot = host.add_to_body("div", &[]);
        let ctx = EffectContext::with_motion(Rc::clone(&host), MotionPreference::reduced());
        let loader = DropletLoader::new(&ctx, Target::Node(slot));
        assert_eq!(loader.state(), EffectState::Mounted);
    }

    #[test]
    fn test_destroy_and_missing_container() {
        let host = Rc::new(MockHost::new());
        let slot = host.add_to_body("div", &[]);
        let ctx = EffectContext::new(Rc::clone(&host));
        let mut loader = DropletLoader::new(&ctx, Target::Node(slot));
        loader.start();
        loader.pause();
        loader.destroy();
        assert!(host.children(slot).is_empty());
        assert_eq!(loader.state(), EffectState::Destroyed);
        loader.hide();

        let missing = DropletLoader::new(&ctx, Target::from("#nowhere"));
        assert!(missing.state().is_inert());
        assert!(missing.element().is_none());
    }
}
