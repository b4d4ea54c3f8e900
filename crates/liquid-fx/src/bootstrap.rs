//! Page bootstrap.
//!
//! Runs once the document is parsed: injects the shared stylesheet, starts
//! the page-wide controllers (ripple, hover, text reveal, cursor) and one
//! blob, wave or bubble instance per element carrying the family marker.
//! A marker whose value is a JSON object overrides the family defaults for
//! that element only, e.g. `data-liquid-blob='{"count":3}'`.

use crate::config::{merge_overrides, EffectsConfig};
use crate::effects::{
    BlobAnimation, BubbleEffect, Effect, EffectContext, EffectFamily, EffectId, LiquidCursor,
    LiquidHover, LiquidTextReveal, RippleEffect, Target, WaveAnimation,
};
use crate::effects::{hover, ripple, text_reveal};
use crate::host::{EventKind, Host, ListenTarget};
use crate::result::FxResult;
use crate::style::StyleInjector;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Registry of running effects
#[derive(Debug, Default)]
pub struct LiquidEffects {
    effects: Vec<Box<dyn Effect>>,
}

impl LiquidEffects {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect
    pub fn push(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Number of registered effects
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Registered effects, in boot order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Effect> {
        self.effects.iter().map(|e| e.as_ref())
    }

    /// Ids of registered effects
    #[must_use]
    pub fn ids(&self) -> Vec<EffectId> {
        self.effects.iter().map(|e| e.id()).collect()
    }

    /// Number of registered effects of one family
    #[must_use]
    pub fn count_of(&self, family: EffectFamily) -> usize {
        self.effects.iter().filter(|e| e.family() == family).count()
    }

    /// Pause every effect
    pub fn pause_all(&mut self) {
        for effect in &mut self.effects {
            effect.pause();
        }
    }

    /// Resume every effect
    pub fn resume_all(&mut self) {
        for effect in &mut self.effects {
            effect.resume();
        }
    }

    /// Destroy every effect and empty the registry
    pub fn destroy_all(&mut self) {
        for effect in &mut self.effects {
            effect.destroy();
        }
        let count = self.effects.len();
        self.effects.clear();
        tracing::info!(effects = count, "liquid effects destroyed");
    }
}

/// Scans the page and starts effects
#[derive(Debug)]
pub struct Bootstrapper<P: Host> {
    ctx: EffectContext<P>,
    config: EffectsConfig,
}

impl<P: Host> Bootstrapper<P> {
    /// Resolve the motion preference and keep the configuration
    ///
    /// A preference forced in the configuration wins over the media query.
    #[must_use]
    pub fn new(host: Rc<P>, config: EffectsConfig) -> Self {
        let ctx = match config.motion {
            Some(motion) => EffectContext::with_motion(host, motion),
            None => EffectContext::new(host),
        };
        Self::with_context(ctx, config)
    }

    /// Use an already resolved context
    #[must_use]
    pub const fn with_context(ctx: EffectContext<P>, config: EffectsConfig) -> Self {
        Self { ctx, config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &EffectsConfig {
        &self.config
    }

    /// Start everything the page asks for, right now
    ///
    /// Only effects that mounted are kept in the returned registry.
    pub fn boot(&self) -> LiquidEffects {
        let host = self.ctx.host();
        if let Err(err) = StyleInjector::inject(host.as_ref(), &self.config) {
            tracing::warn!(error = %err, "stylesheet not injected");
        }

        let mut effects = LiquidEffects::new();
        let ctx = &self.ctx;
        let config = &self.config;
        register(
            &mut effects,
            RippleEffect::new(ctx, ripple::DEFAULT_SELECTOR, config.ripple.clone()),
        );
        register(
            &mut effects,
            LiquidHover::new(ctx, hover::DEFAULT_SELECTOR, config.hover.clone()),
        );
        register(
            &mut effects,
            LiquidTextReveal::new(ctx, text_reveal::DEFAULT_SELECTOR, config.text.clone()),
        );
        register(&mut effects, LiquidCursor::new(ctx, config.cursor.clone()));

        self.per_marker(&mut effects, EffectFamily::Blob, &config.blob, |ctx, node, options| {
            BlobAnimation::new(ctx, Target::Node(node), options)
        });
        self.per_marker(&mut effects, EffectFamily::Wave, &config.wave, |ctx, node, options| {
            WaveAnimation::new(ctx, Target::Node(node), options)
        });
        self.per_marker(
            &mut effects,
            EffectFamily::Bubbles,
            &config.bubbles,
            |ctx, node, options| BubbleEffect::new(ctx, Target::Node(node), options),
        );

        tracing::info!(
            effects = effects.len(),
            reduced_motion = self.ctx.reduced_motion(),
            "liquid effects booted"
        );
        effects
    }

    fn per_marker<T, E>(
        &self,
        effects: &mut LiquidEffects,
        family: EffectFamily,
        defaults: &T,
        build: impl Fn(&EffectContext<P>, P::Node, T) -> E,
    ) where
        T: Serialize + DeserializeOwned + Clone,
        E: Effect + 'static,
    {
        let Some(marker) = family.marker() else {
            return;
        };
        let host = self.ctx.host();
        for node in host.query_selector_all(&format!("[{marker}]")) {
            let overrides = host.attribute(&node, marker).unwrap_or_default();
            let options = merge_overrides(defaults, &overrides).unwrap_or_else(|err| {
                tracing::warn!(%family, error = %err, "malformed marker options, using defaults");
                defaults.clone()
            });
            register(effects, build(&self.ctx, node, options));
        }
    }

    /// Boot now if the document is parsed, otherwise on `DOMContentLoaded`
    ///
    /// The returned registry is empty until the boot has happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the load listener cannot be attached
    pub fn boot_when_ready(self) -> FxResult<Rc<RefCell<LiquidEffects>>> {
        let host = Rc::clone(self.ctx.host());
        if host.document_ready() {
            return Ok(Rc::new(RefCell::new(self.boot())));
        }

        let registry = Rc::new(RefCell::new(LiquidEffects::new()));
        let slot = Rc::clone(&registry);
        let mut pending = Some(self);
        host.listen(
            ListenTarget::Document,
            EventKind::DomContentLoaded,
            true,
            Box::new(move |_| {
                if let Some(bootstrapper) = pending.take() {
                    let effects = bootstrapper.boot();
                    *slot.borrow_mut() = effects;
                }
            }),
        )?;
        tracing::debug!("document loading, boot deferred");
        Ok(registry)
    }

    /// Destroy `previous`, then boot as [`Bootstrapper::boot_when_ready`]
    ///
    /// Teardown runs first so restored text and cleared styles never land
    /// on the nodes the new instances just set up.
    ///
    /// # Errors
    ///
    /// Returns an error if the load listener cannot be attached
    pub fn reboot(self, previous: &mut LiquidEffects) -> FxResult<Rc<RefCell<LiquidEffects>>> {
        previous.destroy_all();
        self.boot_when_ready()
    }
}

fn register<E: Effect + 'static>(effects: &mut LiquidEffects, mut effect: E) {
    effect.start();
    if effect.state().is_inert() {
        return;
    }
    effects.push(Box::new(effect));
}
