//! JavaScript entry points.
//!
//! Loading the module boots the page with default options. Scripts can
//! reboot with a JSON configuration, pause or tear everything down, and
//! construct any controller on content inserted after boot. Controller
//! constructors take a selector and an optional JSON object merged over
//! the family defaults, and start immediately.

use crate::bootstrap::{Bootstrapper, LiquidEffects};
use crate::config::{merge_overrides, EffectsConfig};
use crate::effects::{self, Effect, EffectContext, Target};
use crate::host::BrowserHost;
use crate::result::FxError;
use crate::telemetry::{init_logging, LogFormat, DEFAULT_FILTER};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

thread_local! {
    static REGISTRY: RefCell<Option<Rc<RefCell<LiquidEffects>>>> = const { RefCell::new(None) };
}

fn to_js(err: FxError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn boot(config: EffectsConfig) -> Result<(), JsValue> {
    let host = Rc::new(BrowserHost::new().map_err(to_js)?);
    let bootstrapper = Bootstrapper::new(host, config);
    let previous = REGISTRY.with(|slot| slot.borrow_mut().take());
    let registry = match previous {
        Some(previous) => {
            let mut guard = previous.borrow_mut();
            bootstrapper.reboot(&mut guard)
        }
        None => bootstrapper.boot_when_ready(),
    }
    .map_err(to_js)?;
    REGISTRY.with(|slot| *slot.borrow_mut() = Some(registry));
    Ok(())
}

fn context() -> Result<EffectContext<BrowserHost>, JsValue> {
    Ok(EffectContext::new(Rc::new(BrowserHost::new().map_err(to_js)?)))
}

fn options<T>(defaults: &T, overrides: Option<String>) -> Result<T, JsValue>
where
    T: Serialize + DeserializeOwned + Clone,
{
    merge_overrides(defaults, overrides.as_deref().unwrap_or_default()).map_err(to_js)
}

fn with_registry(f: impl FnOnce(&mut LiquidEffects)) {
    let registry = REGISTRY.with(|slot| slot.borrow().clone());
    if let Some(registry) = registry {
        f(&mut registry.borrow_mut());
    }
}

/// Boot with default options once the module is loaded
#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    init_logging(DEFAULT_FILTER, LogFormat::Text);
    boot(EffectsConfig::default())
}

/// Tear everything down and boot again with a JSON configuration
#[wasm_bindgen]
pub fn reboot(config_json: &str) -> Result<(), JsValue> {
    let config = EffectsConfig::from_json(config_json).map_err(to_js)?;
    boot(config)
}

/// Pause every running effect
#[wasm_bindgen(js_name = pauseAll)]
pub fn pause_all() {
    with_registry(LiquidEffects::pause_all);
}

/// Resume every paused effect
#[wasm_bindgen(js_name = resumeAll)]
pub fn resume_all() {
    with_registry(LiquidEffects::resume_all);
}

/// Remove every effect from the page
#[wasm_bindgen(js_name = destroyAll)]
pub fn destroy_all() {
    with_registry(LiquidEffects::destroy_all);
}

/// Number of live effects
#[wasm_bindgen(js_name = effectCount)]
pub fn effect_count() -> usize {
    REGISTRY.with(|slot| slot.borrow().as_ref().map_or(0, |r| r.borrow().len()))
}

/// Default configuration as JSON
#[wasm_bindgen(js_name = defaultConfig)]
pub fn default_config() -> Result<String, JsValue> {
    EffectsConfig::default().to_json().map_err(to_js)
}

// Lifecycle methods shared by every exported controller
macro_rules! lifecycle_methods {
    ($wrapper:ident, $js:ident) => {
        #[wasm_bindgen(js_class = $js)]
        impl $wrapper {
            /// Suspend without losing state
            pub fn pause(&mut self) {
                self.inner.pause();
            }

            /// Continue after `pause()`
            pub fn resume(&mut self) {
                self.inner.resume();
            }

            /// Remove everything the controller added
            pub fn destroy(&mut self) {
                self.inner.destroy();
            }

            /// Lifecycle state name
            #[wasm_bindgen(getter)]
            pub fn state(&self) -> String {
                self.inner.state().to_string()
            }
        }
    };
}

/// Morphing blobs for one container
#[derive(Debug)]
#[wasm_bindgen(js_name = BlobAnimation)]
pub struct WasmBlobAnimation {
    inner: effects::BlobAnimation<BrowserHost>,
}

#[wasm_bindgen(js_class = BlobAnimation)]
impl WasmBlobAnimation {
    /// Mount and start blobs in the element matching `selector`
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, options_json: Option<String>) -> Result<WasmBlobAnimation, JsValue> {
        let options = options(&EffectsConfig::default().blob, options_json)?;
        let mut inner = effects::BlobAnimation::new(&context()?, Target::from(selector), options);
        inner.start();
        Ok(Self { inner })
    }
}

lifecycle_methods!(WasmBlobAnimation, BlobAnimation);

/// Layered wave for one container
#[derive(Debug)]
#[wasm_bindgen(js_name = WaveAnimation)]
pub struct WasmWaveAnimation {
    inner: effects::WaveAnimation<BrowserHost>,
}

#[wasm_bindgen(js_class = WaveAnimation)]
impl WasmWaveAnimation {
    /// Mount and start a wave in the element matching `selector`
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, options_json: Option<String>) -> Result<WasmWaveAnimation, JsValue> {
        let options = options(&EffectsConfig::default().wave, options_json)?;
        let mut inner = effects::WaveAnimation::new(&context()?, Target::from(selector), options);
        inner.start();
        Ok(Self { inner })
    }
}

lifecycle_methods!(WasmWaveAnimation, WaveAnimation);

/// Rising bubbles for one container
#[derive(Debug)]
#[wasm_bindgen(js_name = BubbleEffect)]
pub struct WasmBubbleEffect {
    inner: effects::BubbleEffect<BrowserHost>,
}

#[wasm_bindgen(js_class = BubbleEffect)]
impl WasmBubbleEffect {
    /// Mount bubbles in the element matching `selector`
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, options_json: Option<String>) -> Result<WasmBubbleEffect, JsValue> {
        let options = options(&EffectsConfig::default().bubbles, options_json)?;
        let mut inner = effects::BubbleEffect::new(&context()?, Target::from(selector), options);
        inner.start();
        Ok(Self { inner })
    }
}

lifecycle_methods!(WasmBubbleEffect, BubbleEffect);

/// Click ripples delegated from the document
#[derive(Debug)]
#[wasm_bindgen(js_name = RippleEffect)]
pub struct WasmRippleEffect {
    inner: effects::RippleEffect<BrowserHost>,
}

#[wasm_bindgen(js_class = RippleEffect)]
impl WasmRippleEffect {
    /// Ripple every click inside an element matching `selector`
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, options_json: Option<String>) -> Result<WasmRippleEffect, JsValue> {
        let options = options(&EffectsConfig::default().ripple, options_json)?;
        let mut inner = effects::RippleEffect::new(&context()?, selector, options);
        inner.start();
        Ok(Self { inner })
    }
}

lifecycle_methods!(WasmRippleEffect, RippleEffect);

/// 3D tilt on hover
#[derive(Debug)]
#[wasm_bindgen(js_name = LiquidHover)]
pub struct WasmLiquidHover {
    inner: effects::LiquidHover<BrowserHost>,
}

#[wasm_bindgen(js_class = LiquidHover)]
impl WasmLiquidHover {
    /// Tilt every element matching `selector`
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str, options_json: Option<String>) -> Result<WasmLiquidHover, JsValue> {
        let options = options(&EffectsConfig::default().hover, options_json)?;
        let mut inner = effects::LiquidHover::new(&context()?, selector, options);
        inner.start();
        Ok(Self { inner })
    }
}

lifecycle_methods!(WasmLiquidHover, LiquidHover);

/// Per-character reveal on scroll
#[derive(Debug)]
#[wasm_bindgen(js_name = LiquidTextReveal)]
pub struct WasmLiquidTextReveal {
    inner: effects::LiquidTextReveal<BrowserHost>,
}

#[wasm_bindgen(js_class = LiquidTextReveal)]
impl WasmLiquidTextReveal {
    /// Split and observe every element matching `selector`
    #[wasm_bindgen(constructor)]
    pub fn new(
        selector: &str,
        options_json: Option<String>,
    ) -> Result<WasmLiquidTextReveal, JsValue> {
        let options = options(&EffectsConfig::default().text, options_json)?;
        let mut inner = effects::LiquidTextReveal::new(&context()?, selector, options);
        inner.start();
        Ok(Self { inner })
    }
}

lifecycle_methods!(WasmLiquidTextReveal, LiquidTextReveal);

/// Pointer cursor with trail
#[derive(Debug)]
#[wasm_bindgen(js_name = LiquidCursor)]
pub struct WasmLiquidCursor {
    inner: effects::LiquidCursor<BrowserHost>,
}

#[wasm_bindgen(js_class = LiquidCursor)]
impl WasmLiquidCursor {
    /// Mount the cursor if the page carries the cursor marker
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<WasmLiquidCursor, JsValue> {
        let options = options(&EffectsConfig::default().cursor, options_json)?;
        let mut inner = effects::LiquidCursor::new(&context()?, options);
        inner.start();
        Ok(Self { inner })
    }
}

lifecycle_methods!(WasmLiquidCursor, LiquidCursor);

/// Loading indicator for scripts
#[derive(Debug)]
#[wasm_bindgen(js_name = DropletLoader)]
pub struct WasmDropletLoader {
    inner: effects::DropletLoader<BrowserHost>,
}

#[wasm_bindgen(js_class = DropletLoader)]
impl WasmDropletLoader {
    /// Mount a loader at the end of the element matching `selector`
    #[wasm_bindgen(constructor)]
    pub fn new(selector: &str) -> Result<WasmDropletLoader, JsValue> {
        let mut inner = effects::DropletLoader::new(&context()?, Target::from(selector));
        if inner.state().is_inert() {
            return Err(to_js(FxError::ContainerNotFound {
                selector: selector.to_string(),
            }));
        }
        inner.start();
        Ok(Self { inner })
    }

    /// Show the loader
    pub fn show(&self) {
        self.inner.show();
    }

    /// Hide the loader
    pub fn hide(&self) {
        self.inner.hide();
    }

    /// Remove the loader from the page
    pub fn destroy(&mut self) {
        self.inner.destroy();
    }
}
