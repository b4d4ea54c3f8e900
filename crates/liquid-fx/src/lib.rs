//! Liquid FX: procedural "liquid" motion effects for storefront pages.
//!
//! Pages opt in with marker attributes; the [`Bootstrapper`] finds them once
//! the document is parsed and starts one controller per marked element.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        LIQUID FX                                │
//! ├────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐    │
//! │  │ Bootstrapper │──►│   Effects    │──►│      Host        │    │
//! │  │ marker scan  │   │ blob / wave  │   │ MockHost (tests) │    │
//! │  │ style inject │   │ ripple / ... │   │ BrowserHost (web)│    │
//! │  └──────────────┘   └──────────────┘   └──────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Marker | Effect |
//! |---|---|
//! | `data-liquid-blob` | [`BlobAnimation`] |
//! | `data-liquid-wave` | [`WaveAnimation`] |
//! | `data-liquid-bubbles` | [`BubbleEffect`] |
//! | `data-ripple` | [`RippleEffect`] |
//! | `data-liquid-hover` | [`LiquidHover`] |
//! | `data-liquid-text` | [`LiquidTextReveal`] |
//! | `data-liquid-cursor` | [`LiquidCursor`] |
//!
//! Users who ask for reduced motion get no animation loops: gated effects
//! stay inert and waves render one static frame.
//!
//! # Example
//!
//! ```
//! use liquid_fx::prelude::*;
//! use std::rc::Rc;
//!
//! let host = Rc::new(MockHost::new());
//! host.add_to_body("section", &[("data-liquid-blob", r#"{"count":3}"#)]);
//!
//! let effects = Bootstrapper::new(Rc::clone(&host), EffectsConfig::default()).boot();
//! assert_eq!(effects.count_of(EffectFamily::Blob), 1);
//! assert_eq!(host.query_selector_all(".liquid-blob").len(), 3);
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod bootstrap;
pub mod config;
pub mod css;
pub mod effects;
pub mod host;
pub mod motion;
mod result;
pub mod rng;
pub mod style;
pub mod telemetry;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bootstrap::{Bootstrapper, LiquidEffects};
pub use config::{
    BlobOptions, BubbleOptions, CursorOptions, EffectsConfig, HoverOptions, RippleOptions,
    TextRevealOptions, WaveOptions,
};
pub use effects::{
    BlobAnimation, BubbleEffect, DropletLoader, Effect, EffectContext, EffectFamily, EffectId,
    EffectState, LiquidCursor, LiquidHover, LiquidTextReveal, RippleEffect, Target, WaveAnimation,
};
pub use host::{Host, MockHost};
pub use motion::MotionPreference;
pub use result::{FxError, FxResult};
pub use style::StyleInjector;

#[cfg(feature = "wasm")]
pub use host::BrowserHost;

/// Commonly used items
pub mod prelude {
    pub use crate::bootstrap::{Bootstrapper, LiquidEffects};
    pub use crate::config::EffectsConfig;
    pub use crate::effects::{
        BlobAnimation, BubbleEffect, DropletLoader, Effect, EffectContext, EffectFamily,
        EffectState, LiquidCursor, LiquidHover, LiquidTextReveal, RippleEffect, Target,
        WaveAnimation,
    };
    pub use crate::host::{Host, MockHost};
    pub use crate::motion::MotionPreference;
    pub use crate::result::{FxError, FxResult};
    pub use crate::style::StyleInjector;
}
