//! Shared stylesheet injection.
//!
//! Every effect relies on classes and keyframes from one `<style>` element
//! in the document head. [`StyleInjector::inject`] inserts it at most once,
//! keyed by [`STYLE_ID`].

use crate::config::EffectsConfig;
use crate::css::{CssBuilder, CssRule, GeneratedCss};
use crate::host::Host;
use crate::motion::REDUCED_MOTION_QUERY;
use crate::result::{FxError, FxResult};

/// `id` of the injected `<style>` element
pub const STYLE_ID: &str = "liquid-effects-styles";

/// Builds and injects the shared stylesheet
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleInjector;

impl StyleInjector {
    /// Render the stylesheet for a configuration
    ///
    /// Only the ripple keyframes depend on configuration (final diameter is
    /// twice `ripple.maxRadius`).
    ///
    /// # Errors
    ///
    /// Returns an error if a generated block is malformed
    pub fn stylesheet(config: &EffectsConfig) -> FxResult<GeneratedCss> {
        let diameter = format!("{}px", config.ripple.max_radius * 2.0);

        CssBuilder::new()
            .rule(
                CssRule::new(".liquid-blobs")
                    .declaration("position", "absolute")
                    .declaration("inset", "0")
                    .declaration("overflow", "hidden")
                    .declaration("pointer-events", "none")
                    .declaration("z-index", "0"),
            )
            .rule(
                CssRule::new(".liquid-wave-section")
                    .declaration("position", "relative")
                    .declaration("width", "100%")
                    .declaration("height", "150px"),
            )
            .keyframes(
                "liquid-ripple-expand",
                vec![CssRule::new("to")
                    .declaration("width", &diameter)
                    .declaration("height", &diameter)
                    .declaration("opacity", "0")],
            )
            .rule(
                CssRule::new(".liquid-droplet-loader")
                    .declaration("display", "flex")
                    .declaration("gap", "8px")
                    .declaration("align-items", "flex-end")
                    .declaration("justify-content", "center")
                    .declaration("padding", "20px"),
            )
            .rule(
                CssRule::new(".liquid-droplet-loader .droplet")
                    .declaration("width", "12px")
                    .declaration("height", "12px")
                    .declaration("background", "var(--color-primary, #1a1a1a)")
                    .declaration("border-radius", "50% 50% 50% 50% / 60% 60% 40% 40%")
                    .declaration("animation", "droplet-fall 1.2s ease-in-out infinite"),
            )
            .rule(
                CssRule::new(".liquid-droplet-loader .droplet:nth-child(2)")
                    .declaration("animation-delay", "0.2s"),
            )
            .rule(
                CssRule::new(".liquid-droplet-loader .droplet:nth-child(3)")
                    .declaration("animation-delay", "0.4s"),
            )
            .keyframes(
                "droplet-fall",
                vec![
                    CssRule::new("0%, 100%")
                        .declaration("transform", "translateY(0) scale(1)")
                        .declaration("opacity", "1"),
                    CssRule::new("50%")
                        .declaration("transform", "translateY(-20px) scale(0.8)")
                        .declaration("opacity", "0.5"),
                ],
            )
            .rule(
                CssRule::new(".liquid-surface")
                    .declaration("position", "relative")
                    .declaration("overflow", "hidden"),
            )
            .rule(
                CssRule::new(".liquid-surface::after")
                    .declaration("content", "''")
                    .declaration("position", "absolute")
                    .declaration("inset", "0")
                    .declaration(
                        "background",
                        "linear-gradient(to bottom, transparent 0%, rgba(255, 255, 255, 0.1) 50%, transparent 100%)",
                    )
                    .declaration("animation", "liquid-surface-shimmer 3s ease-in-out infinite")
                    .declaration("pointer-events", "none"),
            )
            .keyframes(
                "liquid-surface-shimmer",
                vec![
                    CssRule::new("0%, 100%").declaration("transform", "translateY(-100%)"),
                    CssRule::new("50%").declaration("transform", "translateY(100%)"),
                ],
            )
            .rule(
                CssRule::new(".liquid-bubbles")
                    .declaration("position", "absolute")
                    .declaration("inset", "0")
                    .declaration("overflow", "hidden")
                    .declaration("pointer-events", "none"),
            )
            .rule(
                CssRule::new(".liquid-bubble")
                    .declaration("position", "absolute")
                    .declaration("bottom", "-20px")
                    .declaration(
                        "background",
                        "radial-gradient(circle at 30% 30%, rgba(255, 255, 255, 0.8) 0%, rgba(255, 255, 255, 0.4) 50%, transparent 100%)",
                    )
                    .declaration("border-radius", "50%")
                    .declaration("animation", "bubble-rise linear infinite"),
            )
            .keyframes(
                "bubble-rise",
                vec![
                    CssRule::new("0%")
                        .declaration("transform", "translateY(0) scale(1)")
                        .declaration("opacity", "0.7"),
                    CssRule::new("100%")
                        .declaration("transform", "translateY(-100vh) scale(0.5)")
                        .declaration("opacity", "0"),
                ],
            )
            .media(
                REDUCED_MOTION_QUERY,
                vec![
                    CssRule::new(
                        ".liquid-blob, .liquid-wave path, .liquid-cursor, .liquid-cursor-trail, \
                         .liquid-droplet-loader .droplet, .liquid-surface::after, .liquid-bubble",
                    )
                    .declaration("animation", "none !important")
                    .declaration("transition", "none !important"),
                    CssRule::new(".liquid-blobs, .liquid-cursor, .liquid-cursor-trail")
                        .declaration("display", "none !important"),
                ],
            )
            .build()
    }

    /// Insert the stylesheet into `<head>` unless it is already present
    ///
    /// Returns `true` if a new `<style>` element was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no head or a DOM call fails
    pub fn inject<P: Host>(host: &P, config: &EffectsConfig) -> FxResult<bool> {
        if host.element_by_id(STYLE_ID).is_some() {
            tracing::debug!(id = STYLE_ID, "stylesheet already present");
            return Ok(false);
        }
        let head = host
            .head()
            .ok_or_else(|| FxError::host_unavailable("document has no <head>"))?;
        let css = Self::stylesheet(config)?;

        let style = host.create_element("style")?;
        host.set_attribute(&style, "id", STYLE_ID)?;
        host.set_text_content(&style, &css.content)?;
        host.append_child(&head, &style)?;
        tracing::info!(id = STYLE_ID, bytes = css.content.len(), "stylesheet injected");
        Ok(true)
    }
}
