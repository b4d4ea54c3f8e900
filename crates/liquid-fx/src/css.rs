//! Type-safe CSS generation for the shared stylesheet.
//!
//! Rules, `@keyframes` and `@media` blocks are assembled in order and
//! rendered in one pass, so the injected sheet is a pure function of the
//! effect configuration.

use crate::result::{FxError, FxResult};
use serde::{Deserialize, Serialize};

/// A CSS rule with selector and declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssRule {
    /// CSS selector
    pub selector: String,
    /// Property-value pairs
    pub declarations: Vec<(String, String)>,
}

impl CssRule {
    /// Create a new CSS rule
    #[must_use]
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            declarations: Vec::new(),
        }
    }

    /// Add a declaration
    #[must_use]
    pub fn declaration(mut self, property: &str, value: &str) -> Self {
        self.declarations
            .push((property.to_string(), value.to_string()));
        self
    }

    /// Render rule to CSS string, indented by `indent` spaces
    #[must_use]
    pub fn render_indented(&self, indent: usize) -> String {
        if self.declarations.is_empty() {
            return String::new();
        }
        let pad = " ".repeat(indent);
        let decls = self
            .declarations
            .iter()
            .map(|(prop, val)| format!("{pad}    {prop}: {val};"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{pad}{} {{\n{decls}\n{pad}}}", self.selector)
    }

    /// Render rule to CSS string
    #[must_use]
    pub fn render(&self) -> String {
        self.render_indented(0)
    }
}

/// One top-level stylesheet block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CssBlock {
    /// Plain rule
    Rule(CssRule),
    /// `@keyframes name { ... }`; each frame is a rule whose selector is
    /// the keyframe selector (`0%, 100%`, `to`, ...)
    Keyframes {
        /// Animation name
        name: String,
        /// Keyframe rules
        frames: Vec<CssRule>,
    },
    /// `@media query { ... }`
    Media {
        /// Media query
        query: String,
        /// Nested rules
        rules: Vec<CssRule>,
    },
}

impl CssBlock {
    fn render(&self) -> String {
        match self {
            Self::Rule(rule) => rule.render(),
            Self::Keyframes { name, frames } => nested(&format!("@keyframes {name}"), frames),
            Self::Media { query, rules } => nested(&format!("@media {query}"), rules),
        }
    }
}

fn nested(header: &str, rules: &[CssRule]) -> String {
    let body = rules
        .iter()
        .map(|r| r.render_indented(4))
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{header} {{\n{body}\n}}")
}

/// Generated CSS output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCss {
    /// CSS content
    pub content: String,
    /// Blocks in the stylesheet
    pub blocks: Vec<CssBlock>,
}

impl GeneratedCss {
    /// Whether a `@keyframes` block with this name exists
    #[must_use]
    pub fn has_keyframes(&self, name: &str) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b, CssBlock::Keyframes { name: n, .. } if n == name))
    }
}

/// Type-safe CSS builder
#[derive(Debug, Clone, Default)]
pub struct CssBuilder {
    blocks: Vec<CssBlock>,
}

impl CssBuilder {
    /// Create a new CSS builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a CSS rule
    #[must_use]
    pub fn rule(mut self, rule: CssRule) -> Self {
        self.blocks.push(CssBlock::Rule(rule));
        self
    }

    /// Add a `@keyframes` block
    #[must_use]
    pub fn keyframes(mut self, name: &str, frames: Vec<CssRule>) -> Self {
        self.blocks.push(CssBlock::Keyframes {
            name: name.to_string(),
            frames,
        });
        self
    }

    /// Add a `@media` block
    #[must_use]
    pub fn media(mut self, query: &str, rules: Vec<CssRule>) -> Self {
        self.blocks.push(CssBlock::Media {
            query: query.to_string(),
            rules,
        });
        self
    }

    /// Build the CSS stylesheet
    ///
    /// # Errors
    ///
    /// Returns an error for an empty selector or an invalid keyframes name
    pub fn build(self) -> FxResult<GeneratedCss> {
        for block in &self.blocks {
            match block {
                CssBlock::Rule(rule) => check_selector(&rule.selector)?,
                CssBlock::Keyframes { name, frames } => {
                    let valid = !name.is_empty()
                        && name
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                    if !valid {
                        return Err(FxError::invalid_options(
                            "stylesheet",
                            format!("invalid keyframes name {name:?}"),
                        ));
                    }
                    frames.iter().try_for_each(|f| check_selector(&f.selector))?;
                }
                CssBlock::Media { rules, .. } => {
                    rules.iter().try_for_each(|r| check_selector(&r.selector))?;
                }
            }
        }

        let content = self
            .blocks
            .iter()
            .map(CssBlock::render)
            .filter(|b| !b.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(GeneratedCss {
            content,
            blocks: self.blocks,
        })
    }
}

fn check_selector(selector: &str) -> FxResult<()> {
    if selector.trim().is_empty() {
        return Err(FxError::invalid_options("stylesheet", "empty selector"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_render() {
        let rule = CssRule::new("body")
            .declaration("margin", "0")
            .declaration("padding", "0");

        let rendered = rule.render();
        assert!(rendered.starts_with("body {"));
        assert!(rendered.contains("    margin: 0;"));
        assert!(rendered.contains("    padding: 0;"));
    }

    #[test]
    fn test_rule_empty_declarations() {
        assert!(CssRule::new("div").render().is_empty());
    }

    #[test]
    fn test_keyframes_render() {
        let css = CssBuilder::new()
            .keyframes(
                "fade",
                vec![
                    CssRule::new("0%, 100%").declaration("opacity", "1"),
                    CssRule::new("50%").declaration("opacity", "0.5"),
                ],
            )
            .build()
            .unwrap();

        assert!(css.content.starts_with("@keyframes fade {"));
        assert!(css.content.contains("    0%, 100% {"));
        assert!(css.content.contains("        opacity: 0.5;"));
        assert!(css.has_keyframes("fade"));
        assert!(!css.has_keyframes("rise"));
    }

    #[test]
    fn test_media_render() {
        let css = CssBuilder::new()
            .media(
                "(prefers-reduced-motion: reduce)",
                vec![CssRule::new(".x").declaration("animation", "none !important")],
            )
            .build()
            .unwrap();
        assert!(css
            .content
            .contains("@media (prefers-reduced-motion: reduce) {"));
        assert!(css.content.contains("animation: none !important;"));
    }

    #[test]
    fn test_blocks_keep_order() {
        let css = CssBuilder::new()
            .rule(CssRule::new(".a").declaration("b", "c"))
            .keyframes("k", vec![CssRule::new("to").declaration("x", "y")])
            .build()
            .unwrap();
        assert_eq!(css.blocks.len(), 2);
        assert!(css.content.find(".a {").unwrap() < css.content.find("@keyframes").unwrap());
    }

    #[test]
    fn test_invalid_blocks_rejected() {
        assert!(CssBuilder::new()
            .rule(CssRule::new("  ").declaration("a", "b"))
            .build()
            .is_err());
        assert!(CssBuilder::new()
            .keyframes("bad name", Vec::new())
            .build()
            .is_err());
    }
}
