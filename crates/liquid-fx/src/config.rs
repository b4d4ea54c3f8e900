//! Effect configuration
//!
//! One options struct per effect family, gathered into [`EffectsConfig`].
//! The config is resolved once and handed to the bootstrapper; nothing reads
//! a global. Keys are camelCase so theme settings and marker attribute JSON
//! can use the same names as the stylesheet variables.

use crate::motion::MotionPreference;
use crate::result::{FxError, FxResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Upper bound on particle and trail counts
pub const MAX_PARTICLES: usize = 200;

/// Blob background options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlobOptions {
    /// Number of blobs
    pub count: usize,
    /// Smallest blob diameter in px
    pub min_size: f64,
    /// Largest blob diameter in px
    pub max_size: f64,
    /// Frame time accumulator increment per frame
    pub speed: f64,
    /// Fill colours, cycled by blob index
    pub colors: Vec<String>,
}

impl Default for BlobOptions {
    fn default() -> Self {
        Self {
            count: 5,
            min_size: 100.0,
            max_size: 400.0,
            speed: 0.002,
            colors: vec![
                "var(--color-liquid-1, rgba(59, 130, 246, 0.3))".to_string(),
                "var(--color-liquid-2, rgba(99, 102, 241, 0.25))".to_string(),
                "var(--color-liquid-3, rgba(139, 92, 246, 0.2))".to_string(),
                "var(--color-liquid-4, rgba(14, 165, 233, 0.25))".to_string(),
                "var(--color-liquid-5, rgba(6, 182, 212, 0.2))".to_string(),
            ],
        }
    }
}

impl BlobOptions {
    /// Validate option ranges
    pub fn validate(&self) -> FxResult<()> {
        check_count("blob", self.count)?;
        check_range("blob", "size", self.min_size, self.max_size)?;
        check_positive("blob", "speed", self.speed)?;
        if self.colors.is_empty() {
            return Err(FxError::invalid_options("blob", "colors must not be empty"));
        }
        Ok(())
    }
}

/// Wave divider options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveOptions {
    /// Vertical swing in viewBox units
    pub amplitude: f64,
    /// Radians per viewBox unit along x
    pub frequency: f64,
    /// Phase increment per frame
    pub speed: f64,
    /// Number of stacked paths
    pub layers: usize,
}

impl Default for WaveOptions {
    fn default() -> Self {
        Self {
            amplitude: 20.0,
            frequency: 0.02,
            speed: 0.03,
            layers: 3,
        }
    }
}

impl WaveOptions {
    /// Validate option ranges
    pub fn validate(&self) -> FxResult<()> {
        if ![self.amplitude, self.frequency, self.speed]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(FxError::invalid_options(
                "wave",
                "amplitude, frequency and speed must be finite",
            ));
        }
        if self.layers == 0 || self.layers > 16 {
            return Err(FxError::invalid_options("wave", "layers must be 1..=16"));
        }
        Ok(())
    }
}

/// Click ripple options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RippleOptions {
    /// Ripple lifetime in ms
    pub duration: u32,
    /// Final ripple radius in px
    pub max_radius: f64,
    /// RGB triple (or a variable resolving to one) fed to `rgba(..., 0.2)`
    pub color: String,
}

impl Default for RippleOptions {
    fn default() -> Self {
        Self {
            duration: 800,
            max_radius: 150.0,
            color: "var(--color-primary-rgb, 26, 26, 26)".to_string(),
        }
    }
}

impl RippleOptions {
    /// Validate option ranges
    pub fn validate(&self) -> FxResult<()> {
        if self.duration == 0 {
            return Err(FxError::invalid_options("ripple", "duration must be > 0"));
        }
        check_positive("ripple", "maxRadius", self.max_radius)
    }
}

/// Hover tilt options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoverOptions {
    /// Tilt in degrees at the element edges
    pub max_tilt: f64,
    /// Uniform scale while hovered
    pub scale: f64,
    /// Perspective distance in px
    pub perspective: f64,
}

impl Default for HoverOptions {
    fn default() -> Self {
        Self {
            max_tilt: 10.0,
            scale: 1.02,
            perspective: 1000.0,
        }
    }
}

impl HoverOptions {
    /// Validate option ranges
    pub fn validate(&self) -> FxResult<()> {
        if !self.max_tilt.is_finite() {
            return Err(FxError::invalid_options("hover", "maxTilt must be finite"));
        }
        check_positive("hover", "scale", self.scale)?;
        check_positive("hover", "perspective", self.perspective)
    }
}

/// Text reveal options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextRevealOptions {
    /// Delay between consecutive characters in ms
    pub stagger: u32,
    /// Visible fraction that triggers the reveal
    pub threshold: f64,
}

impl Default for TextRevealOptions {
    fn default() -> Self {
        Self {
            stagger: 30,
            threshold: 0.2,
        }
    }
}

impl TextRevealOptions {
    /// Validate option ranges
    pub fn validate(&self) -> FxResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(FxError::invalid_options(
                "text",
                "threshold must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Cursor trail options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CursorOptions {
    /// Number of trailing dots
    pub trail_length: usize,
    /// Head diameter in px; each trail dot is 1.5px smaller than the last
    pub size: f64,
    /// Fill colour
    pub color: String,
    /// Fraction of the remaining distance a trail dot closes per frame
    pub smoothing: f64,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            trail_length: 10,
            size: 20.0,
            color: "var(--color-primary, #1a1a1a)".to_string(),
            smoothing: 0.3,
        }
    }
}

impl CursorOptions {
    /// Validate option ranges
    pub fn validate(&self) -> FxResult<()> {
        check_count("cursor", self.trail_length)?;
        check_positive("cursor", "size", self.size)?;
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(FxError::invalid_options(
                "cursor",
                "smoothing must be within (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Rising bubble options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BubbleOptions {
    /// Number of bubbles
    pub count: usize,
    /// Smallest bubble diameter in px
    pub min_size: f64,
    /// Largest bubble diameter in px
    pub max_size: f64,
    /// Shortest rise in seconds
    pub min_duration: f64,
    /// Longest rise in seconds
    pub max_duration: f64,
}

impl Default for BubbleOptions {
    fn default() -> Self {
        Self {
            count: 15,
            min_size: 5.0,
            max_size: 20.0,
            min_duration: 5.0,
            max_duration: 12.0,
        }
    }
}

impl BubbleOptions {
    /// Validate option ranges
    pub fn validate(&self) -> FxResult<()> {
        check_count("bubbles", self.count)?;
        check_range("bubbles", "size", self.min_size, self.max_size)?;
        check_range("bubbles", "duration", self.min_duration, self.max_duration)?;
        check_positive("bubbles", "minDuration", self.min_duration)
    }
}

/// Complete effect configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectsConfig {
    /// Blob defaults
    pub blob: BlobOptions,
    /// Wave defaults
    pub wave: WaveOptions,
    /// Ripple settings
    pub ripple: RippleOptions,
    /// Hover settings
    pub hover: HoverOptions,
    /// Text reveal settings
    pub text: TextRevealOptions,
    /// Cursor settings
    pub cursor: CursorOptions,
    /// Bubble defaults
    pub bubbles: BubbleOptions,
    /// Forced motion preference; `None` reads the media query at boot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion: Option<MotionPreference>,
}

impl EffectsConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) JSON document over the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has wrongly typed values
    pub fn from_json(json: &str) -> FxResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> FxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Merge a JSON object of overrides onto `base`
///
/// Keys absent from `overrides` keep their `base` value; unknown keys are
/// ignored. An empty or whitespace-only string returns `base` unchanged.
///
/// # Errors
///
/// Returns an error if `overrides` is not a JSON object or a value has the
/// wrong type.
pub fn merge_overrides<T>(base: &T, overrides: &str) -> FxResult<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    if overrides.trim().is_empty() {
        return Ok(base.clone());
    }
    let mut merged = serde_json::to_value(base)?;
    let patch: serde_json::Value = serde_json::from_str(overrides)?;
    let (Some(target), serde_json::Value::Object(fields)) = (merged.as_object_mut(), patch) else {
        return Err(FxError::invalid_options(
            "overrides",
            "expected a JSON object",
        ));
    };
    for (key, value) in fields {
        target.insert(key, value);
    }
    Ok(serde_json::from_value(merged)?)
}

fn check_count(family: &'static str, count: usize) -> FxResult<()> {
    if count > MAX_PARTICLES {
        return Err(FxError::invalid_options(
            family,
            format!("count {count} exceeds {MAX_PARTICLES}"),
        ));
    }
    Ok(())
}

fn check_range(family: &'static str, name: &str, min: f64, max: f64) -> FxResult<()> {
    if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
        return Err(FxError::invalid_options(
            family,
            format!("{name} range [{min}, {max}] is invalid"),
        ));
    }
    Ok(())
}

fn check_positive(family: &'static str, name: &str, value: f64) -> FxResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(FxError::invalid_options(
            family,
            format!("{name} must be a positive number, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = EffectsConfig::default();
        config.blob.validate().unwrap();
        config.wave.validate().unwrap();
        config.ripple.validate().unwrap();
        config.hover.validate().unwrap();
        config.text.validate().unwrap();
        config.cursor.validate().unwrap();
        config.bubbles.validate().unwrap();
    }

    #[test]
    fn test_default_values() {
        let config = EffectsConfig::new();
        assert_eq!(config.blob.count, 5);
        assert_eq!(config.blob.colors.len(), 5);
        assert_eq!(config.wave.layers, 3);
        assert_eq!(config.ripple.duration, 800);
        assert_eq!(config.ripple.max_radius, 150.0);
        assert_eq!(config.cursor.trail_length, 10);
        assert_eq!(config.cursor.smoothing, 0.3);
        assert_eq!(config.bubbles.count, 15);
        assert_eq!(config.text.stagger, 30);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EffectsConfig::from_json(r#"{"blob": {"count": 2}, "ripple": {"duration": 500}}"#)
            .unwrap();
        assert_eq!(config.blob.count, 2);
        assert_eq!(config.blob.max_size, 400.0);
        assert_eq!(config.ripple.duration, 500);
        assert_eq!(config.wave, WaveOptions::default());
    }

    #[test]
    fn test_motion_override() {
        assert!(EffectsConfig::default().motion.is_none());
        let config = EffectsConfig::from_json(r#"{"motion": {"reduced": true}}"#).unwrap();
        assert_eq!(config.motion, Some(MotionPreference::reduced()));
        assert!(!EffectsConfig::default().to_json().unwrap().contains("motion"));
    }

    #[test]
    fn test_from_json_rejects_wrong_type() {
        assert!(EffectsConfig::from_json(r#"{"blob": {"count": "many"}}"#).is_err());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let json = EffectsConfig::default().to_json().unwrap();
        assert!(json.contains("\"minSize\""));
        assert!(json.contains("\"trailLength\""));
        assert!(!json.contains("min_size"));
    }

    #[test]
    fn test_merge_overrides() {
        let base = BlobOptions::default();
        let merged = merge_overrides(&base, r#"{"count": 3, "speed": 0.01, "unknown": 1}"#).unwrap();
        assert_eq!(merged.count, 3);
        assert_eq!(merged.speed, 0.01);
        assert_eq!(merged.colors, base.colors);
    }

    #[test]
    fn test_merge_empty_returns_base() {
        let base = WaveOptions::default();
        assert_eq!(merge_overrides(&base, "  ").unwrap(), base);
    }

    #[test]
    fn test_merge_rejects_non_object() {
        let base = WaveOptions::default();
        assert!(merge_overrides(&base, "[1, 2]").is_err());
        assert!(merge_overrides(&base, "{oops").is_err());
    }

    #[test]
    fn test_validation_failures() {
        let blob = BlobOptions {
            min_size: 500.0,
            ..BlobOptions::default()
        };
        assert!(blob.validate().is_err());

        let blob = BlobOptions {
            colors: Vec::new(),
            ..BlobOptions::default()
        };
        assert!(blob.validate().is_err());

        let wave = WaveOptions {
            layers: 0,
            ..WaveOptions::default()
        };
        assert!(wave.validate().is_err());

        let cursor = CursorOptions {
            smoothing: 0.0,
            ..CursorOptions::default()
        };
        assert!(cursor.validate().is_err());

        let bubbles = BubbleOptions {
            count: MAX_PARTICLES + 1,
            ..BubbleOptions::default()
        };
        assert!(bubbles.validate().is_err());

        let text = TextRevealOptions {
            threshold: 1.5,
            ..TextRevealOptions::default()
        };
        assert!(text.validate().is_err());
    }
}
