//! Adjustment parameters for one source image.
//!
//! Every field has a neutral default. All structs carry `#[serde(default)]`
//! so state documents written by older versions, with fields missing, still
//! load; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::color::{IDENTITY_POLYNOMIAL, NEUTRAL_TEMPERATURE};

/// The full parameter set that determines one image's appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentParameters {
    /// Treat the source as a negative and invert it.
    pub invert: bool,
    /// Stretch each channel to its black/white points.
    pub auto_levels: bool,
    pub tone: ToneParams,
    pub color: ColorParams,
    pub film_base: FilmBaseParams,
    pub cast: CastRefinementParams,
    pub geometry: GeometryParams,
    pub detail: DetailParams,
}

impl Default for AdjustmentParameters {
    fn default() -> Self {
        Self {
            invert: true,
            auto_levels: false,
            tone: ToneParams::default(),
            color: ColorParams::default(),
            film_base: FilmBaseParams::default(),
            cast: CastRefinementParams::default(),
            geometry: GeometryParams::default(),
            detail: DetailParams::default(),
        }
    }
}

impl AdjustmentParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for a positive scan (no inversion).
    pub fn positive() -> Self {
        Self {
            invert: false,
            ..Self::default()
        }
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Tone
// ============================================================================

/// Tone controls.
///
/// `exposure` is forwarded to the decoder; the rest run in the tone mapping
/// stage. Slider-style values range -100 to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParams {
    /// Exposure in stops (-5 to 5), applied at decode.
    pub exposure: f32,
    pub contrast: f32,
    pub brightness: f32,
    /// Power-law exponent; values at or below 0.01 are treated as 1.0.
    pub gamma: f32,
    pub highlights: f32,
    pub shadows: f32,
    /// Raise of the S-curve's x=0.25 control point (0 to 0.25).
    pub shadow_lift: f32,
    /// Drop of the S-curve's x=0.75 control point (0 to 0.25).
    pub highlight_pull: f32,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 0.0,
            brightness: 0.0,
            gamma: 1.0,
            highlights: 0.0,
            shadows: 0.0,
            shadow_lift: 0.0,
            highlight_pull: 0.0,
        }
    }
}

// ============================================================================
// Color
// ============================================================================

/// Color controls.
///
/// The `raw_*` white balance is applied by the decoder before inversion;
/// `temperature`/`tint` grade the positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorParams {
    /// Pre-inversion white balance temperature in Kelvin.
    pub raw_temperature: f32,
    /// Pre-inversion tint (-100 to 100).
    pub raw_tint: f32,
    /// Post-inversion temperature (-100 warm to 100 cool).
    pub temperature: f32,
    /// Post-inversion tint (-100 green to 100 magenta).
    pub tint: f32,
    pub vibrance: f32,
    pub saturation: f32,
    pub black_and_white: bool,
    /// Channel mixer weights for black and white conversion (R, G, B).
    pub bw_mix: [f32; 3],
    /// Sepia intensity (0 to 1), used with black and white.
    pub sepia: f32,
}

impl Default for ColorParams {
    fn default() -> Self {
        Self {
            raw_temperature: NEUTRAL_TEMPERATURE,
            raw_tint: 0.0,
            temperature: 0.0,
            tint: 0.0,
            vibrance: 0.0,
            saturation: 0.0,
            black_and_white: false,
            bw_mix: [0.2126, 0.7152, 0.0722],
            sepia: 0.0,
        }
    }
}

// ============================================================================
// Film base
// ============================================================================

/// The sampled substrate color of unexposed film, in linear RGB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmBaseParams {
    pub sample: Option<[f32; 3]>,
}

// ============================================================================
// Color cast refinement
// ============================================================================

/// A targeted hue range for residual cast correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueRange {
    /// Center hue in degrees (0 to 360).
    pub center: f32,
    /// Full width of the range in degrees.
    pub width: f32,
    /// Added to saturation of matching colors (-1 to 1).
    pub saturation_delta: f32,
    /// Added to brightness of matching colors (-1 to 1).
    pub brightness_delta: f32,
}

impl Default for HueRange {
    fn default() -> Self {
        // Residual cyan is the typical color negative cast.
        Self {
            center: 180.0,
            width: 40.0,
            saturation_delta: 0.0,
            brightness_delta: 0.0,
        }
    }
}

impl HueRange {
    /// Deltas within this magnitude of zero are ignored.
    pub const DELTA_EPSILON: f32 = 0.001;

    pub fn is_active(&self) -> bool {
        self.width > 0.0
            && (self.saturation_delta.abs() > Self::DELTA_EPSILON
                || self.brightness_delta.abs() > Self::DELTA_EPSILON)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastRefinementParams {
    /// Per-channel cubic coefficients `[c0, c1, c2, c3]` for R, G, B.
    pub polynomial: [[f32; 4]; 3],
    pub neutralize_midtones: bool,
    /// Blend between original (0) and fully neutralized (1).
    pub midtone_strength: f32,
    pub shadow_tint: [f32; 3],
    pub shadow_tint_strength: f32,
    pub highlight_tint: [f32; 3],
    pub highlight_tint_strength: f32,
    pub hue_range: HueRange,
}

impl Default for CastRefinementParams {
    fn default() -> Self {
        Self {
            polynomial: [IDENTITY_POLYNOMIAL; 3],
            neutralize_midtones: false,
            midtone_strength: 1.0,
            shadow_tint: [0.0; 3],
            shadow_tint_strength: 0.0,
            highlight_tint: [0.0; 3],
            highlight_tint_strength: 0.0,
            hue_range: HueRange::default(),
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Crop rectangle in normalized coordinates (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for CropRect {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl CropRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Check if this crop covers the full image.
    pub fn is_full(&self) -> bool {
        self.left.abs() < 1e-6
            && self.top.abs() < 1e-6
            && (self.width - 1.0).abs() < 1e-6
            && (self.height - 1.0).abs() < 1e-6
    }
}

/// Four-point perspective correction.
///
/// Corners are top-left, top-right, bottom-right, bottom-left, given in the
/// pixel space of an image of `reference_width` x `reference_height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveQuad {
    pub corners: [Point; 4],
    pub reference_width: f32,
    pub reference_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    /// Clockwise quarter turns (0 to 3).
    pub quarter_turns: u8,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    /// Straighten angle in degrees (-45 to 45, positive = counter-clockwise).
    pub straighten: f32,
    /// Output scale factor.
    pub scale: f32,
    pub crop: Option<CropRect>,
    pub perspective: Option<PerspectiveQuad>,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            quarter_turns: 0,
            flip_horizontal: false,
            flip_vertical: false,
            straighten: 0.0,
            scale: 1.0,
            crop: None,
            perspective: None,
        }
    }
}

impl GeometryParams {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Detail
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailParams {
    /// Global sharpening amount (0 to 1).
    pub sharpness: f32,
    /// Unsharp mask radius in pixels.
    pub unsharp_radius: f32,
    /// Unsharp mask amount (0 to 2).
    pub unsharp_intensity: f32,
    /// Luminance noise reduction (0 to 1).
    pub noise_level: f32,
}

impl Default for DetailParams {
    fn default() -> Self {
        Self {
            sharpness: 0.0,
            unsharp_radius: 2.5,
            unsharp_intensity: 0.0,
            noise_level: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = AdjustmentParameters::new();
        assert!(params.is_default());
        assert!(params.invert);
        assert!(!params.auto_levels);
        assert_eq!(params.tone.gamma, 1.0);
        assert_eq!(params.geometry.scale, 1.0);
        assert!(params.film_base.sample.is_none());
    }

    #[test]
    fn test_not_default_after_edit() {
        let mut params = AdjustmentParameters::new();
        params.tone.contrast = 10.0;
        assert!(!params.is_default());
        assert!(!AdjustmentParameters::positive().is_default());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = r#"{ "tone": { "contrast": 25.0 }, "color": { "black_and_white": true } }"#;
        let params: AdjustmentParameters = serde_json::from_str(json).unwrap();
        assert_eq!(params.tone.contrast, 25.0);
        assert_eq!(params.tone.gamma, 1.0);
        assert!(params.color.black_and_white);
        assert_eq!(params.color.raw_temperature, NEUTRAL_TEMPERATURE);
        assert!(params.invert);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{ "invert": false, "future_control": 3 }"#;
        let params: AdjustmentParameters = serde_json::from_str(json).unwrap();
        assert!(!params.invert);
    }

    #[test]
    fn test_hue_range_activity() {
        let mut range = HueRange::default();
        assert!(!range.is_active());
        range.saturation_delta = 0.0005;
        assert!(!range.is_active());
        range.saturation_delta = -0.2;
        assert!(range.is_active());
        range.width = 0.0;
        assert!(!range.is_active());
    }

    #[test]
    fn test_crop_rect_full() {
        assert!(CropRect::default().is_full());
        assert!(!CropRect::new(0.1, 0.0, 0.9, 1.0).is_full());
    }
}
