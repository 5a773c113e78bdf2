//! Color-cast and hue refinement.
//!
//! Stages, each independently toggleable and applied in order:
//!
//! 1. Per-channel polynomial pre-correction (non-linear cast)
//! 2. Midtone neutralization (gray world)
//! 3. Shadow tint, then highlight tint (additive bias)
//! 4. Targeted hue range adjustment through a 3D lookup cube

use crate::color::{hsb_to_rgb, hue_in_range, rgb_to_hsb, ChannelPolynomial, ColorCube, ColorMatrix, DEFAULT_CUBE_SIZE};
use crate::decode::FloatImage;
use crate::params::{CastRefinementParams, HueRange};
use crate::parallel::fold_pixels;

/// Frames whose average is darker than this are not neutralized.
pub const MIN_NEUTRALIZE_AVERAGE: f32 = 1e-3;

/// Apply all cast refinement stages configured in `params`.
pub fn refine_color_cast(image: &mut FloatImage, params: &CastRefinementParams) {
    let [r, g, b] = params.polynomial;
    ChannelPolynomial::new(r, g, b).apply(image);

    if params.neutralize_midtones {
        neutralize_midtones(image, params.midtone_strength);
    }

    apply_tint(image, params.shadow_tint, params.shadow_tint_strength);
    apply_tint(image, params.highlight_tint, params.highlight_tint_strength);

    adjust_hue_range(image, &params.hue_range);
}

/// Average color of the opaque pixels, `None` for an empty frame.
pub fn average_color(image: &FloatImage) -> Option<[f32; 3]> {
    let (sum, count) = fold_pixels(
        &image.pixels,
        || ([0.0f64; 3], 0u64),
        |(mut sum, count), px| {
            if px[3] <= 0.0 {
                return (sum, count);
            }
            sum[0] += px[0] as f64;
            sum[1] += px[1] as f64;
            sum[2] += px[2] as f64;
            (sum, count + 1)
        },
        |(a, n), (b, m)| ([a[0] + b[0], a[1] + b[1], a[2] + b[2]], n + m),
    );
    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(sum.map(|s| (s / n) as f32))
}

/// Gains that map the average color onto gray, blended by `strength`.
///
/// `None` when the frame is near black.
pub fn neutralization_gains(average: [f32; 3], strength: f32) -> Option<[f32; 3]> {
    let gray = (average[0] + average[1] + average[2]) / 3.0;
    if !gray.is_finite() || gray < MIN_NEUTRALIZE_AVERAGE {
        return None;
    }
    let strength = strength.clamp(0.0, 1.0);
    Some(average.map(|c| {
        let full = if c > 1e-6 { gray / c } else { 1.0 };
        1.0 + (full - 1.0) * strength
    }))
}

/// Gray-world neutralization; `strength` 0 leaves the image untouched.
pub fn neutralize_midtones(image: &mut FloatImage, strength: f32) {
    if strength <= 0.0 {
        return;
    }
    let Some(average) = average_color(image) else {
        return;
    };
    let Some(gains) = neutralization_gains(average, strength) else {
        tracing::debug!(?average, "frame too dark to neutralize");
        return;
    };
    ColorMatrix::diagonal(gains).apply(image, false);
}

/// Add `color * strength` to every pixel. Zero strength is a no-op.
pub fn apply_tint(image: &mut FloatImage, color: [f32; 3], strength: f32) {
    if strength == 0.0 || !strength.is_finite() {
        return;
    }
    ColorMatrix::offset(color.map(|c| c * strength)).apply(image, false);
}

/// Build the lookup cube for a hue range adjustment.
///
/// Achromatic grid cells have no meaningful hue and pass through.
pub fn hue_range_cube(range: &HueRange) -> ColorCube {
    let range = range.clone();
    ColorCube::from_fn(DEFAULT_CUBE_SIZE, move |r, g, b| {
        let mut hsb = rgb_to_hsb(r, g, b);
        if hsb.s <= 0.0 || !hue_in_range(hsb.h, range.center, range.width) {
            return [r, g, b];
        }
        hsb.s = (hsb.s + range.saturation_delta).clamp(0.0, 1.0);
        hsb.b = (hsb.b + range.brightness_delta).clamp(0.0, 1.0);
        let (r, g, b) = hsb_to_rgb(hsb);
        [r, g, b]
    })
}

/// Shift saturation and brightness of colors inside the hue range.
///
/// Skipped when both deltas are negligible or the range is empty.
pub fn adjust_hue_range(image: &mut FloatImage, range: &HueRange) {
    if !range.is_active() {
        return;
    }
    hue_range_cube(range).apply(image);
}
