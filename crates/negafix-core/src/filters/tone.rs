//! Perceptual tone mapping.
//!
//! ## Stage Order
//! 1. Contrast
//! 2. Brightness
//! 3. Highlights
//! 4. Shadows
//! 5. Gamma
//! 6. S-curve (shadow lift / highlight pull)
//!
//! Every stage is skipped at its neutral value, so default parameters leave
//! the image bit-identical.

use crate::curve::ToneCurve;
use crate::decode::FloatImage;
use crate::luminance::pixel_luminance;
use crate::params::ToneParams;
use crate::parallel::for_each_pixel;

/// Gamma values at or below this are replaced by 1.0.
pub const MIN_GAMMA: f32 = 0.01;

/// Apply all tone stages in order.
pub fn apply_tone(image: &mut FloatImage, params: &ToneParams) {
    let contrast = params.contrast;
    let brightness = params.brightness;
    let highlights = params.highlights;
    let shadows = params.shadows;

    if contrast != 0.0 || brightness != 0.0 || highlights != 0.0 || shadows != 0.0 {
        for_each_pixel(&mut image.pixels, |px| {
            let (mut r, mut g, mut b) = (px[0], px[1], px[2]);
            (r, g, b) = apply_contrast(r, g, b, contrast);
            (r, g, b) = apply_brightness(r, g, b, brightness);
            (r, g, b) = apply_highlights(r, g, b, highlights);
            (r, g, b) = apply_shadows(r, g, b, shadows);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        });
    }

    apply_gamma(image, params.gamma);
    ToneCurve::s_curve(params.shadow_lift, params.highlight_pull).apply(image);
}

/// Resolve the configured gamma, replacing degenerate exponents with 1.0.
pub fn effective_gamma(gamma: f32) -> f32 {
    if !gamma.is_finite() || gamma <= MIN_GAMMA {
        1.0
    } else {
        gamma
    }
}

/// Power-law `out = max(in, 0)^gamma` on the RGB channels.
pub fn apply_gamma(image: &mut FloatImage, gamma: f32) {
    let gamma = effective_gamma(gamma);
    if gamma == 1.0 {
        return;
    }
    for_each_pixel(&mut image.pixels, |px| {
        for v in &mut px[..3] {
            *v = v.max(0.0).powf(gamma);
        }
    });
}

/// `out = (in - 0.5) * (1 + contrast/100) + 0.5`
#[inline]
fn apply_contrast(r: f32, g: f32, b: f32, contrast: f32) -> (f32, f32, f32) {
    if contrast == 0.0 {
        return (r, g, b);
    }
    let factor = 1.0 + contrast / 100.0;
    (
        (r - 0.5) * factor + 0.5,
        (g - 0.5) * factor + 0.5,
        (b - 0.5) * factor + 0.5,
    )
}

/// Uniform offset; the full slider range shifts by half the signal range.
#[inline]
fn apply_brightness(r: f32, g: f32, b: f32, brightness: f32) -> (f32, f32, f32) {
    if brightness == 0.0 {
        return (r, g, b);
    }
    let offset = brightness / 200.0;
    (r + offset, g + offset, b + offset)
}

/// Returns 0 for x <= edge0, 1 for x >= edge1, and a smooth ramp between.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Affects pixels with luminance above 0.5.
#[inline]
fn apply_highlights(r: f32, g: f32, b: f32, highlights: f32) -> (f32, f32, f32) {
    if highlights == 0.0 {
        return (r, g, b);
    }
    let mask = smoothstep(0.5, 1.0, pixel_luminance(&[r, g, b]));
    let adjustment = (highlights / 100.0) * mask;
    if highlights < 0.0 {
        let factor = 1.0 + adjustment;
        (r * factor, g * factor, b * factor)
    } else {
        let boost = adjustment * 0.5;
        (r + boost, g + boost, b + boost)
    }
}

/// Affects pixels with luminance below 0.5.
#[inline]
fn apply_shadows(r: f32, g: f32, b: f32, shadows: f32) -> (f32, f32, f32) {
    if shadows == 0.0 {
        return (r, g, b);
    }
    let mask = smoothstep(0.5, 0.0, pixel_luminance(&[r, g, b]));
    let adjustment = (shadows / 100.0) * mask;
    if shadows < 0.0 {
        let factor = 1.0 + adjustment;
        (r * factor, g * factor, b * factor)
    } else {
        let boost = adjustment * 0.5;
        (r + boost, g + boost, b + boost)
    }
}
