//! Positive color grading.
//!
//! ## Adjustment Order
//! 1. Temperature
//! 2. Tint
//! 3. Vibrance
//! 4. Saturation
//! 5. Black and white channel mix
//! 6. Sepia (black and white only)

use crate::decode::FloatImage;
use crate::luminance::calculate_luminance;
use crate::params::ColorParams;
use crate::parallel::for_each_pixel;

/// Classic sepia tone matrix, rows produce R, G, B.
pub const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Apply the color grade.
///
/// # Arguments
/// * `image` - Positive image, graded in place
/// * `params` - Color controls; the `raw_*` fields are ignored here
pub fn apply_grade(image: &mut FloatImage, params: &ColorParams) {
    let mix = if params.black_and_white {
        normalized_mix(params.bw_mix)
    } else {
        None
    };
    let sepia = if params.black_and_white {
        params.sepia.clamp(0.0, 1.0)
    } else {
        0.0
    };

    if params.temperature == 0.0
        && params.tint == 0.0
        && params.vibrance == 0.0
        && params.saturation == 0.0
        && mix.is_none()
        && sepia == 0.0
    {
        return;
    }

    for_each_pixel(&mut image.pixels, |px| {
        let (mut r, mut g, mut b) = (px[0], px[1], px[2]);
        (r, g, b) = apply_temperature(r, g, b, params.temperature);
        (r, g, b) = apply_tint(r, g, b, params.tint);
        (r, g, b) = apply_vibrance(r, g, b, params.vibrance);
        (r, g, b) = apply_saturation(r, g, b, params.saturation);
        if let Some(weights) = mix {
            let gray = r * weights[0] + g * weights[1] + b * weights[2];
            (r, g, b) = (gray, gray, gray);
        }
        (r, g, b) = apply_sepia(r, g, b, sepia);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    });
}

/// Mixer weights scaled to sum to 1, `None` when they sum to zero.
pub fn normalized_mix(weights: [f32; 3]) -> Option<[f32; 3]> {
    let sum = weights[0] + weights[1] + weights[2];
    if !sum.is_finite() || sum.abs() < 1e-6 {
        return None;
    }
    Some(weights.map(|w| w / sum))
}

/// -100 warms (more red, less blue), +100 cools.
#[inline]
fn apply_temperature(r: f32, g: f32, b: f32, temperature: f32) -> (f32, f32, f32) {
    if temperature == 0.0 {
        return (r, g, b);
    }
    let shift = temperature / 100.0 * 0.3;
    if temperature < 0.0 {
        (r * (1.0 + shift.abs()), g, b * (1.0 - shift.abs()))
    } else {
        (r * (1.0 - shift), g, b * (1.0 + shift))
    }
}

/// -100 pushes green, +100 pushes magenta.
#[inline]
fn apply_tint(r: f32, g: f32, b: f32, tint: f32) -> (f32, f32, f32) {
    if tint == 0.0 {
        return (r, g, b);
    }
    let shift = tint / 100.0 * 0.2;
    if tint < 0.0 {
        (r, g * (1.0 + shift.abs()), b)
    } else {
        (r * (1.0 + shift), g * (1.0 - shift), b * (1.0 + shift))
    }
}

#[inline]
fn apply_saturation(r: f32, g: f32, b: f32, saturation: f32) -> (f32, f32, f32) {
    if saturation == 0.0 {
        return (r, g, b);
    }
    let gray = calculate_luminance(r, g, b);
    let factor = 1.0 + saturation / 100.0;
    (
        gray + (r - gray) * factor,
        gray + (g - gray) * factor,
        gray + (b - gray) * factor,
    )
}

/// Saturation that backs off on already saturated colors and skin tones.
#[inline]
fn apply_vibrance(r: f32, g: f32, b: f32, vibrance: f32) -> (f32, f32, f32) {
    if vibrance == 0.0 {
        return (r, g, b);
    }
    let max_c = r.max(g).max(b);
    let min_c = r.min(g).min(b);
    let current_sat = if max_c > 0.0 {
        ((max_c - min_c) / max_c).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let is_skin = r > g && g > b && (r - g) > 0.06;
    let skin_protection = if is_skin { 0.5 } else { 1.0 };

    apply_saturation(r, g, b, vibrance * skin_protection * (1.0 - current_sat))
}

/// Blend toward the sepia matrix by `amount`.
#[inline]
fn apply_sepia(r: f32, g: f32, b: f32, amount: f32) -> (f32, f32, f32) {
    if amount == 0.0 {
        return (r, g, b);
    }
    let tone = |row: [f32; 3]| row[0] * r + row[1] * g + row[2] * b;
    let (sr, sg, sb) = (tone(SEPIA_MATRIX[0]), tone(SEPIA_MATRIX[1]), tone(SEPIA_MATRIX[2]));
    (
        r + (sr - r) * amount,
        g + (sg - g) * amount,
        b + (sb - b) * amount,
    )
}
