//! Negative to positive inversion.
//!
//! Two algorithms share one signature:
//!
//! - **Standard** (`v2`): `out = 1 - in`, clamped. Film base removal is a
//!   separate stage ([`super::film_base`]).
//! - **Base-relative** (`v1`, legacy): scale each channel by the film base
//!   color, `out = 1 - in / max(base, ε)`, clamped. The base comes from the
//!   sampled film-base color or, failing that, from the frame border.

use crate::color::ColorMatrix;
use crate::decode::{FloatImage, CHANNELS};
use crate::luminance::pixel_luminance;

/// Guards the base-relative scale against division by zero.
pub const INVERSION_EPSILON: f32 = 1e-5;

/// Width in pixels of each border strip sampled for base estimation.
pub const BORDER_STRIP: u32 = 20;

/// Border samples at or above this luminance are ignored.
pub const BORDER_LUMINANCE_THRESHOLD: f32 = 0.5;

/// Per-channel `out = 1 - in`, clamped to 0.0-1.0.
pub fn invert_standard(image: &mut FloatImage) {
    ColorMatrix::affine([-1.0; 3], [1.0; 3]).apply(image, true);
}

/// Affine transform `out = 1 - in / max(base, ε)`.
pub fn base_relative_matrix(base: [f32; 3]) -> ColorMatrix {
    let scale = base.map(|c| -1.0 / c.max(INVERSION_EPSILON));
    ColorMatrix::affine(scale, [1.0; 3])
}

/// Base-relative inversion.
///
/// Uses `base` when given, otherwise estimates it from the border. Falls
/// back to [`invert_standard`] when neither is available.
pub fn invert_base_relative(image: &mut FloatImage, base: Option<[f32; 3]>) {
    let base = base
        .filter(|b| b.iter().all(|c| c.is_finite()))
        .or_else(|| estimate_film_base(image));

    match base {
        Some(base) => {
            tracing::debug!(?base, "base-relative inversion");
            base_relative_matrix(base).apply(image, true);
        }
        None => {
            tracing::debug!("no film base available, using standard inversion");
            invert_standard(image);
        }
    }
}

/// Estimate the film base color from the four border strips.
///
/// Averages every opaque pixel within [`BORDER_STRIP`] of an edge whose
/// luminance is below [`BORDER_LUMINANCE_THRESHOLD`]. Returns `None` when no
/// such pixel exists.
pub fn estimate_film_base(image: &FloatImage) -> Option<[f32; 3]> {
    if image.is_empty() {
        return None;
    }

    let (w, h) = (image.width, image.height);
    let strip_x = BORDER_STRIP.min(w.div_ceil(2));
    let strip_y = BORDER_STRIP.min(h.div_ceil(2));

    let mut sum = [0.0f64; 3];
    let mut count = 0u64;

    for y in 0..h {
        let row_in_border = y < strip_y || y >= h - strip_y;
        let row = &image.pixels[(y * w) as usize * CHANNELS..((y + 1) * w) as usize * CHANNELS];
        for (x, px) in row.chunks_exact(CHANNELS).enumerate() {
            let x = x as u32;
            if !row_in_border && x >= strip_x && x < w - strip_x {
                continue;
            }
            if px[3] <= 0.0 || pixel_luminance(px) >= BORDER_LUMINANCE_THRESHOLD {
                continue;
            }
            sum[0] += px[0] as f64;
            sum[1] += px[1] as f64;
            sum[2] += px[2] as f64;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some([
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame with a uniform border color and a different interior.
    fn framed(width: u32, height: u32, border: [f32; 3], interior: [f32; 3]) -> FloatImage {
        let mut rgb = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let edge = x < BORDER_STRIP
                    || y < BORDER_STRIP
                    || x >= width - BORDER_STRIP
                    || y >= height - BORDER_STRIP;
                rgb.extend_from_slice(if edge { &border } else { &interior });
            }
        }
        FloatImage::from_rgb(width, height, &rgb)
    }

    #[test]
    fn test_standard_inversion_mid_gray() {
        let mut img = FloatImage::filled(8, 8, [0.5, 0.5, 0.5]);
        invert_standard(&mut img);
        for px in img.pixels.chunks_exact(CHANNELS) {
            assert!((px[0] - 0.5).abs() < 1e-6);
            assert!((px[1] - 0.5).abs() < 1e-6);
            assert!((px[2] - 0.5).abs() < 1e-6);
            assert_eq!(px[3], 1.0);
        }
    }

    #[test]
    fn test_standard_inversion_clamps() {
        let mut img = FloatImage::from_rgb(1, 1, &[1.4, -0.2, 0.25]);
        invert_standard(&mut img);
        assert_eq!(img.pixel(0, 0), [0.0, 1.0, 0.75, 1.0]);
    }

    #[test]
    fn test_base_relative_matrix() {
        let m = base_relative_matrix([0.4, 0.2, 0.0]);
        let mut px = [0.2, 0.2, 0.0, 1.0];
        m.apply_pixel(&mut px);
        assert!((px[0] - 0.5).abs() < 1e-6);
        assert!(px[1].abs() < 1e-6);
        assert!((px[2] - 1.0).abs() < 1e-6);
        assert_eq!(px[3], 1.0);
        assert_eq!(m.scale[2], -1.0 / INVERSION_EPSILON);
    }

    #[test]
    fn test_estimate_uses_dark_border() {
        let img = framed(60, 50, [0.3, 0.2, 0.1], [0.9, 0.9, 0.9]);
        let base = estimate_film_base(&img).unwrap();
        assert!((base[0] - 0.3).abs() < 1e-5);
        assert!((base[1] - 0.2).abs() < 1e-5);
        assert!((base[2] - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_estimate_ignores_bright_border() {
        let img = framed(60, 50, [0.9, 0.8, 0.7], [0.1, 0.1, 0.1]);
        assert!(estimate_film_base(&img).is_none());
    }

    #[test]
    fn test_estimate_small_frame() {
        let img = FloatImage::filled(3, 3, [0.2, 0.2, 0.2]);
        let base = estimate_film_base(&img).unwrap();
        assert!((base[0] - 0.2).abs() < 1e-6);
        assert!(estimate_film_base(&FloatImage::empty()).is_none());
    }

    #[test]
    fn test_base_relative_falls_back_to_standard() {
        let mut a = FloatImage::filled(30, 30, [0.8, 0.7, 0.6]);
        let mut b = a.clone();
        invert_base_relative(&mut a, None);
        invert_standard(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_base_relative_with_sample() {
        let mut img = FloatImage::filled(4, 4, [0.4, 0.3, 0.2]);
        invert_base_relative(&mut img, Some([0.8, 0.6, 0.4]));
        let px = img.pixel(1, 1);
        for c in 0..3 {
            assert!((px[c] - 0.5).abs() < 1e-6);
        }
    }
}
