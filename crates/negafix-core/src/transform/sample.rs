//! Bilinear sampling of float images at fractional positions.
//!
//! Coordinates are continuous image-space positions: pixel `(i, j)` covers
//! `[i, i+1) x [j, j+1)` and its center sits at `(i + 0.5, j + 0.5)`.

use crate::decode::FloatImage;

/// Behavior for positions outside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    /// Outside samples are transparent black.
    Transparent,
    /// Outside samples repeat the nearest edge pixel.
    Clamp,
}

pub const TRANSPARENT: [f32; 4] = [0.0; 4];

/// Sample `image` at continuous position (x, y) with bilinear interpolation.
pub fn sample_bilinear(image: &FloatImage, x: f32, y: f32, edge: EdgeMode) -> [f32; 4] {
    if image.is_empty() || !x.is_finite() || !y.is_finite() {
        return TRANSPARENT;
    }
    let (w, h) = (image.width as f32, image.height as f32);

    if edge == EdgeMode::Transparent && (x < 0.0 || y < 0.0 || x > w || y > h) {
        return TRANSPARENT;
    }

    // Shift to pixel-center space and clamp to the valid grid
    let fx = (x - 0.5).clamp(0.0, w - 1.0);
    let fy = (y - 0.5).clamp(0.0, h - 1.0);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(image.width - 1);
    let y1 = (y0 + 1).min(image.height - 1);
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let p00 = image.pixel(x0, y0);
    let p10 = image.pixel(x1, y0);
    let p01 = image.pixel(x0, y1);
    let p11 = image.pixel(x1, y1);

    let mut out = [0.0f32; 4];
    for c in 0..4 {
        let top = p00[c] + (p10[c] - p00[c]) * tx;
        let bottom = p01[c] + (p11[c] - p01[c]) * tx;
        out[c] = top + (bottom - top) * ty;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_one() -> FloatImage {
        FloatImage::from_rgb(2, 1, &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn test_pixel_centers_are_exact() {
        let img = two_by_one();
        assert_eq!(sample_bilinear(&img, 0.5, 0.5, EdgeMode::Clamp)[0], 0.0);
        assert_eq!(sample_bilinear(&img, 1.5, 0.5, EdgeMode::Clamp)[0], 1.0);
    }

    #[test]
    fn test_interpolates_between_centers() {
        let img = two_by_one();
        let px = sample_bilinear(&img, 1.0, 0.5, EdgeMode::Clamp);
        assert!((px[0] - 0.5).abs() < 1e-6);
        assert_eq!(px[3], 1.0);
    }

    #[test]
    fn test_edge_modes() {
        let img = two_by_one();
        assert_eq!(sample_bilinear(&img, -3.0, 0.5, EdgeMode::Transparent), TRANSPARENT);
        assert_eq!(sample_bilinear(&img, -3.0, 0.5, EdgeMode::Clamp)[3], 1.0);
        assert_eq!(sample_bilinear(&img, 5.0, 0.5, EdgeMode::Clamp)[0], 1.0);
    }

    #[test]
    fn test_empty_and_nan() {
        assert_eq!(
            sample_bilinear(&FloatImage::empty(), 0.0, 0.0, EdgeMode::Clamp),
            TRANSPARENT
        );
        assert_eq!(sample_bilinear(&two_by_one(), f32::NAN, 0.5, EdgeMode::Clamp), TRANSPARENT);
    }
}
