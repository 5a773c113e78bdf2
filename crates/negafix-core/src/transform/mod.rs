//! Geometry transforms applied at the head of the pipeline.
//!
//! # Transform Order
//!
//! 1. Perspective correction (4-point quad)
//! 2. Crop
//! 3. Quarter-turn rotation
//! 4. Mirror
//! 5. Straighten (cover-scaled, no empty corners)
//! 6. Scale
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Crop coordinates are normalized (0.0 to 1.0) relative to image dimensions
//! - Perspective corners are in pixels of their reference size
//! - Origin is top-left corner

mod crop;
mod orient;
mod perspective;
mod rotation;
mod sample;

pub use crop::apply_crop;
pub use orient::{mirror, rotate_quarter_turns};
pub use perspective::{apply_perspective, Homography};
pub use rotation::{apply_straighten, cover_scale};
pub use sample::{sample_bilinear, EdgeMode};

use crate::decode::{resize, FilterType, FloatImage};

/// Largest width or height [`apply_scale`] will produce.
pub const MAX_SCALED_DIMENSION: u32 = 32_768;

/// Largest pixel count [`apply_scale`] will produce (64 megapixels).
pub const MAX_SCALED_PIXELS: u64 = 1 << 26;

/// Resample by a uniform factor.
///
/// Factors equal to 1, non-positive or non-finite factors return a copy, as
/// does any factor whose output would exceed [`MAX_SCALED_DIMENSION`] or
/// [`MAX_SCALED_PIXELS`]. Output dimensions never drop below 1x1.
pub fn apply_scale(image: &FloatImage, factor: f32) -> FloatImage {
    if image.is_empty() || !factor.is_finite() || factor <= 0.0 || (factor - 1.0).abs() < 1e-6 {
        return image.clone();
    }
    let scaled = |side: u32| (f64::from(side) * f64::from(factor)).round().max(1.0);
    let (width, height) = (scaled(image.width), scaled(image.height));
    let limit = f64::from(MAX_SCALED_DIMENSION);
    if width > limit || height > limit || width * height > MAX_SCALED_PIXELS as f64 {
        tracing::debug!(factor, "scale factor exceeds output limit; skipped");
        return image.clone();
    }
    resize(image, width as u32, height as u32, FilterType::Bilinear)
        .unwrap_or_else(|_| image.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_half() {
        let img = FloatImage::filled(40, 20, [0.3, 0.3, 0.3]);
        let out = apply_scale(&img, 0.5);
        assert_eq!((out.width, out.height), (20, 10));
        assert!((out.pixel(5, 5)[0] - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_scale_noops() {
        let img = FloatImage::filled(4, 4, [0.3, 0.3, 0.3]);
        assert_eq!(apply_scale(&img, 1.0), img);
        assert_eq!(apply_scale(&img, 0.0), img);
        assert_eq!(apply_scale(&img, f32::INFINITY), img);
    }

    #[test]
    fn test_oversized_scale_returns_input() {
        let img = FloatImage::filled(2, 2, [0.3, 0.3, 0.3]);
        assert_eq!(apply_scale(&img, 1e30), img);
        assert_eq!(apply_scale(&img, f32::MAX), img);

        // 40_000 px wide breaks the dimension limit even though it is only
        // 40_000 pixels.
        let strip = FloatImage::filled(4, 1, [0.3, 0.3, 0.3]);
        assert_eq!(apply_scale(&strip, 10_000.0), strip);
    }

    #[test]
    fn test_scale_within_limit() {
        let img = FloatImage::filled(2, 2, [0.3, 0.3, 0.3]);
        let out = apply_scale(&img, 100.0);
        assert_eq!((out.width, out.height), (200, 200));
    }

    #[test]
    fn test_scale_minimum_size() {
        let img = FloatImage::filled(4, 4, [0.3, 0.3, 0.3]);
        let out = apply_scale(&img, 0.01);
        assert_eq!((out.width, out.height), (1, 1));
    }
}
