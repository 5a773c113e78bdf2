//! Straightening: small-angle rotation that always fills the frame.
//!
//! The rotation uses inverse mapping: for each output pixel we compute the
//! source position and interpolate. The rotated image is scaled up just
//! enough that the output frame, which keeps the source dimensions, never
//! shows empty corners.
//!
//! For rotation by angle θ and cover scale s, the inverse transform is:
//! ```text
//! src_x = ((dst_x - cx) * cos(-θ) - (dst_y - cy) * sin(-θ)) / s + cx
//! src_y = ((dst_x - cx) * sin(-θ) + (dst_y - cy) * cos(-θ)) / s + cy
//! ```

use super::sample::{sample_bilinear, EdgeMode};
use crate::decode::{FloatImage, CHANNELS};
use crate::parallel::for_each_row;

/// Angles smaller than this (in degrees) are treated as no rotation.
const MIN_ANGLE: f64 = 0.001;

/// Scale factor that makes a `width` x `height` frame rotated by
/// `angle_degrees` completely cover the unrotated frame.
///
/// # Example
///
/// ```
/// use negafix_core::transform::cover_scale;
///
/// assert_eq!(cover_scale(100, 50, 0.0), 1.0);
/// assert!(cover_scale(100, 50, 10.0) > 1.0);
/// ```
pub fn cover_scale(width: u32, height: u32, angle_degrees: f64) -> f64 {
    if width == 0 || height == 0 || angle_degrees.abs() < MIN_ANGLE {
        return 1.0;
    }
    let angle = angle_degrees.to_radians();
    let (sin, cos) = (angle.sin().abs(), angle.cos().abs());
    let w = width as f64;
    let h = height as f64;
    ((w * cos + h * sin) / w).max((w * sin + h * cos) / h)
}

/// Rotate an image about its center by `angle_degrees`
/// (positive = counter-clockwise), keeping the source dimensions.
///
/// The content is scaled by [`cover_scale`] so every output pixel maps
/// inside the source. Non-finite angles return a copy.
pub fn apply_straighten(image: &FloatImage, angle_degrees: f64) -> FloatImage {
    if image.is_empty() || !angle_degrees.is_finite() || angle_degrees.abs() < MIN_ANGLE {
        return image.clone();
    }

    let scale = cover_scale(image.width, image.height, angle_degrees);

    // Negate angle for correct visual rotation direction
    let angle_rad = -angle_degrees.to_radians();
    let cos = angle_rad.cos() / scale;
    let sin = angle_rad.sin() / scale;

    let cx = image.width as f64 / 2.0;
    let cy = image.height as f64 / 2.0;

    let mut output = vec![0.0f32; image.pixel_count() * CHANNELS];
    for_each_row(&mut output, image.width as usize, |dst_y, row| {
        let dy = dst_y as f64 + 0.5 - cy;
        for (dst_x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let dx = dst_x as f64 + 0.5 - cx;
            let src_x = dx * cos - dy * sin + cx;
            let src_y = dx * sin + dy * cos + cy;
            px.copy_from_slice(&sample_bilinear(
                image,
                src_x as f32,
                src_y as f32,
                EdgeMode::Clamp,
            ));
        }
    });

    FloatImage::new(image.width, image.height, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simple gradient image for rotation tests.
    fn test_image(width: u32, height: u32) -> FloatImage {
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = (x + y) as f32 / (width + height) as f32;
                rgb.extend_from_slice(&[v, v, v]);
            }
        }
        FloatImage::from_rgb(width, height, &rgb)
    }

    #[test]
    fn test_no_rotation() {
        let img = test_image(100, 50);
        assert_eq!(apply_straighten(&img, 0.0), img);
        assert_eq!(apply_straighten(&img, f64::NAN), img);
    }

    #[test]
    fn test_straighten_keeps_dimensions() {
        let img = test_image(64, 48);
        let result = apply_straighten(&img, 7.5);
        assert_eq!((result.width, result.height), (64, 48));
    }

    #[test]
    fn test_straighten_has_no_empty_corners() {
        let img = FloatImage::filled(40, 30, [0.6, 0.6, 0.6]);
        let result = apply_straighten(&img, -12.0);
        for px in result.pixels.chunks_exact(CHANNELS) {
            assert!((px[0] - 0.6).abs() < 1e-5);
            assert_eq!(px[3], 1.0);
        }
    }

    #[test]
    fn test_center_pixel_is_stable() {
        let img = test_image(41, 41);
        let result = apply_straighten(&img, 20.0);
        let a = img.pixel(20, 20)[0];
        let b = result.pixel(20, 20)[0];
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn test_cover_scale() {
        assert_eq!(cover_scale(100, 100, 0.0), 1.0);
        // Square rotated 45 degrees needs sqrt(2)
        let s = cover_scale(100, 100, 45.0);
        assert!((s - std::f64::consts::SQRT_2).abs() < 1e-9);
        // Symmetric in sign
        assert!((cover_scale(80, 60, 5.0) - cover_scale(80, 60, -5.0)).abs() < 1e-12);
        assert_eq!(cover_scale(0, 10, 30.0), 1.0);
    }
}
