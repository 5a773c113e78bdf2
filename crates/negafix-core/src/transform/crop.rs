//! Image cropping operations.
//!
//! Crop parameters are normalized (0.0 to 1.0), so the same crop applies to
//! a full-resolution render and a thumbnail alike.
//!
//! # Coordinate System
//!
//! - (0.0, 0.0) = top-left corner
//! - (1.0, 1.0) = bottom-right corner
//! - width/height are relative to original dimensions

use crate::decode::{FloatImage, CHANNELS};
use crate::params::CropRect;

/// Apply crop to an image using normalized coordinates.
///
/// # Arguments
///
/// * `image` - Source image to crop
/// * `crop` - Crop region, normalized to the source dimensions
///
/// # Behavior
///
/// - If coordinates extend beyond image bounds, they are clamped
/// - Minimum output dimension is 1x1 pixels
/// - Full crop (0, 0, 1, 1) or a non-finite rect returns a copy of the source
pub fn apply_crop(image: &FloatImage, crop: &CropRect) -> FloatImage {
    let finite = [crop.left, crop.top, crop.width, crop.height]
        .iter()
        .all(|v| v.is_finite());
    if image.is_empty() || !finite || crop.is_full() {
        return image.clone();
    }

    let src_w = image.width as f32;
    let src_h = image.height as f32;

    let px_left = (crop.left.clamp(0.0, 1.0) * src_w).round() as u32;
    let px_top = (crop.top.clamp(0.0, 1.0) * src_h).round() as u32;
    let px_width = (crop.width.clamp(0.0, 1.0) * src_w).round() as u32;
    let px_height = (crop.height.clamp(0.0, 1.0) * src_h).round() as u32;

    // Clamp to image bounds
    let px_left = px_left.min(image.width.saturating_sub(1));
    let px_top = px_top.min(image.height.saturating_sub(1));
    let px_right = (px_left + px_width).min(image.width);
    let px_bottom = (px_top + px_height).min(image.height);

    let out_width = px_right.saturating_sub(px_left).max(1);
    let out_height = px_bottom.saturating_sub(px_top).max(1);

    let row_len = out_width as usize * CHANNELS;
    let mut output = Vec::with_capacity(row_len * out_height as usize);

    // Copy pixel data row by row
    for y in 0..out_height {
        let start = ((px_top + y) as usize * image.width as usize + px_left as usize) * CHANNELS;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    FloatImage::new(out_width, out_height, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test image where each pixel's red value encodes its position.
    fn test_image(width: u32, height: u32) -> FloatImage {
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = (y * width + x) as f32;
                rgb.extend_from_slice(&[v, 0.0, 0.0]);
            }
        }
        FloatImage::from_rgb(width, height, &rgb)
    }

    #[test]
    fn test_full_crop_returns_copy() {
        let img = test_image(10, 10);
        assert_eq!(apply_crop(&img, &CropRect::default()), img);
    }

    #[test]
    fn test_center_crop() {
        let img = test_image(100, 100);
        let cropped = apply_crop(&img, &CropRect::new(0.25, 0.25, 0.5, 0.5));
        assert_eq!(cropped.width, 50);
        assert_eq!(cropped.height, 50);
        assert_eq!(cropped.pixel(0, 0)[0], (25 * 100 + 25) as f32);
    }

    #[test]
    fn test_crop_preserves_content() {
        let img = test_image(4, 4);
        let cropped = apply_crop(&img, &CropRect::new(0.5, 0.5, 0.5, 0.5));
        assert_eq!(cropped.width, 2);
        assert_eq!(cropped.pixel(0, 0)[0], 10.0);
        assert_eq!(cropped.pixel(1, 1)[0], 15.0);
    }

    #[test]
    fn test_crop_clamps_out_of_bounds() {
        let img = test_image(100, 100);
        let cropped = apply_crop(&img, &CropRect::new(0.8, 0.8, 0.5, 0.5));
        assert_eq!(cropped.width, 20);
        assert_eq!(cropped.height, 20);
    }

    #[test]
    fn test_crop_minimum_size() {
        let img = test_image(10, 10);
        let cropped = apply_crop(&img, &CropRect::new(0.5, 0.5, 0.0, 0.0));
        assert_eq!((cropped.width, cropped.height), (1, 1));
    }

    #[test]
    fn test_non_finite_crop_is_noop() {
        let img = test_image(8, 8);
        let cropped = apply_crop(&img, &CropRect::new(f32::NAN, 0.0, 0.5, 0.5));
        assert_eq!(cropped, img);
    }
}
