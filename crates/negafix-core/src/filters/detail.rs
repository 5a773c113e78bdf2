//! Sharpening and luminance noise reduction.
//!
//! Runs last so upstream gain changes are not amplified. Stage order:
//! noise reduction, unsharp mask, then global sharpness (a radius 1 unsharp
//! mask).

use crate::decode::{FloatImage, CHANNELS};
use crate::luminance::pixel_luminance;
use crate::params::DetailParams;
use crate::parallel::for_each_row;

/// Blur radius used by noise reduction and global sharpness.
pub const DETAIL_RADIUS: f32 = 1.0;

/// Apply noise reduction and sharpening.
pub fn apply_detail(image: &mut FloatImage, params: &DetailParams) {
    reduce_luminance_noise(image, params.noise_level);
    unsharp_mask(image, params.unsharp_radius, params.unsharp_intensity);
    unsharp_mask(image, DETAIL_RADIUS, params.sharpness);
}

/// Normalized 1D gaussian kernel with `sigma = radius`.
fn gaussian_kernel(radius: f32) -> Vec<f32> {
    let half = (radius * 3.0).ceil().max(1.0) as i32;
    let two_sigma_sq = 2.0 * radius * radius;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable gaussian blur of the RGB channels with clamped edges.
///
/// Alpha is copied from the source. Non-positive or non-finite radii
/// return a copy. The radius is capped at the image's longer side.
pub fn gaussian_blur(image: &FloatImage, radius: f32) -> FloatImage {
    if image.is_empty() || !radius.is_finite() || radius <= 0.0 {
        return image.clone();
    }
    let radius = radius.min(image.width.max(image.height) as f32);
    let kernel = gaussian_kernel(radius);
    let half = (kernel.len() / 2) as i64;
    let width = image.width as usize;
    let height = image.height as i64;
    let src = &image.pixels;

    let mut horizontal = src.clone();
    for_each_row(&mut horizontal, width, |y, row| {
        let line = &src[y * width * CHANNELS..(y + 1) * width * CHANNELS];
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (x as i64 + k as i64 - half).clamp(0, width as i64 - 1) as usize;
                for c in 0..3 {
                    acc[c] += line[sx * CHANNELS + c] * weight;
                }
            }
            row[x * CHANNELS..x * CHANNELS + 3].copy_from_slice(&acc);
        }
    });

    let mut out = src.clone();
    let horizontal = &horizontal;
    for_each_row(&mut out, width, |y, row| {
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y as i64 + k as i64 - half).clamp(0, height - 1) as usize;
                let idx = (sy * width + x) * CHANNELS;
                for c in 0..3 {
                    acc[c] += horizontal[idx + c] * weight;
                }
            }
            row[x * CHANNELS..x * CHANNELS + 3].copy_from_slice(&acc);
        }
    });

    FloatImage::new(image.width, image.height, out)
}

/// `out = in + intensity * (in - blur(in, radius))`
///
/// Zero intensity is a no-op.
pub fn unsharp_mask(image: &mut FloatImage, radius: f32, intensity: f32) {
    if intensity == 0.0 || !intensity.is_finite() || radius <= 0.0 {
        return;
    }
    let blurred = gaussian_blur(image, radius);
    for (px, soft) in image
        .pixels
        .chunks_exact_mut(CHANNELS)
        .zip(blurred.pixels.chunks_exact(CHANNELS))
    {
        for c in 0..3 {
            px[c] += intensity * (px[c] - soft[c]);
        }
    }
}

/// Smooth luminance only, keeping each pixel's chroma.
///
/// `level` (0 to 1) blends the luminance toward a radius 1 blur.
pub fn reduce_luminance_noise(image: &mut FloatImage, level: f32) {
    if level <= 0.0 || !level.is_finite() {
        return;
    }
    let level = level.min(1.0);
    let blurred = gaussian_blur(image, DETAIL_RADIUS);
    for (px, soft) in image
        .pixels
        .chunks_exact_mut(CHANNELS)
        .zip(blurred.pixels.chunks_exact(CHANNELS))
    {
        let delta = (pixel_luminance(soft) - pixel_luminance(px)) * level;
        for v in &mut px[..3] {
            *v += delta;
        }
    }
}
