//! Threshold-based parallel helpers for RGBA float buffers.
//!
//! Small buffers (thumbnails, analysis copies, test fixtures) are processed
//! sequentially; thread pool dispatch costs more than it saves there.

use rayon::prelude::*;

use crate::decode::CHANNELS;

/// Minimum pixel count before work is spread across the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 16_384;

/// Apply `f` to every RGBA pixel in place.
pub fn for_each_pixel<F>(pixels: &mut [f32], f: F)
where
    F: Fn(&mut [f32]) + Sync + Send,
{
    if pixels.len() / CHANNELS >= PARALLEL_THRESHOLD {
        pixels.par_chunks_exact_mut(CHANNELS).for_each(f);
    } else {
        pixels.chunks_exact_mut(CHANNELS).for_each(f);
    }
}

/// Apply `f(y, row)` to every row of RGBA pixels in place.
pub fn for_each_row<F>(pixels: &mut [f32], width: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Sync + Send,
{
    let row_len = width * CHANNELS;
    if row_len == 0 {
        return;
    }
    if pixels.len() / CHANNELS >= PARALLEL_THRESHOLD {
        pixels
            .par_chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    } else {
        pixels
            .chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

/// Fold over RGBA pixels and combine the partial results.
///
/// `init` must produce the identity of `reduce_fn`.
pub fn fold_pixels<A, I, F, R>(pixels: &[f32], init: I, fold_fn: F, reduce_fn: R) -> A
where
    A: Send,
    I: Fn() -> A + Sync + Send,
    F: Fn(A, &[f32]) -> A + Sync + Send,
    R: Fn(A, A) -> A + Sync + Send,
{
    if pixels.len() / CHANNELS >= PARALLEL_THRESHOLD {
        pixels
            .par_chunks_exact(CHANNELS)
            .fold(&init, &fold_fn)
            .reduce(&init, &reduce_fn)
    } else {
        pixels
            .chunks_exact(CHANNELS)
            .fold(init(), |acc, px| fold_fn(acc, px))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_pixel_small_and_large() {
        for count in [4, PARALLEL_THRESHOLD + 3] {
            let mut pixels = vec![0.5f32; count * CHANNELS];
            for_each_pixel(&mut pixels, |px| px[0] = 1.0);
            assert!(pixels.chunks_exact(4).all(|px| px[0] == 1.0 && px[1] == 0.5));
        }
    }

    #[test]
    fn test_for_each_row_passes_row_index() {
        let mut pixels = vec![0.0f32; 3 * 2 * CHANNELS];
        for_each_row(&mut pixels, 3, |y, row| {
            for px in row.chunks_exact_mut(CHANNELS) {
                px[0] = y as f32;
            }
        });
        assert_eq!(pixels[0], 0.0);
        assert_eq!(pixels[3 * CHANNELS], 1.0);
    }

    #[test]
    fn test_fold_pixels_sums_match() {
        for count in [10, PARALLEL_THRESHOLD * 2] {
            let pixels = vec![1.0f32; count * CHANNELS];
            let total = fold_pixels(&pixels, || 0.0f64, |acc, px| acc + px[0] as f64, |a, b| a + b);
            assert_eq!(total, count as f64);
        }
    }
}
