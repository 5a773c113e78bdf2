//! Three-dimensional color lookup cube with trilinear interpolation.

use rayon::prelude::*;

use crate::decode::FloatImage;
use crate::parallel::for_each_pixel;

/// Default grid resolution per axis.
pub const DEFAULT_CUBE_SIZE: usize = 32;

/// A discretized `RGB -> RGB` function sampled on a regular grid.
///
/// Entries are stored red-fastest: index `r + g * n + b * n * n`.
#[derive(Debug, Clone)]
pub struct ColorCube {
    size: usize,
    data: Vec<[f32; 3]>,
}

impl ColorCube {
    /// Build a cube by sampling `f` at every grid point.
    ///
    /// `size` is clamped to at least 2.
    pub fn from_fn<F>(size: usize, f: F) -> Self
    where
        F: Fn(f32, f32, f32) -> [f32; 3] + Sync,
    {
        let size = size.max(2);
        let step = 1.0 / (size - 1) as f32;
        let data = (0..size * size * size)
            .into_par_iter()
            .map(|i| {
                let r = (i % size) as f32 * step;
                let g = ((i / size) % size) as f32 * step;
                let b = (i / (size * size)) as f32 * step;
                f(r, g, b)
            })
            .collect();
        Self { size, data }
    }

    pub fn identity(size: usize) -> Self {
        Self::from_fn(size, |r, g, b| [r, g, b])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn at(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.data[r + g * self.size + b * self.size * self.size]
    }

    /// Trilinear lookup; input is clamped to the cube domain 0.0-1.0.
    pub fn lookup(&self, r: f32, g: f32, b: f32) -> [f32; 3] {
        let max_index = (self.size - 1) as f32;
        let locate = |v: f32| {
            let pos = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) * max_index };
            let i0 = (pos.floor() as usize).min(self.size - 2);
            (i0, pos - i0 as f32)
        };
        let (r0, fr) = locate(r);
        let (g0, fg) = locate(g);
        let (b0, fb) = locate(b);

        let mut out = [0.0f32; 3];
        for (db, wb) in [(0, 1.0 - fb), (1, fb)] {
            for (dg, wg) in [(0, 1.0 - fg), (1, fg)] {
                for (dr, wr) in [(0, 1.0 - fr), (1, fr)] {
                    let w = wr * wg * wb;
                    if w == 0.0 {
                        continue;
                    }
                    let v = self.at(r0 + dr, g0 + dg, b0 + db);
                    out[0] += v[0] * w;
                    out[1] += v[1] * w;
                    out[2] += v[2] * w;
                }
            }
        }
        out
    }

    /// Map every pixel through the cube. Alpha is unchanged.
    pub fn apply(&self, image: &mut FloatImage) {
        for_each_pixel(&mut image.pixels, |px| {
            let out = self.lookup(px[0], px[1], px[2]);
            px[..3].copy_from_slice(&out);
        });
    }
}
