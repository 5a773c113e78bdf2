//! Four-point perspective correction.
//!
//! Maps an arbitrary quadrilateral in the source (e.g. a film frame shot at
//! a slight angle on a copy stand) onto an upright rectangle. The output
//! rectangle's width is the mean of the quad's top and bottom edge lengths
//! and its height the mean of the left and right edge lengths.

use super::sample::{sample_bilinear, EdgeMode};
use crate::decode::{FloatImage, CHANNELS};
use crate::params::{PerspectiveQuad, Point};
use crate::parallel::for_each_row;

/// A projective transform stored row-major with `h[8] = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography([f64; 9]);

impl Homography {
    /// Solve for the homography mapping each `from[i]` onto `to[i]`.
    ///
    /// Returns `None` for degenerate configurations (collinear points).
    pub fn from_correspondences(from: [(f64, f64); 4], to: [(f64, f64); 4]) -> Option<Self> {
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = from[i];
            let (u, v) = to[i];
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, v];
        }
        let h = solve_8x8(a)?;
        Some(Self([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0]))
    }

    /// Map a point; `None` when it lands on the line at infinity.
    pub fn map(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let h = &self.0;
        let w = h[6] * x + h[7] * y + h[8];
        if w.abs() < 1e-12 {
            return None;
        }
        Some((
            (h[0] * x + h[1] * y + h[2]) / w,
            (h[3] * x + h[4] * y + h[5]) / w,
        ))
    }
}

/// Gaussian elimination with partial pivoting on an 8x9 augmented matrix.
fn solve_8x8(mut a: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let pivot = (col..8).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot);

        for row in 0..8 {
            if row == col {
                continue;
            }
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..9 {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for i in 0..8 {
        x[i] = a[i][8] / a[i][i];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

fn distance(a: Point, b: Point) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Scale the quad from its reference size to the image and clamp it inside.
fn quad_in_image(quad: &PerspectiveQuad, width: u32, height: u32) -> Option<[Point; 4]> {
    let ref_ok = quad.reference_width.is_finite()
        && quad.reference_height.is_finite()
        && quad.reference_width > 0.0
        && quad.reference_height > 0.0;
    if !ref_ok || quad.corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return None;
    }

    let sx = width as f32 / quad.reference_width;
    let sy = height as f32 / quad.reference_height;
    Some(quad.corners.map(|p| {
        Point::new(
            (p.x * sx).clamp(0.0, width as f32),
            (p.y * sy).clamp(0.0, height as f32),
        )
    }))
}

/// Warp the quad onto an upright rectangle.
///
/// Invalid or degenerate quads return a copy of the input.
pub fn apply_perspective(image: &FloatImage, quad: &PerspectiveQuad) -> FloatImage {
    if image.is_empty() {
        return image.clone();
    }
    let Some(corners) = quad_in_image(quad, image.width, image.height) else {
        return image.clone();
    };
    let [tl, tr, br, bl] = corners;

    let out_w = ((distance(tl, tr) + distance(bl, br)) / 2.0).round() as u32;
    let out_h = ((distance(tl, bl) + distance(tr, br)) / 2.0).round() as u32;
    if out_w == 0 || out_h == 0 {
        return image.clone();
    }

    let (w, h) = (out_w as f64, out_h as f64);
    let target = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let source = corners.map(|p| (p.x as f64, p.y as f64));
    let Some(homography) = Homography::from_correspondences(target, source) else {
        return image.clone();
    };

    let mut output = vec![0.0f32; out_w as usize * out_h as usize * CHANNELS];
    for_each_row(&mut output, out_w as usize, |y, row| {
        let cy = y as f64 + 0.5;
        for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let value = match homography.map(x as f64 + 0.5, cy) {
                Some((sx, sy)) => {
                    sample_bilinear(image, sx as f32, sy as f32, EdgeMode::Transparent)
                }
                None => [0.0; 4],
            };
            px.copy_from_slice(&value);
        }
    });

    FloatImage::new(out_w, out_h, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(corners: [(f32, f32); 4], reference: (f32, f32)) -> PerspectiveQuad {
        PerspectiveQuad {
            corners: corners.map(|(x, y)| Point::new(x, y)),
            reference_width: reference.0,
            reference_height: reference.1,
        }
    }

    fn gradient(width: u32, height: u32) -> FloatImage {
        let mut rgb = Vec::new();
        for y in 0..height {
            for x in 0..width {
                rgb.extend_from_slice(&[x as f32 / width as f32, y as f32 / height as f32, 0.5]);
            }
        }
        FloatImage::from_rgb(width, height, &rgb)
    }

    #[test]
    fn test_identity_homography() {
        let pts = [(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (0.0, 5.0)];
        let h = Homography::from_correspondences(pts, pts).unwrap();
        let (x, y) = h.map(3.0, 4.0).unwrap();
        assert!((x - 3.0).abs() < 1e-9);
        assert!((y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_homography_maps_corners() {
        let from = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let to = [(2.0, 1.0), (9.0, 0.0), (10.0, 8.0), (1.0, 7.0)];
        let h = Homography::from_correspondences(from, to).unwrap();
        for i in 0..4 {
            let (x, y) = h.map(from[i].0, from[i].1).unwrap();
            assert!((x - to[i].0).abs() < 1e-9);
            assert!((y - to[i].1).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_correspondences() {
        let from = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let coincident = [(5.0, 5.0); 4];
        assert!(Homography::from_correspondences(from, coincident).is_none());
    }

    #[test]
    fn test_full_frame_quad_is_identity() {
        let img = gradient(20, 10);
        let q = quad([(0.0, 0.0), (20.0, 0.0), (20.0, 10.0), (0.0, 10.0)], (20.0, 10.0));
        let out = apply_perspective(&img, &q);
        assert_eq!((out.width, out.height), (20, 10));
        for (a, b) in out.pixels.iter().zip(&img.pixels) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_quad_in_reference_coordinates_is_rescaled() {
        // Quad drawn on a 200x100 preview of a 20x10 image
        let img = gradient(20, 10);
        let q = quad([(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)], (200.0, 100.0));
        let out = apply_perspective(&img, &q);
        assert_eq!((out.width, out.height), (10, 10));
        assert!((out.pixel(9, 0)[0] - img.pixel(9, 0)[0]).abs() < 1e-4);
    }

    #[test]
    fn test_output_size_is_mean_edge_length() {
        let img = gradient(100, 100);
        // Trapezoid: top edge 60, bottom edge 100, sides ~80.6
        let q = quad([(20.0, 10.0), (80.0, 10.0), (100.0, 90.0), (0.0, 90.0)], (100.0, 100.0));
        let out = apply_perspective(&img, &q);
        assert_eq!(out.width, 80);
        assert_eq!(out.height, 82);
        assert!(out.pixels.chunks_exact(CHANNELS).all(|px| px[3] > 0.0));
    }

    #[test]
    fn test_invalid_quads_are_noops() {
        let img = gradient(8, 8);
        let zero_ref = quad([(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)], (0.0, 8.0));
        assert_eq!(apply_perspective(&img, &zero_ref), img);
        let nan = quad([(f32::NAN, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)], (8.0, 8.0));
        assert_eq!(apply_perspective(&img, &nan), img);
        let point = quad([(4.0, 4.0); 4], (8.0, 8.0));
        assert_eq!(apply_perspective(&img, &point), img);
    }
}
