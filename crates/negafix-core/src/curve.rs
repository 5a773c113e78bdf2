//! Monotonic tone curves using cubic Hermite splines (Fritsch-Carlson).
//!
//! The Fritsch-Carlson tangent construction guarantees the interpolated curve
//! never overshoots between control points, so a monotone set of points can
//! never produce tone reversals (solarization).

use serde::{Deserialize, Serialize};

use crate::decode::FloatImage;
use crate::parallel::for_each_pixel;

/// Tone curve control point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Input value (0.0 to 1.0)
    pub x: f32,
    /// Output value (0.0 to 1.0)
    pub y: f32,
}

impl CurvePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Curve
// ============================================================================

/// A monotone cubic tone curve with pre-computed tangents.
#[derive(Debug, Clone)]
pub struct ToneCurve {
    points: Vec<CurvePoint>,
    tangents: Vec<f32>,
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self::from_points(vec![CurvePoint::new(0.0, 0.0), CurvePoint::new(1.0, 1.0)])
    }
}

impl ToneCurve {
    /// Build a curve from control points; points are sorted by x.
    pub fn from_points(mut points: Vec<CurvePoint>) -> Self {
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        let tangents = monotone_tangents(&points);
        Self { points, tangents }
    }

    /// The 5-point S-curve used by tone mapping.
    ///
    /// Endpoints are fixed at (0,0) and (1,1) with a true midpoint at
    /// (0.5,0.5); the quarter points sit at `0.25 + shadow_lift` and
    /// `0.75 - highlight_pull`, each clamped to 0.0-1.0.
    pub fn s_curve(shadow_lift: f32, highlight_pull: f32) -> Self {
        Self::from_points(vec![
            CurvePoint::new(0.0, 0.0),
            CurvePoint::new(0.25, (0.25 + shadow_lift).clamp(0.0, 1.0)),
            CurvePoint::new(0.5, 0.5),
            CurvePoint::new(0.75, (0.75 - highlight_pull).clamp(0.0, 1.0)),
            CurvePoint::new(1.0, 1.0),
        ])
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Check if every control point lies on the diagonal.
    pub fn is_identity(&self) -> bool {
        self.points.len() >= 2
            && self.points[0].x.abs() < f32::EPSILON
            && (self.points[self.points.len() - 1].x - 1.0).abs() < f32::EPSILON
            && self.points.iter().all(|p| (p.x - p.y).abs() < f32::EPSILON)
    }

    /// Evaluate the curve at x. Input outside the curve's domain is clamped.
    pub fn evaluate(&self, x: f32) -> f32 {
        evaluate_with_tangents(&self.points, &self.tangents, x)
    }

    /// Apply the curve to the RGB channels of an image; alpha is unchanged.
    pub fn apply(&self, image: &mut FloatImage) {
        if self.is_identity() {
            return;
        }
        let lut = ToneCurveLut::from_curve(self);
        for_each_pixel(&mut image.pixels, |px| {
            for v in &mut px[..3] {
                *v = lut.sample(*v);
            }
        });
    }
}

// ============================================================================
// LUT
// ============================================================================

/// Number of LUT entries; samples between entries are linearly interpolated.
const LUT_SIZE: usize = 4096;

/// Pre-computed float lookup table for efficient curve application.
#[derive(Debug, Clone)]
pub struct ToneCurveLut {
    lut: Vec<f32>,
}

impl ToneCurveLut {
    /// Generate LUT from a tone curve.
    pub fn from_curve(curve: &ToneCurve) -> Self {
        let lut = (0..LUT_SIZE)
            .map(|i| curve.evaluate(i as f32 / (LUT_SIZE - 1) as f32))
            .collect();
        Self { lut }
    }

    /// Look up `x` (clamped to 0.0-1.0).
    #[inline]
    pub fn sample(&self, x: f32) -> f32 {
        if x.is_nan() {
            return self.lut[0];
        }
        let pos = x.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f32;
        let i = (pos as usize).min(LUT_SIZE - 2);
        let t = pos - i as f32;
        self.lut[i] + (self.lut[i + 1] - self.lut[i]) * t
    }
}

// ============================================================================
// Spline
// ============================================================================

fn secant(a: &CurvePoint, b: &CurvePoint) -> f32 {
    let dx = b.x - a.x;
    if dx.abs() < f32::EPSILON {
        0.0
    } else {
        (b.y - a.y) / dx
    }
}

/// Fritsch-Carlson tangents.
///
/// Interior tangents start as the mean of the neighbouring secants (zero at
/// local extrema), then each segment's pair is scaled back into the circle
/// of radius 3 in (alpha, beta) space, which is sufficient for monotonicity.
fn monotone_tangents(points: &[CurvePoint]) -> Vec<f32> {
    let n = points.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let secants: Vec<f32> = points.windows(2).map(|w| secant(&w[0], &w[1])).collect();

    let mut tangents = Vec::with_capacity(n);
    tangents.push(secants[0]);
    tangents.extend(secants.windows(2).map(|pair| {
        if pair[0] * pair[1] <= 0.0 {
            0.0
        } else {
            (pair[0] + pair[1]) * 0.5
        }
    }));
    tangents.push(secants[n - 2]);

    for (i, &slope) in secants.iter().enumerate() {
        if slope.abs() < f32::EPSILON {
            tangents[i] = 0.0;
            tangents[i + 1] = 0.0;
            continue;
        }
        let alpha = tangents[i] / slope;
        let beta = tangents[i + 1] / slope;
        let radius_sq = alpha * alpha + beta * beta;
        if radius_sq > 9.0 {
            let tau = 3.0 / radius_sq.sqrt();
            tangents[i] = tau * alpha * slope;
            tangents[i + 1] = tau * beta * slope;
        }
    }
    tangents
}

fn evaluate_with_tangents(points: &[CurvePoint], tangents: &[f32], x: f32) -> f32 {
    let n = points.len();
    match n {
        0 => return x,
        1 => return points[0].y,
        _ => {}
    }

    let x = x.clamp(points[0].x, points[n - 1].x);
    let i = points
        .partition_point(|p| p.x <= x)
        .saturating_sub(1)
        .min(n - 2);
    let (p0, p1) = (&points[i], &points[i + 1]);

    let h = p1.x - p0.x;
    if h.abs() < f32::EPSILON {
        return p0.y;
    }

    // Hermite basis in factored form.
    let t = (x - p0.x) / h;
    let s = 1.0 - t;
    let y = s * s * (1.0 + 2.0 * t) * p0.y
        + t * t * (3.0 - 2.0 * t) * p1.y
        + h * t * s * (s * tangents[i] - t * tangents[i + 1]);
    y.clamp(0.0, 1.0)
}
