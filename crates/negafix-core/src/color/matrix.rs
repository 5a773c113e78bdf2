//! Per-channel affine and polynomial color transforms.

use crate::decode::FloatImage;
use crate::parallel::for_each_pixel;

/// Affine per-channel transform: `out[c] = in[c] * scale[c] + bias[c]`.
///
/// Channels are ordered R, G, B, A. The identity has unit scale and zero
/// bias; alpha is normally left at identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    pub scale: [f32; 4],
    pub bias: [f32; 4],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrix {
    pub const fn identity() -> Self {
        Self {
            scale: [1.0; 4],
            bias: [0.0; 4],
        }
    }

    /// Diagonal RGB scale with alpha untouched.
    pub const fn diagonal(rgb: [f32; 3]) -> Self {
        Self {
            scale: [rgb[0], rgb[1], rgb[2], 1.0],
            bias: [0.0; 4],
        }
    }

    /// Additive RGB bias with alpha untouched.
    pub const fn offset(rgb: [f32; 3]) -> Self {
        Self {
            scale: [1.0; 4],
            bias: [rgb[0], rgb[1], rgb[2], 0.0],
        }
    }

    /// Scale and bias for the RGB channels with alpha untouched.
    pub const fn affine(scale: [f32; 3], bias: [f32; 3]) -> Self {
        Self {
            scale: [scale[0], scale[1], scale[2], 1.0],
            bias: [bias[0], bias[1], bias[2], 0.0],
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    #[inline]
    pub fn apply_pixel(&self, px: &mut [f32]) {
        for c in 0..4 {
            px[c] = px[c] * self.scale[c] + self.bias[c];
        }
    }

    /// Apply to every pixel; optionally clamp RGB to 0.0-1.0 afterwards.
    pub fn apply(&self, image: &mut FloatImage, clamp: bool) {
        if self.is_identity() && !clamp {
            return;
        }
        let matrix = *self;
        for_each_pixel(&mut image.pixels, move |px| {
            matrix.apply_pixel(px);
            if clamp {
                for v in &mut px[..3] {
                    *v = v.clamp(0.0, 1.0);
                }
            }
        });
    }
}

/// Cubic per-channel polynomial: `out = c0 + c1 x + c2 x^2 + c3 x^3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelPolynomial {
    /// Coefficients for R, G and B.
    pub coefficients: [[f32; 4]; 3],
}

/// Coefficients of the identity polynomial.
pub const IDENTITY_POLYNOMIAL: [f32; 4] = [0.0, 1.0, 0.0, 0.0];

impl Default for ChannelPolynomial {
    fn default() -> Self {
        Self {
            coefficients: [IDENTITY_POLYNOMIAL; 3],
        }
    }
}

impl ChannelPolynomial {
    pub fn new(red: [f32; 4], green: [f32; 4], blue: [f32; 4]) -> Self {
        Self {
            coefficients: [red, green, blue],
        }
    }

    /// Linear remap `(x - black) / (white - black)` for each channel.
    ///
    /// A range narrower than `1e-5` maps the channel to the constant
    /// `black`.
    pub fn from_ranges(ranges: [(f32, f32); 3]) -> Self {
        let mut coefficients = [IDENTITY_POLYNOMIAL; 3];
        for (c, &(black, white)) in ranges.iter().enumerate() {
            let span = white - black;
            coefficients[c] = if span.abs() < 1e-5 {
                [black, 0.0, 0.0, 0.0]
            } else {
                [-black / span, 1.0 / span, 0.0, 0.0]
            };
        }
        Self { coefficients }
    }

    pub fn is_identity(&self) -> bool {
        self.coefficients
            .iter()
            .all(|c| c.iter().zip(IDENTITY_POLYNOMIAL).all(|(a, b)| (a - b).abs() < 1e-6))
    }

    #[inline]
    pub fn evaluate(&self, channel: usize, x: f32) -> f32 {
        let [c0, c1, c2, c3] = self.coefficients[channel];
        c0 + x * (c1 + x * (c2 + x * c3))
    }

    pub fn apply(&self, image: &mut FloatImage) {
        if self.is_identity() {
            return;
        }
        let poly = *self;
        for_each_pixel(&mut image.pixels, move |px| {
            for c in 0..3 {
                px[c] = poly.evaluate(c, px[c]);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_preserves_alpha() {
        let mut img = FloatImage::filled(2, 2, [0.4, 0.3, 0.2]);
        ColorMatrix::diagonal([1.25, 2.0, 2.5]).apply(&mut img, false);
        let px = img.pixel(0, 0);
        assert!((px[0] - 0.5).abs() < 1e-6);
        assert!((px[1] - 0.6).abs() < 1e-6);
        assert!((px[2] - 0.5).abs() < 1e-6);
        assert_eq!(px[3], 1.0);
    }

    #[test]
    fn test_affine_with_clamp() {
        let mut img = FloatImage::filled(1, 1, [0.1, 0.5, 0.9]);
        ColorMatrix::affine([-1.0; 3], [1.2; 3]).apply(&mut img, true);
        let px = img.pixel(0, 0);
        assert_eq!(px[0], 1.0);
        assert!((px[1] - 0.7).abs() < 1e-6);
        assert!((px[2] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_matrix_is_noop() {
        let mut img = FloatImage::filled(1, 1, [1.5, -0.5, 0.5]);
        let original = img.clone();
        ColorMatrix::identity().apply(&mut img, false);
        assert_eq!(img, original);
    }

    #[test]
    fn test_polynomial_evaluate() {
        let poly = ChannelPolynomial::new([0.1, 0.5, 0.25, 0.125], IDENTITY_POLYNOMIAL, IDENTITY_POLYNOMIAL);
        let expected = 0.1 + 0.5 * 0.5 + 0.25 * 0.25 + 0.125 * 0.125;
        assert!((poly.evaluate(0, 0.5) - expected).abs() < 1e-6);
        assert!((poly.evaluate(1, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_ranges() {
        let poly = ChannelPolynomial::from_ranges([(0.0, 1.0), (0.2, 0.6), (0.3, 0.3)]);
        assert!((poly.evaluate(0, 0.42) - 0.42).abs() < 1e-6);
        assert!((poly.evaluate(1, 0.2)).abs() < 1e-6);
        assert!((poly.evaluate(1, 0.6) - 1.0).abs() < 1e-6);
        // Flat channel collapses to the constant black
        assert!((poly.evaluate(2, 0.9) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_default_polynomial_is_identity() {
        assert!(ChannelPolynomial::default().is_identity());
        assert!(ChannelPolynomial::from_ranges([(0.0, 1.0); 3]).is_identity());
    }
}
