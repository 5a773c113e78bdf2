//! Luminance calculation utilities using ITU-R BT.709 coefficients.
//!
//! Shared by histogram computation, border estimation, tone masks and the
//! color grading stages.

/// ITU-R BT.709 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.2126;

/// ITU-R BT.709 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.7152;

/// ITU-R BT.709 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.0722;

/// Calculate luminance from normalized RGB values (0.0 to 1.0).
///
/// # Arguments
/// * `r` - Red channel value
/// * `g` - Green channel value
/// * `b` - Blue channel value
///
/// # Returns
/// Luminance value; out-of-range input yields out-of-range output.
#[inline]
pub fn calculate_luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b
}

/// Luminance of an interleaved RGB(A) pixel slice.
#[inline]
pub fn pixel_luminance(px: &[f32]) -> f32 {
    calculate_luminance(px[0], px[1], px[2])
}

/// Quantize a normalized value to a 256-bin index.
///
/// Values are clamped to 0.0-1.0 and rounded, so bin `i` is centered on
/// `i / 255`.
#[inline]
pub fn to_bin(value: f32) -> usize {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_sum_to_one() {
        let sum = LUMINANCE_R + LUMINANCE_G + LUMINANCE_B;
        assert!((sum - 1.0).abs() < 1e-6, "Coefficients should sum to 1.0");
    }

    #[test]
    fn test_luminance_gray_preserves_value() {
        for v in [0.0f32, 0.25, 0.5, 0.75, 1.0] {
            assert!((calculate_luminance(v, v, v) - v).abs() < 1e-6);
        }
    }

    #[test]
    fn test_luminance_primaries() {
        assert!((calculate_luminance(1.0, 0.0, 0.0) - 0.2126).abs() < 1e-6);
        assert!((calculate_luminance(0.0, 1.0, 0.0) - 0.7152).abs() < 1e-6);
        assert!((pixel_luminance(&[0.0, 0.0, 1.0, 1.0]) - 0.0722).abs() < 1e-6);
    }

    #[test]
    fn test_to_bin() {
        assert_eq!(to_bin(0.0), 0);
        assert_eq!(to_bin(1.0), 255);
        assert_eq!(to_bin(-3.0), 0);
        assert_eq!(to_bin(7.0), 255);
        assert_eq!(to_bin(128.0 / 255.0), 128);
        assert_eq!(to_bin(f32::NAN), 0);
    }
}
