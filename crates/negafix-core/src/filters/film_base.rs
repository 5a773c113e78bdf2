//! Film-base neutralization.
//!
//! Divides out the substrate color of the film stock in linear space. The
//! sampled base is clamped to at least 5% per channel and the resulting
//! gain is capped, so a bad sample cannot produce an extreme color shift.

use crate::color::ColorMatrix;
use crate::decode::FloatImage;

/// Lowest accepted base channel value; darker samples are sampling error.
pub const MIN_BASE_CHANNEL: f32 = 0.05;

/// Upper bound on the per-channel correction factor.
pub const MAX_CORRECTION: f32 = 10.0;

/// Per-channel gain for a film-base sample. Always in `(0, MAX_CORRECTION]`.
pub fn correction_factors(sample: [f32; 3]) -> [f32; 3] {
    sample.map(|c| {
        if !c.is_finite() {
            return 1.0;
        }
        (1.0 / c.clamp(MIN_BASE_CHANNEL, 1.0)).min(MAX_CORRECTION)
    })
}

/// Apply the correction for `sample`; a missing sample is a no-op.
pub fn neutralize_film_base(image: &mut FloatImage, sample: Option<[f32; 3]>) {
    let Some(sample) = sample else {
        return;
    };
    let factors = correction_factors(sample);
    tracing::debug!(?sample, ?factors, "film base neutralization");
    ColorMatrix::diagonal(factors).apply(image, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_factors_and_pixel() {
        let factors = correction_factors([0.8, 0.6, 0.4]);
        assert!((factors[0] - 1.25).abs() < 1e-5);
        assert!((factors[1] - 1.6667).abs() < 1e-4);
        assert!((factors[2] - 2.5).abs() < 1e-5);

        let mut img = FloatImage::from_rgb(1, 1, &[0.4, 0.3, 0.2]);
        neutralize_film_base(&mut img, Some([0.8, 0.6, 0.4]));
        let px = img.pixel(0, 0);
        for c in 0..3 {
            assert!((px[c] - 0.5).abs() < 1e-5, "channel {c}: {}", px[c]);
        }
        assert_eq!(px[3], 1.0);
    }

    #[test]
    fn test_dark_sample_is_capped() {
        // 0.01 clamps to 0.05, whose reciprocal 20 exceeds the cap
        assert_eq!(correction_factors([0.01, 0.0, -1.0]), [10.0; 3]);
    }

    #[test]
    fn test_bright_sample_is_unity() {
        assert_eq!(correction_factors([1.0, 2.0, 1.0]), [1.0; 3]);
    }

    #[test]
    fn test_no_sample_is_noop() {
        let mut img = FloatImage::filled(2, 2, [0.2, 0.4, 0.6]);
        let original = img.clone();
        neutralize_film_base(&mut img, None);
        assert_eq!(img, original);
    }

    #[test]
    fn test_non_finite_channel() {
        assert_eq!(correction_factors([f32::NAN, 0.5, f32::INFINITY]), [1.0, 2.0, 1.0]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn correction_is_bounded(
            r in -10.0f32..10.0,
            g in -10.0f32..10.0,
            b in -10.0f32..10.0,
        ) {
            for f in correction_factors([r, g, b]) {
                prop_assert!(f > 0.0 && f <= MAX_CORRECTION, "factor {}", f);
            }
        }

        #[test]
        fn correction_is_bounded_for_any_float(c in proptest::num::f32::ANY) {
            let f = correction_factors([c, c, c])[0];
            prop_assert!(f > 0.0 && f <= MAX_CORRECTION);
        }
    }
}
