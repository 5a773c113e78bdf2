//! Hue/saturation/brightness conversion.

/// A color in HSB (HSV) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsb {
    /// Hue in degrees, 0.0 to 360.0.
    pub h: f32,
    /// Saturation, 0.0 to 1.0.
    pub s: f32,
    /// Brightness, 0.0 to 1.0.
    pub b: f32,
}

/// Convert RGB to HSB.
///
/// Input: RGB values in range 0.0-1.0 (clamped)
/// Output: hue 0.0-360.0, saturation and brightness 0.0-1.0
#[inline]
pub fn rgb_to_hsb(r: f32, g: f32, b: f32) -> Hsb {
    let r = r.clamp(0.0, 1.0);
    let g = g.clamp(0.0, 1.0);
    let b = b.clamp(0.0, 1.0);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if delta < 1e-6 {
        return Hsb {
            h: 0.0,
            s: 0.0,
            b: max,
        };
    }

    let s = if max > 0.0 { delta / max } else { 0.0 };

    let sector = if max == r {
        let h = (g - b) / delta;
        if h < 0.0 {
            h + 6.0
        } else {
            h
        }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    Hsb {
        h: (sector * 60.0) % 360.0,
        s,
        b: max,
    }
}

/// Convert HSB back to RGB in range 0.0-1.0.
#[inline]
pub fn hsb_to_rgb(hsb: Hsb) -> (f32, f32, f32) {
    let s = hsb.s.clamp(0.0, 1.0);
    let v = hsb.b.clamp(0.0, 1.0);
    if s < 1e-6 {
        return (v, v, v);
    }

    let h = hsb.h.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector as u32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Angular distance between two hues in degrees, handling wraparound.
#[inline]
pub fn hue_distance(h1: f32, h2: f32) -> f32 {
    let diff = (h1 - h2).rem_euclid(360.0);
    diff.min(360.0 - diff)
}

/// Check if `hue` lies within `width` degrees centered on `center`.
///
/// A range crossing 0/360 (e.g. center 350, width 40) is handled. A
/// non-positive width matches nothing.
#[inline]
pub fn hue_in_range(hue: f32, center: f32, width: f32) -> bool {
    if width <= 0.0 {
        return false;
    }
    if width >= 360.0 {
        return true;
    }
    hue_distance(hue, center) <= width / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rgb_close(a: (f32, f32, f32), b: (f32, f32, f32)) {
        assert!((a.0 - b.0).abs() < 1e-5, "{a:?} vs {b:?}");
        assert!((a.1 - b.1).abs() < 1e-5, "{a:?} vs {b:?}");
        assert!((a.2 - b.2).abs() < 1e-5, "{a:?} vs {b:?}");
    }

    #[test]
    fn test_primary_hues() {
        assert!((rgb_to_hsb(1.0, 0.0, 0.0).h - 0.0).abs() < 1e-4);
        assert!((rgb_to_hsb(0.0, 1.0, 0.0).h - 120.0).abs() < 1e-4);
        assert!((rgb_to_hsb(0.0, 0.0, 1.0).h - 240.0).abs() < 1e-4);
        assert!((rgb_to_hsb(0.0, 1.0, 1.0).h - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_gray_is_achromatic() {
        let hsb = rgb_to_hsb(0.4, 0.4, 0.4);
        assert_eq!(hsb.s, 0.0);
        assert!((hsb.b - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_roundtrip_samples() {
        for rgb in [
            (0.2, 0.5, 0.9),
            (0.9, 0.1, 0.3),
            (0.3, 0.8, 0.2),
            (0.6, 0.6, 0.1),
            (1.0, 1.0, 1.0),
            (0.0, 0.0, 0.0),
        ] {
            assert_rgb_close(hsb_to_rgb(rgb_to_hsb(rgb.0, rgb.1, rgb.2)), rgb);
        }
    }

    #[test]
    fn test_hue_in_range_wraparound() {
        assert!(hue_in_range(355.0, 10.0, 40.0));
        assert!(hue_in_range(25.0, 10.0, 40.0));
        assert!(!hue_in_range(40.0, 10.0, 40.0));
        assert!(hue_in_range(180.0, 190.0, 30.0));
        assert!(!hue_in_range(180.0, 180.0, 0.0));
        assert!(hue_in_range(90.0, 270.0, 360.0));
    }

    #[test]
    fn test_hue_distance() {
        assert_eq!(hue_distance(10.0, 350.0), 20.0);
        assert_eq!(hue_distance(0.0, 180.0), 180.0);
        assert_eq!(hue_distance(-30.0, 30.0), 60.0);
    }
}
