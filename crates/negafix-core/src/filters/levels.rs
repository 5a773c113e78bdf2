//! Histogram-based auto-levels (per-channel normalization).
//!
//! The black and white points are measured on a downsampled analysis copy
//! and the resulting remap is applied to the full-resolution image.

use crate::color::ChannelPolynomial;
use crate::decode::{analysis_copy, FloatImage};
use crate::histogram::{compute_histogram, Histogram, BINS};

/// Bins whose count does not exceed this are treated as empty.
pub const BIN_EPSILON: f32 = 1e-6;

/// Default width of the analysis copy.
pub const DEFAULT_ANALYSIS_WIDTH: u32 = 1024;

/// Black and white points of one channel, normalized to 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelsRange {
    pub black: f32,
    pub white: f32,
}

impl Default for LevelsRange {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LevelsRange {
    pub const IDENTITY: LevelsRange = LevelsRange {
        black: 0.0,
        white: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Find the black and white points of a single 256-bin channel.
///
/// An empty channel yields the identity range. An inverted range collapses
/// to a flat range at the black point.
pub fn channel_range(bins: &[u32; BINS]) -> LevelsRange {
    let occupied = |count: &u32| *count as f32 > BIN_EPSILON;
    let position = |i: usize| i as f32 / (BINS - 1) as f32;

    let black = bins.iter().position(occupied).map(position);
    let white = bins.iter().rposition(occupied).map(position);

    let (black, white) = match (black, white) {
        (None, None) => return LevelsRange::IDENTITY,
        (Some(v), None) | (None, Some(v)) => (v, v),
        (Some(b), Some(w)) => (b, w),
    };

    if black > white {
        return LevelsRange {
            black,
            white: black,
        };
    }
    LevelsRange { black, white }
}

/// Black and white points for the red, green and blue channels.
pub fn levels_from_histogram(hist: &Histogram) -> [LevelsRange; 3] {
    [
        channel_range(&hist.red),
        channel_range(&hist.green),
        channel_range(&hist.blue),
    ]
}

/// The remap `(x - black) / (white - black)` per channel.
pub fn levels_polynomial(ranges: &[LevelsRange; 3]) -> ChannelPolynomial {
    ChannelPolynomial::from_ranges(ranges.map(|r| (r.black, r.white)))
}

/// Measure levels on an analysis copy `analysis_width` wide.
pub fn analyze_levels(image: &FloatImage, analysis_width: u32) -> [LevelsRange; 3] {
    let copy = analysis_copy(image, analysis_width.max(1));
    levels_from_histogram(&compute_histogram(&copy))
}

/// Stretch each channel to its measured black and white points.
///
/// Alpha passes through unchanged. An empty image is a no-op.
pub fn auto_levels(image: &mut FloatImage, analysis_width: u32) {
    if image.is_empty() {
        return;
    }
    let ranges = analyze_levels(image, analysis_width);
    tracing::debug!(?ranges, "auto levels");
    if ranges.iter().all(LevelsRange::is_identity) {
        return;
    }
    levels_polynomial(&ranges).apply(image);
}
