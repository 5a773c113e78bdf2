//! Histogram computation from float RGBA images.
//!
//! Used both for the display histogram handed to the presentation layer and
//! for auto-levels analysis. Values are binned with [`to_bin`], so bin `i`
//! is centered on `i / 255`. Fully transparent pixels (alpha 0, i.e. empty
//! border produced by geometry transforms) are not counted.

use serde::Serialize;

use crate::decode::{FloatImage, CHANNELS};
use crate::luminance::{pixel_luminance, to_bin};
use crate::parallel::fold_pixels;

/// Number of bins per channel.
pub const BINS: usize = 256;

/// Per-channel histogram data for an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    /// Red channel histogram (256 bins)
    #[serde(with = "bins")]
    pub red: [u32; BINS],
    /// Green channel histogram (256 bins)
    #[serde(with = "bins")]
    pub green: [u32; BINS],
    /// Blue channel histogram (256 bins)
    #[serde(with = "bins")]
    pub blue: [u32; BINS],
    /// Luminance histogram (256 bins)
    #[serde(with = "bins")]
    pub luminance: [u32; BINS],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; BINS],
            green: [0; BINS],
            blue: [0; BINS],
            luminance: [0; BINS],
        }
    }
}

impl Histogram {
    /// Create a new empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Bins of one color channel: 0 red, 1 green, 2 blue.
    pub fn channel(&self, channel: usize) -> &[u32; BINS] {
        match channel {
            0 => &self.red,
            1 => &self.green,
            _ => &self.blue,
        }
    }

    /// Find the maximum value across the color channels for normalization
    pub fn max_value(&self) -> u32 {
        let max_r = self.red.iter().copied().max().unwrap_or(0);
        let max_g = self.green.iter().copied().max().unwrap_or(0);
        let max_b = self.blue.iter().copied().max().unwrap_or(0);
        max_r.max(max_g).max(max_b)
    }

    /// Total number of counted pixels.
    pub fn total(&self) -> u64 {
        self.luminance.iter().map(|&c| c as u64).sum()
    }

    /// Check for highlight clipping (values at 255)
    pub fn has_highlight_clipping(&self) -> bool {
        self.red[BINS - 1] > 0 || self.green[BINS - 1] > 0 || self.blue[BINS - 1] > 0
    }

    /// Check for shadow clipping (values at 0)
    pub fn has_shadow_clipping(&self) -> bool {
        self.red[0] > 0 || self.green[0] > 0 || self.blue[0] > 0
    }

    fn merge(mut self, other: Histogram) -> Histogram {
        for i in 0..BINS {
            self.red[i] += other.red[i];
            self.green[i] += other.green[i];
            self.blue[i] += other.blue[i];
            self.luminance[i] += other.luminance[i];
        }
        self
    }
}

/// Compute RGB and luminance histograms from an image.
///
/// # Arguments
/// * `image` - RGBA float image; RGB values are clamped to 0.0-1.0 for binning
///
/// # Returns
/// A `Histogram` with all four channels populated. An empty image yields an
/// all-zero histogram.
pub fn compute_histogram(image: &FloatImage) -> Histogram {
    if image.is_empty() {
        return Histogram::new();
    }
    debug_assert_eq!(image.pixels.len(), image.pixel_count() * CHANNELS);

    let hist: Box<Histogram> = fold_pixels(
        &image.pixels,
        || Box::new(Histogram::new()),
        |mut hist, px| {
            if px[3] > 0.0 {
                hist.red[to_bin(px[0])] += 1;
                hist.green[to_bin(px[1])] += 1;
                hist.blue[to_bin(px[2])] += 1;
                hist.luminance[to_bin(pixel_luminance(px))] += 1;
            }
            hist
        },
        |a, b| Box::new((*a).merge(*b)),
    );
    *hist
}

mod bins {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bins: &[u32; super::BINS], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(bins.iter())
    }
}
