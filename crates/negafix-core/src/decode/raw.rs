//! Camera RAW decoding via `rawloader`.
//!
//! Film scans shot with a digital camera only need a clean, linear RGB
//! buffer; the negative conversion happens downstream. Instead of a full
//! demosaic each 2x2 Bayer cell is collapsed into one RGB pixel
//! ("superpixel" binning), which halves resolution and avoids demosaic
//! artifacts entirely.

use std::path::Path;

use rawloader::{RawImage, RawImageData};
use rayon::prelude::*;

use super::{DecodeError, FloatImage, CHANNELS};

/// File extensions treated as camera RAW.
const RAW_EXTENSIONS: &[&str] = &[
    "3fr", "arw", "cr2", "cr3", "dcr", "dng", "erf", "iiq", "kdc", "mos", "mrw", "nef", "nrw",
    "orf", "pef", "raf", "rw2", "srw",
];

/// Check if a path has a known camera RAW extension (case-insensitive).
pub fn is_raw_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            RAW_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decode a camera RAW file into a linear, white-balanced float image.
///
/// # Errors
///
/// Returns `DecodeError::CorruptedFile` when `rawloader` cannot parse the
/// file and `DecodeError::UnsupportedCamera` for sensor layouts other than
/// a 2x2 mosaic or three-component linear data.
pub fn decode_raw(path: &Path) -> Result<FloatImage, DecodeError> {
    if !path.exists() {
        return Err(DecodeError::IoError(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let raw = rawloader::decode_file(path)
        .map_err(|e| DecodeError::CorruptedFile(format!("{e:?}")))?;

    tracing::debug!(
        make = %raw.clean_make,
        model = %raw.clean_model,
        width = raw.width,
        height = raw.height,
        cpp = raw.cpp,
        "decoded raw sensor data"
    );

    raw_to_float(&raw)
}

fn raw_to_float(raw: &RawImage) -> Result<FloatImage, DecodeError> {
    let samples: Vec<f32> = match &raw.data {
        RawImageData::Integer(data) => data.iter().map(|&v| v as f32).collect(),
        RawImageData::Float(data) => data.clone(),
    };

    let black = raw.blacklevels.map(|v| v as f32);
    let white = raw.whitelevels.map(|v| v as f32);
    let wb = normalized_wb(raw.wb_coeffs);

    match raw.cpp {
        1 => {
            if raw.cfa.width != 2 || raw.cfa.height != 2 {
                return Err(DecodeError::UnsupportedCamera(format!(
                    "{} {} ({}x{} color filter array)",
                    raw.clean_make, raw.clean_model, raw.cfa.width, raw.cfa.height
                )));
            }
            let levels = SensorLevels { black, white, wb };
            Ok(superpixel(
                raw.width,
                raw.height,
                &samples,
                |row, col| raw.cfa.color_at(row, col),
                &levels,
            ))
        }
        3 => Ok(linear_rgb(raw.width, raw.height, &samples, black, white, wb)),
        other => Err(DecodeError::UnsupportedCamera(format!(
            "{} {} ({other} components per pixel)",
            raw.clean_make, raw.clean_model
        ))),
    }
}

/// Black/white levels and white balance for one sensor readout.
struct SensorLevels {
    black: [f32; 4],
    white: [f32; 4],
    wb: [f32; 3],
}

impl SensorLevels {
    #[inline]
    fn normalize(&self, value: f32, color: usize) -> f32 {
        let black = self.black[color];
        let white = self.white[color];
        if white <= black {
            return 0.0;
        }
        ((value - black) / (white - black)).clamp(0.0, 1.0)
    }
}

/// Camera white balance normalized to green, neutral when unusable.
fn normalized_wb(coeffs: [f32; 4]) -> [f32; 3] {
    let g = coeffs[1];
    if !g.is_finite() || g <= 0.0 {
        return [1.0, 1.0, 1.0];
    }
    let scale = |v: f32| {
        let m = v / g;
        if m.is_finite() && m > 0.0 {
            m
        } else {
            1.0
        }
    };
    [scale(coeffs[0]), 1.0, scale(coeffs[2])]
}

/// Collapse each 2x2 mosaic cell into one RGB pixel.
///
/// `color_at(row, col)` returns 0 (red), 1 (green), 2 (blue) or 3 (second
/// green). Green sites are averaged.
fn superpixel<F>(
    width: usize,
    height: usize,
    samples: &[f32],
    color_at: F,
    levels: &SensorLevels,
) -> FloatImage
where
    F: Fn(usize, usize) -> usize + Sync,
{
    let out_w = width / 2;
    let out_h = height / 2;
    if out_w == 0 || out_h == 0 || samples.len() < width * height {
        return FloatImage::empty();
    }

    let mut pixels = vec![0.0f32; out_w * out_h * CHANNELS];
    pixels
        .par_chunks_exact_mut(out_w * CHANNELS)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..out_w {
                let mut sum = [0.0f32; 3];
                let mut count = [0u32; 3];
                for dy in 0..2 {
                    for dx in 0..2 {
                        let sy = y * 2 + dy;
                        let sx = x * 2 + dx;
                        let color = color_at(sy, sx).min(3);
                        let value = levels.normalize(samples[sy * width + sx], color);
                        let channel = if color == 3 { 1 } else { color };
                        sum[channel] += value;
                        count[channel] += 1;
                    }
                }
                let px = &mut row[x * CHANNELS..(x + 1) * CHANNELS];
                for c in 0..3 {
                    let mean = if count[c] > 0 {
                        sum[c] / count[c] as f32
                    } else {
                        0.0
                    };
                    px[c] = mean * levels.wb[c];
                }
                px[3] = 1.0;
            }
        });

    FloatImage::new(out_w as u32, out_h as u32, pixels)
}

/// Already-interpolated three-component sensor data (linear DNG and similar).
fn linear_rgb(
    width: usize,
    height: usize,
    samples: &[f32],
    black: [f32; 4],
    white: [f32; 4],
    wb: [f32; 3],
) -> FloatImage {
    if width == 0 || height == 0 || samples.len() < width * height * 3 {
        return FloatImage::empty();
    }
    let levels = SensorLevels { black, white, wb };
    let mut pixels = Vec::with_capacity(width * height * CHANNELS);
    for px in samples.chunks_exact(3).take(width * height) {
        for c in 0..3 {
            pixels.push(levels.normalize(px[c], c) * wb[c]);
        }
        pixels.push(1.0);
    }
    FloatImage::new(width as u32, height as u32, pixels)
}
