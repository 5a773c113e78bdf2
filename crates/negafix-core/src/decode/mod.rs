//! Image decoding for negafix.
//!
//! This module provides:
//! - The [`Decoder`] interface the processing engine calls once per request
//! - Camera RAW decoding via `rawloader` (2x2 superpixel binning, no demosaic)
//! - Raster scan decoding (TIFF/PNG/JPEG) with EXIF orientation
//! - Resizing for analysis copies and thumbnails
//!
//! # Decoder contract
//!
//! A decoder receives only the controls it natively understands: exposure
//! and the pre-inversion white balance (temperature/tint). Everything else is
//! the pipeline's job. Decoders report failure with [`DecodeError`]; the
//! engine turns any failure into [`FloatImage::empty`] so the filter chain
//! always has a defined input.

mod raster;
mod raw;
mod resize;
mod types;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::relative_temperature_multipliers;
use crate::params::AdjustmentParameters;

pub use raster::{decode_raster, decode_raster_bytes};
pub use raw::{decode_raw, is_raw_extension};
pub use resize::{analysis_copy, resize, resize_to_width};
pub use types::{DecodeError, FilterType, FloatImage, Orientation, CHANNELS};

/// Decode-time controls forwarded to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodeSettings {
    /// Exposure in stops.
    pub exposure: f32,
    /// White balance temperature in Kelvin.
    pub temperature: f32,
    /// White balance tint (-100 to 100).
    pub tint: f32,
}

impl Default for DecodeSettings {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            temperature: crate::color::NEUTRAL_TEMPERATURE,
            tint: 0.0,
        }
    }
}

impl DecodeSettings {
    /// Extract the decoder-native controls from a parameter set.
    pub fn from_parameters(params: &AdjustmentParameters) -> Self {
        Self {
            exposure: params.tone.exposure,
            temperature: params.color.raw_temperature,
            tint: params.color.raw_tint,
        }
    }

    /// Check if these settings leave decoded pixels untouched.
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Black-box RAW decoder collaborator.
///
/// Implementations must be callable from several threads at once; the
/// thumbnail scheduler and the interactive engine share one decoder.
pub trait Decoder: Send + Sync {
    /// Decode `path` into a floating-point RGBA buffer.
    fn decode(&self, path: &Path, settings: &DecodeSettings) -> Result<FloatImage, DecodeError>;
}

/// Camera RAW decoder backed by `rawloader`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawloaderDecoder;

impl Decoder for RawloaderDecoder {
    fn decode(&self, path: &Path, settings: &DecodeSettings) -> Result<FloatImage, DecodeError> {
        let mut image = decode_raw(path)?;
        apply_decode_settings(&mut image, settings);
        Ok(image)
    }
}

/// Decoder for TIFF/PNG/JPEG scans.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl Decoder for RasterDecoder {
    fn decode(&self, path: &Path, settings: &DecodeSettings) -> Result<FloatImage, DecodeError> {
        let mut image = decode_raster(path)?;
        apply_decode_settings(&mut image, settings);
        Ok(image)
    }
}

/// Decoder that picks RAW or raster decoding by file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecoder;

impl Decoder for AutoDecoder {
    fn decode(&self, path: &Path, settings: &DecodeSettings) -> Result<FloatImage, DecodeError> {
        if is_raw_extension(path) {
            RawloaderDecoder.decode(path, settings)
        } else {
            RasterDecoder.decode(path, settings)
        }
    }
}

/// Apply exposure and white balance multipliers in place.
///
/// Alpha is left unchanged. Neutral settings are a no-op.
pub fn apply_decode_settings(image: &mut FloatImage, settings: &DecodeSettings) {
    if settings.is_neutral() {
        return;
    }

    let gain = 2.0_f32.powf(settings.exposure);
    let wb = relative_temperature_multipliers(settings.temperature, settings.tint);
    let scale = [wb[0] * gain, wb[1] * gain, wb[2] * gain];

    crate::parallel::for_each_pixel(&mut image.pixels, |px| {
        px[0] *= scale[0];
        px[1] *= scale[1];
        px[2] *= scale[2];
    });
}
