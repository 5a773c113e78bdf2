//! JPEG encoding for thumbnails and previews.
//!
//! Float images are clamped to 0.0-1.0 and quantized to 8-bit RGB; alpha
//! is dropped.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;
use thiserror::Error;

use crate::decode::FloatImage;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode a float image to JPEG bytes.
///
/// # Arguments
///
/// * `image` - Source image; RGB is clamped to 0.0-1.0
/// * `quality` - JPEG quality (1-100), out-of-range values are clamped
///
/// # Returns
///
/// JPEG-encoded bytes, or an error for an empty image.
pub fn encode_jpeg(image: &FloatImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    encode_rgb8_jpeg(&image.to_rgb8(), image.width, image.height, quality)
}

/// Encode packed 8-bit RGB pixel data to JPEG bytes.
pub fn encode_rgb8_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let quality = quality.clamp(1, 100);
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
