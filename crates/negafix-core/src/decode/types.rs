//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of interleaved channels in a [`FloatImage`] (RGBA).
pub const CHANNELS: usize = 4;

/// Why a decoder could not produce an image.
///
/// The engine never propagates these past a request: a failed decode
/// becomes [`FloatImage::empty`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not a format any decoder here understands.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// rawloader knows the container but not this camera or its CFA layout.
    #[error("Unsupported camera: {0}")]
    UnsupportedCamera(String),

    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

/// Resampling kernel for resizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    Nearest,
    /// Triangle filter; used for analysis copies and thumbnails.
    #[default]
    Bilinear,
    Lanczos3,
}

impl FilterType {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType as Kernel;
        match self {
            FilterType::Nearest => Kernel::Nearest,
            FilterType::Bilinear => Kernel::Triangle,
            FilterType::Lanczos3 => Kernel::Lanczos3,
        }
    }
}

/// EXIF orientation tag (values 1-8). Names describe the correction needed
/// to display the stored pixels upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Mirror across the main diagonal.
    Transpose = 5,
    Rotate90CW = 6,
    /// Mirror across the anti-diagonal.
    Transverse = 7,
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    /// Unknown values fall back to [`Orientation::Normal`].
    fn from(value: u32) -> Self {
        const TABLE: [Orientation; 8] = [
            Orientation::Normal,
            Orientation::FlipHorizontal,
            Orientation::Rotate180,
            Orientation::FlipVertical,
            Orientation::Transpose,
            Orientation::Rotate90CW,
            Orientation::Transverse,
            Orientation::Rotate270CW,
        ];
        value
            .checked_sub(1)
            .and_then(|i| TABLE.get(i as usize).copied())
            .unwrap_or_default()
    }
}

/// A floating-point RGBA image.
///
/// Pixels are interleaved RGBA in row-major order, 4 `f32` per pixel.
/// Color values are nominally in 0.0 to 1.0 but intermediate stages may
/// leave the range; alpha is 1.0 for content and 0.0 for empty border
/// produced by geometry transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data, length `width * height * 4`.
    pub pixels: Vec<f32>,
}

impl FloatImage {
    /// Create a new image with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<f32>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * CHANNELS,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// The defined "empty" image handed to the pipeline when decoding fails.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    /// Create an image filled with one opaque color.
    pub fn filled(width: u32, height: u32, rgb: [f32; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 1.0]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create an opaque image from interleaved RGB floats.
    pub fn from_rgb(width: u32, height: u32, rgb: &[f32]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for chunk in rgb.chunks_exact(3) {
            pixels.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 1.0]);
        }
        Self::new(width, height, pixels)
    }

    /// Create an opaque image from packed 8-bit RGB.
    pub fn from_rgb8(width: u32, height: u32, rgb: &[u8]) -> Self {
        let pixels = rgb
            .chunks_exact(3)
            .flat_map(|c| [c[0] as f32 / 255.0, c[1] as f32 / 255.0, c[2] as f32 / 255.0, 1.0])
            .collect();
        Self::new(width, height, pixels)
    }

    /// Create an image from packed 8-bit RGBA.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Self {
        let pixels = rgba.iter().map(|&v| v as f32 / 255.0).collect();
        Self::new(width, height, pixels)
    }

    /// Convert any decoded `image` crate image, normalizing to 0.0-1.0.
    pub fn from_dynamic(img: image::DynamicImage) -> Self {
        let rgba = img.into_rgba32f();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    /// Convert into the `image` crate's float RGBA buffer.
    pub fn to_rgba32f(&self) -> Option<image::Rgba32FImage> {
        image::Rgba32FImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Quantize to 8-bit RGB, clamping each channel to 0.0-1.0.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.pixels.chunks_exact(CHANNELS) {
            for &v in &px[..3] {
                out.push((v.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        out
    }

    /// RGBA value of the pixel at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<f32>()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
