//! Raster scan decoding (TIFF, PNG, JPEG) with EXIF orientation handling.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use image::ImageReader;

use super::{DecodeError, FloatImage, Orientation};

/// Decode a raster image file, applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::IoError` if the file cannot be read and
/// `DecodeError::CorruptedFile` if the bytes do not decode.
pub fn decode_raster(path: &Path) -> Result<FloatImage, DecodeError> {
    let bytes = std::fs::read(path).map_err(|e| DecodeError::IoError(e.to_string()))?;
    decode_raster_bytes(&bytes)
}

/// Decode raster image bytes, applying EXIF orientation correction.
///
/// 8- and 16-bit sources are normalized to 0.0-1.0; alpha is carried over
/// when present and set to 1.0 otherwise.
pub fn decode_raster_bytes(bytes: &[u8]) -> Result<FloatImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(FloatImage::from_dynamic(apply_orientation(img, orientation)))
}

/// Extract EXIF orientation from file bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_normalizes_values() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));

        let decoded = decode_raster_bytes(&png_bytes(&img)).unwrap();
        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.height, 1);
        assert_eq!(decoded.pixel(0, 0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(decoded.pixel(1, 0), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result = decode_raster_bytes(&[0x00, 0x01, 0x02, 0x03]);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_raster_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        let img = RgbImage::from_pixel(3, 2, Rgb([128, 128, 128]));
        std::fs::write(&path, png_bytes(&img)).unwrap();

        let decoded = decode_raster(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert!((decoded.pixel(2, 1)[0] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = decode_raster(Path::new("/nonexistent/scan.png"));
        assert!(matches!(result, Err(DecodeError::IoError(_))));
    }

    #[test]
    fn test_orientation_without_exif_is_normal() {
        let img = RgbImage::new(1, 1);
        assert_eq!(extract_orientation(&png_bytes(&img)), Orientation::Normal);
    }

    #[test]
    fn test_apply_orientation_rotates() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 2));
        let rotated = apply_orientation(img, Orientation::Rotate90CW);
        assert_eq!((rotated.width(), rotated.height()), (2, 4));
    }
}
