//! Image resizing for analysis copies and thumbnails.
//!
//! Provides resize operations using the `image` crate's algorithms on float
//! RGBA buffers. All functions return new `FloatImage` instances without
//! modifying the input.

use super::{DecodeError, FilterType, FloatImage};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` for zero target dimensions and
/// `DecodeError::CorruptedFile` if the pixel buffer does not match the
/// image dimensions.
pub fn resize(
    image: &FloatImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<FloatImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidFormat);
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let buffer = image
        .to_rgba32f()
        .ok_or_else(|| DecodeError::CorruptedFile("Failed to create Rgba32FImage".to_string()))?;

    let resized = image::imageops::resize(&buffer, width, height, filter.to_image_filter());

    Ok(FloatImage::new(width, height, resized.into_raw()))
}

/// Resize an image to a target width, preserving aspect ratio.
///
/// Images already at or below `target_width` are returned unchanged; this
/// never upscales.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if `target_width` is zero.
pub fn resize_to_width(
    image: &FloatImage,
    target_width: u32,
    filter: FilterType,
) -> Result<FloatImage, DecodeError> {
    if target_width == 0 {
        return Err(DecodeError::InvalidFormat);
    }
    if image.is_empty() || image.width <= target_width {
        return Ok(image.clone());
    }

    let (new_width, new_height) = width_fit_dimensions(image.width, image.height, target_width);
    resize(image, new_width, new_height, filter)
}

/// Downsampled copy used for histogram-style analysis.
///
/// Falls back to the source image if resampling fails, so analysis always
/// has something to look at.
pub fn analysis_copy(image: &FloatImage, target_width: u32) -> FloatImage {
    match resize_to_width(image, target_width, FilterType::Bilinear) {
        Ok(copy) => copy,
        Err(_) => image.clone(),
    }
}

/// Calculate dimensions for a target width while preserving aspect ratio.
fn width_fit_dimensions(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = height as f64 / width as f64;
    let new_height = (target_width as f64 * ratio).round() as u32;
    (target_width, new_height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> FloatImage {
        // Simple gradient image for testing
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(x as f32 / width.max(1) as f32);
                pixels.push(y as f32 / height.max(1) as f32);
                pixels.push(0.5);
                pixels.push(1.0);
            }
        }
        FloatImage::new(width, height, pixels)
    }

    #[test]
    fn test_resize_basic() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 50, 25, FilterType::Bilinear).unwrap();

        assert_eq!(resized.width, 50);
        assert_eq!(resized.height, 25);
        assert_eq!(resized.pixels.len(), 50 * 25 * 4);
    }

    #[test]
    fn test_resize_same_dimensions() {
        let img = create_test_image(100, 50);
        let resized = resize(&img, 100, 50, FilterType::Bilinear).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_zero_dimensions_error() {
        let img = create_test_image(100, 50);

        assert!(resize(&img, 0, 50, FilterType::Bilinear).is_err());
        assert!(resize(&img, 50, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_to_width_landscape() {
        let img = create_test_image(600, 400);
        let resized = resize_to_width(&img, 256, FilterType::Lanczos3).unwrap();

        assert_eq!(resized.width, 256);
        assert_eq!(resized.height, 171); // 400 * (256/600) ≈ 170.7
    }

    #[test]
    fn test_resize_to_width_never_upscales() {
        let img = create_test_image(100, 50);
        let resized = resize_to_width(&img, 256, FilterType::Bilinear).unwrap();
        assert_eq!(resized.width, 100);
        assert_eq!(resized.height, 50);
    }

    #[test]
    fn test_resize_to_width_zero_error() {
        let img = create_test_image(100, 50);
        assert!(resize_to_width(&img, 0, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_resize_preserves_flat_color() {
        let img = FloatImage::filled(64, 32, [0.25, 0.5, 0.75]);
        let resized = resize_to_width(&img, 16, FilterType::Bilinear).unwrap();
        for px in resized.pixels.chunks_exact(4) {
            assert!((px[0] - 0.25).abs() < 1e-4);
            assert!((px[1] - 0.5).abs() < 1e-4);
            assert!((px[2] - 0.75).abs() < 1e-4);
        }
    }

    #[test]
    fn test_analysis_copy_of_empty_image() {
        let copy = analysis_copy(&FloatImage::empty(), 1024);
        assert!(copy.is_empty());
    }

    #[test]
    fn test_width_fit_dimensions() {
        assert_eq!(width_fit_dimensions(4000, 6000, 1000), (1000, 1500));
        assert_eq!(width_fit_dimensions(0, 0, 256), (0, 0));
        assert_eq!(width_fit_dimensions(10000, 1, 10), (10, 1));
    }

    #[test]
    fn test_all_filter_types() {
        let img = create_test_image(100, 50);

        for filter in [
            FilterType::Nearest,
            FilterType::Bilinear,
            FilterType::Lanczos3,
        ] {
            let resized = resize(&img, 50, 25, filter).unwrap();
            assert_eq!(resized.width, 50);
            assert_eq!(resized.height, 25);
        }
    }
}
