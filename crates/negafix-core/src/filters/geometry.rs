//! Geometry stage: runs every transform in [`crate::transform`] order.

use crate::decode::FloatImage;
use crate::params::GeometryParams;
use crate::transform::{
    apply_crop, apply_perspective, apply_scale, apply_straighten, mirror, rotate_quarter_turns,
};

/// Apply perspective, crop, quarter turns, mirror, straighten and scale.
///
/// Transforms at their neutral value are skipped without copying.
pub fn apply_geometry(image: FloatImage, params: &GeometryParams) -> FloatImage {
    if params.is_default() || image.is_empty() {
        return image;
    }

    let mut image = image;
    if let Some(quad) = &params.perspective {
        image = apply_perspective(&image, quad);
    }
    if let Some(crop) = params.crop.as_ref().filter(|c| !c.is_full()) {
        image = apply_crop(&image, crop);
    }
    if params.quarter_turns % 4 != 0 {
        image = rotate_quarter_turns(&image, params.quarter_turns);
    }
    if params.flip_horizontal || params.flip_vertical {
        image = mirror(&image, params.flip_horizontal, params.flip_vertical);
    }
    if params.straighten != 0.0 {
        image = apply_straighten(&image, params.straighten as f64);
    }
    if params.scale != 1.0 {
        image = apply_scale(&image, params.scale);
    }
    image
}
