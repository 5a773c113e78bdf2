//! Image filters.
//!
//! Every filter is total: degenerate input or parameters leave the image
//! unchanged instead of failing, so the stages can always be chained.

pub mod cast;
pub mod detail;
pub mod film_base;
pub mod geometry;
pub mod grade;
pub mod inversion;
pub mod levels;
pub mod tone;

pub use cast::refine_color_cast;
pub use detail::{apply_detail, gaussian_blur, unsharp_mask};
pub use film_base::{correction_factors, neutralize_film_base};
pub use geometry::apply_geometry;
pub use grade::apply_grade;
pub use inversion::{estimate_film_base, invert_base_relative, invert_standard};
pub use levels::{analyze_levels, auto_levels, LevelsRange};
pub use tone::apply_tone;

use crate::decode::FloatImage;
use crate::params::AdjustmentParameters;

/// Negative-to-positive algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InversionMode {
    /// `1 - in`; film base is handled by its own stage.
    Standard,
    /// Scale by the film base color before inverting.
    BaseRelative,
}

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Geometry,
    Inversion(InversionMode),
    FilmBase,
    AutoLevels { analysis_width: u32 },
    ToneMapping,
    ColorCast,
    ColorGrade,
    Detail,
}

impl Filter {
    /// Apply this stage to `image`.
    pub fn apply(&self, image: FloatImage, params: &AdjustmentParameters) -> FloatImage {
        if image.is_empty() {
            return image;
        }
        let mut image = image;
        match *self {
            Filter::Geometry => image = apply_geometry(image, &params.geometry),
            Filter::Inversion(mode) => {
                if params.invert {
                    match mode {
                        InversionMode::Standard => invert_standard(&mut image),
                        InversionMode::BaseRelative => {
                            invert_base_relative(&mut image, params.film_base.sample)
                        }
                    }
                }
            }
            Filter::FilmBase => neutralize_film_base(&mut image, params.film_base.sample),
            Filter::AutoLevels { analysis_width } => {
                if params.auto_levels {
                    auto_levels(&mut image, analysis_width);
                }
            }
            Filter::ToneMapping => apply_tone(&mut image, &params.tone),
            Filter::ColorCast => refine_color_cast(&mut image, &params.cast),
            Filter::ColorGrade => apply_grade(&mut image, &params.color),
            Filter::Detail => apply_detail(&mut image, &params.detail),
        }
        image
    }

    /// Stage name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Geometry => "geometry",
            Filter::Inversion(InversionMode::Standard) => "inversion",
            Filter::Inversion(InversionMode::BaseRelative) => "inversion (base-relative)",
            Filter::FilmBase => "film base",
            Filter::AutoLevels { .. } => "auto levels",
            Filter::ToneMapping => "tone mapping",
            Filter::ColorCast => "color cast",
            Filter::ColorGrade => "color grade",
            Filter::Detail => "detail",
        }
    }
}
