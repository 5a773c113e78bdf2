//! The ordered filter pipeline.
//!
//! # Stage Order
//!
//! 1. Geometry
//! 2. Inversion
//! 3. Film base neutralization (`v2` only)
//! 4. Auto levels
//! 5. Tone mapping
//! 6. Color cast refinement
//! 7. Color grade
//! 8. Detail
//!
//! The order is fixed; the processing version only picks the inversion
//! algorithm and whether film base is a separate stage.

use serde::{Deserialize, Serialize};

use crate::decode::FloatImage;
use crate::filters::levels::DEFAULT_ANALYSIS_WIDTH;
use crate::filters::{Filter, InversionMode};
use crate::params::AdjustmentParameters;

/// Processing algorithm generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingVersion {
    /// Base-relative inversion with border film base estimation.
    V1,
    /// Standard inversion followed by film base neutralization.
    #[default]
    V2,
}

impl ProcessingVersion {
    pub fn inversion_mode(self) -> InversionMode {
        match self {
            ProcessingVersion::V1 => InversionMode::BaseRelative,
            ProcessingVersion::V2 => InversionMode::Standard,
        }
    }
}

/// Settings shared by every run of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub version: ProcessingVersion,
    /// Width of the downsampled copy used for histogram analysis.
    pub analysis_width: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            version: ProcessingVersion::default(),
            analysis_width: DEFAULT_ANALYSIS_WIDTH,
        }
    }
}

/// A fixed sequence of filters.
#[derive(Debug, Clone)]
pub struct Pipeline {
    filters: Vec<Filter>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        let mut filters = vec![
            Filter::Geometry,
            Filter::Inversion(settings.version.inversion_mode()),
        ];
        if settings.version == ProcessingVersion::V2 {
            filters.push(Filter::FilmBase);
        }
        filters.extend([
            Filter::AutoLevels {
                analysis_width: settings.analysis_width.max(1),
            },
            Filter::ToneMapping,
            Filter::ColorCast,
            Filter::ColorGrade,
            Filter::Detail,
        ]);
        Self { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Run every filter in order.
    ///
    /// `is_cancelled` is polled after each stage; a cancelled run returns
    /// `None` and no partial image.
    pub fn run<C>(
        &self,
        image: FloatImage,
        params: &AdjustmentParameters,
        is_cancelled: C,
    ) -> Option<FloatImage>
    where
        C: Fn() -> bool,
    {
        let mut image = image;
        for filter in &self.filters {
            image = filter.apply(image, params);
            tracing::debug!(
                stage = filter.name(),
                width = image.width,
                height = image.height,
                "filter applied"
            );
            if is_cancelled() {
                tracing::debug!(stage = filter.name(), "pipeline cancelled");
                return None;
            }
        }
        Some(image)
    }

    /// Run to completion with no cancellation.
    pub fn process(&self, image: FloatImage, params: &AdjustmentParameters) -> FloatImage {
        let mut image = image;
        for filter in &self.filters {
            image = filter.apply(image, params);
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_stage_order() {
        let v2 = Pipeline::new(PipelineSettings::default());
        let names: Vec<_> = v2.filters().iter().map(Filter::name).collect();
        assert_eq!(
            names,
            [
                "geometry",
                "inversion",
                "film base",
                "auto levels",
                "tone mapping",
                "color cast",
                "color grade",
                "detail"
            ]
        );

        let v1 = Pipeline::new(PipelineSettings {
            version: ProcessingVersion::V1,
            ..Default::default()
        });
        assert!(!v1.filters().contains(&Filter::FilmBase));
        assert_eq!(v1.filters()[1], Filter::Inversion(InversionMode::BaseRelative));
    }

    #[test]
    fn test_mid_gray_survives_default_inversion() {
        let img = FloatImage::filled(16, 16, [0.5, 0.5, 0.5]);
        let out = Pipeline::default().process(img, &AdjustmentParameters::default());
        for px in out.pixels.chunks_exact(4) {
            for &v in &px[..3] {
                assert!((v - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_default_inversion_flips_values() {
        let img = FloatImage::filled(4, 4, [0.2, 0.3, 0.9]);
        let out = Pipeline::default().process(img, &AdjustmentParameters::default());
        let px = out.pixel(1, 1);
        assert!((px[0] - 0.8).abs() < 1e-6);
        assert!((px[1] - 0.7).abs() < 1e-6);
        assert!((px[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_film_base_applies_after_inversion() {
        let mut params = AdjustmentParameters::default();
        params.film_base.sample = Some([0.8, 0.6, 0.4]);
        let img = FloatImage::filled(2, 2, [0.6, 0.7, 0.8]);
        let out = Pipeline::default().process(img, &params);
        let px = out.pixel(0, 0);
        assert!((px[0] - 0.5).abs() < 1e-5);
        assert!((px[1] - 0.5).abs() < 1e-5);
        assert!((px[2] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_cancellation_stops_after_first_stage() {
        let img = FloatImage::filled(4, 4, [0.5, 0.5, 0.5]);
        let calls = Cell::new(0);
        let result = Pipeline::default().run(img, &AdjustmentParameters::default(), || {
            calls.set(calls.get() + 1);
            true
        });
        assert!(result.is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_empty_image_passes_through() {
        let out = Pipeline::default().run(FloatImage::empty(), &AdjustmentParameters::default(), || false);
        assert!(out.unwrap().is_empty());
    }

    #[test]
    fn test_extreme_geometry_and_detail_values_are_absorbed() {
        let img = FloatImage::filled(2, 2, [0.4, 0.4, 0.4]);

        let mut params = AdjustmentParameters::positive();
        params.geometry.scale = 1e30;
        let out = Pipeline::default().process(img.clone(), &params);
        assert_eq!((out.width, out.height), (2, 2));

        let mut params = AdjustmentParameters::positive();
        params.detail.unsharp_radius = 1e12;
        params.detail.unsharp_intensity = 1.0;
        let out = Pipeline::default().process(img, &params);
        assert_eq!((out.width, out.height), (2, 2));
        assert!(out.pixels.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_version_serde() {
        let json = serde_json::to_string(&ProcessingVersion::V1).unwrap();
        assert_eq!(json, "\"v1\"");
        let settings: PipelineSettings = serde_json::from_str(r#"{"version":"v2"}"#).unwrap();
        assert_eq!(settings.analysis_width, DEFAULT_ANALYSIS_WIDTH);
    }
}
