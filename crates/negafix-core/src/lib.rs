//! Negafix Core - film negative conversion library
//!
//! This crate turns a scanned negative into a color-corrected positive:
//! decoding, geometry, inversion, film base neutralization, auto levels,
//! tone mapping, cast refinement, grading and detail. Everything here is
//! synchronous and free of shared state; scheduling and caching live in
//! `negafix-engine`.

pub mod color;
pub mod curve;
pub mod decode;
pub mod encode;
pub mod filters;
pub mod histogram;
pub mod luminance;
pub mod parallel;
pub mod params;
pub mod pipeline;
pub mod transform;

pub use decode::{
    AutoDecoder, DecodeError, DecodeSettings, Decoder, FloatImage, RasterDecoder, RawloaderDecoder,
};
pub use encode::{encode_jpeg, EncodeError};
pub use filters::{Filter, InversionMode};
pub use histogram::{compute_histogram, Histogram};
pub use params::AdjustmentParameters;
pub use pipeline::{Pipeline, PipelineSettings, ProcessingVersion};
