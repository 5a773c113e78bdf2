//! Image encoding.
//!
//! Processed images leave the core as JPEG: thumbnails written to the disk
//! cache and previews handed to a presentation layer.

mod jpeg;

pub use jpeg::{encode_jpeg, encode_rgb8_jpeg, EncodeError};
