//! Color math shared by the filters: HSB conversion, per-channel affine and
//! polynomial transforms, 3D lookup cubes and color temperature.

mod cube;
mod hsb;
mod matrix;
mod temperature;

pub use cube::{ColorCube, DEFAULT_CUBE_SIZE};
pub use hsb::{hsb_to_rgb, hue_distance, hue_in_range, rgb_to_hsb, Hsb};
pub use matrix::{ChannelPolynomial, ColorMatrix, IDENTITY_POLYNOMIAL};
pub use temperature::{
    kelvin_to_rgb_multipliers, relative_temperature_multipliers, NEUTRAL_TEMPERATURE,
};
