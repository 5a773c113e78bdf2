//! Color temperature to RGB multiplier conversion.

/// Temperature treated as neutral by [`relative_temperature_multipliers`].
pub const NEUTRAL_TEMPERATURE: f32 = 6500.0;

/// Convert color temperature in Kelvin to RGB correction multipliers.
///
/// Based on Tanner Helland's approximation of the Planckian locus.
/// Reference: https://tannerhelland.com/2012/09/18/convert-temperature-rgb-algorithm-code.html
///
/// Returns multipliers normalized to green = 1.0 that cancel the tint a light
/// source of this temperature would produce.
#[allow(clippy::excessive_precision)] // Published constants from Tanner Helland algorithm
pub fn kelvin_to_rgb_multipliers(kelvin: f32) -> [f32; 3] {
    let temp = (kelvin / 100.0).clamp(10.0, 400.0);

    let (r, g, b) = if temp <= 66.0 {
        let r = 255.0;
        let g = 99.4708025861 * temp.ln() - 161.1195681661;
        let b = if temp <= 19.0 {
            0.0
        } else {
            138.5177312231 * (temp - 10.0).ln() - 305.0447927307
        };
        (r, g.clamp(0.0, 255.0), b.clamp(0.0, 255.0))
    } else {
        let r = 329.698727446 * (temp - 60.0).powf(-0.1332047592);
        let g = 288.1221695283 * (temp - 60.0).powf(-0.0755148492);
        let b = 255.0;
        (r.clamp(0.0, 255.0), g.clamp(0.0, 255.0), b)
    };

    let g_ref = (g / 255.0).max(0.001);
    [
        g_ref / (r / 255.0).max(0.001),
        1.0,
        g_ref / (b / 255.0).max(0.001),
    ]
}

/// Multipliers for a temperature/tint pair relative to the neutral point.
///
/// `temperature` is in Kelvin; [`NEUTRAL_TEMPERATURE`] with zero tint yields
/// exactly `[1.0, 1.0, 1.0]`. `tint` ranges -100 (magenta) to +100 (green).
pub fn relative_temperature_multipliers(temperature: f32, tint: f32) -> [f32; 3] {
    let neutral = kelvin_to_rgb_multipliers(NEUTRAL_TEMPERATURE);
    let target = kelvin_to_rgb_multipliers(temperature);
    let tint_factor = 1.0 + tint.clamp(-100.0, 100.0) / 200.0;
    [
        target[0] / neutral[0],
        target[1] / neutral[1] * tint_factor,
        target[2] / neutral[2],
    ]
}
