fn srgb_to_linear_channel(x: f32) -> f32 {
    // https://en.wikipedia.org/wiki/SRGB
    if x < 0.040_45 {
        if x < 0.0 { 0.0 } else { x / 12.92 }
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Decode one 0-255 sRGB channel into linear space.
///
/// Example:
/// ```
/// use blendup_import::color::srgb8_to_linear;
/// assert!((srgb8_to_linear(255.0) - 1.0).abs() < 1e-6);
/// ```
pub fn srgb8_to_linear(v: f32) -> f32 {
    srgb_to_linear_channel(v / 255.0)
}

/// Decode a 0-255 sRGB triple into a linear RGBA color with opaque alpha.
pub fn srgb8_to_linear_rgba([r, g, b]: [f32; 3]) -> [f32; 4] {
    [
        srgb8_to_linear(r),
        srgb8_to_linear(g),
        srgb8_to_linear(b),
        1.0,
    ]
}
