//! Lossless orientation changes: quarter turns and mirroring.

use crate::decode::{FloatImage, CHANNELS};

/// Rotate clockwise by `turns` quarter turns (taken modulo 4).
pub fn rotate_quarter_turns(image: &FloatImage, turns: u8) -> FloatImage {
    let turns = turns % 4;
    if turns == 0 || image.is_empty() {
        return image.clone();
    }

    let (w, h) = (image.width, image.height);
    let (out_w, out_h) = if turns == 2 { (w, h) } else { (h, w) };
    let mut output = Vec::with_capacity(image.pixels.len());

    for dy in 0..out_h {
        for dx in 0..out_w {
            let (sx, sy) = match turns {
                1 => (dy, h - 1 - dx),
                2 => (w - 1 - dx, h - 1 - dy),
                _ => (w - 1 - dy, dx),
            };
            output.extend_from_slice(&image.pixel(sx, sy));
        }
    }

    FloatImage::new(out_w, out_h, output)
}

/// Mirror horizontally and/or vertically.
pub fn mirror(image: &FloatImage, horizontal: bool, vertical: bool) -> FloatImage {
    if (!horizontal && !vertical) || image.is_empty() {
        return image.clone();
    }

    let w = image.width as usize;
    let h = image.height as usize;
    let mut output = vec![0.0f32; image.pixels.len()];

    for y in 0..h {
        let sy = if vertical { h - 1 - y } else { y };
        for x in 0..w {
            let sx = if horizontal { w - 1 - x } else { x };
            let src = (sy * w + sx) * CHANNELS;
            let dst = (y * w + x) * CHANNELS;
            output[dst..dst + CHANNELS].copy_from_slice(&image.pixels[src..src + CHANNELS]);
        }
    }

    FloatImage::new(image.width, image.height, output)
}
