use smart_leds::RGB8;

use crate::math8::scale8;

pub type Rgb = RGB8;

/// Split a color into RGBW channels, moving the common part into white
pub const fn split_white(color: Rgb) -> [u8; 4] {
    let white = min3(color.r, color.g, color.b);
    [color.r - white, color.g - white, color.b - white, white]
}

/// Scale every channel of a color (0-255 = 0.0-1.0)
pub const fn scale_rgb(color: Rgb, scale: u8) -> Rgb {
    Rgb {
        r: scale8(color.r, scale),
        g: scale8(color.g, scale),
        b: scale8(color.b, scale),
    }
}

const fn min3(a: u8, b: u8, c: u8) -> u8 {
    let ab = if a < b { a } else { b };
    if ab < c { ab } else { c }
}
