use super::{LayoutSink, LightSource};
use crate::coord::Coord3D;
use crate::math8::{cos8, sin8};

/// Concentric rings as (lights, radius in tenths of a grid step), center
/// first
const RINGS: [(u16, u8); 9] = [
    (1, 0),
    (8, 13),
    (12, 23),
    (16, 33),
    (24, 43),
    (32, 53),
    (40, 63),
    (48, 73),
    (60, 83),
];

/// 241-light ring disc, centered on a `width` x `height` grid, on one pin
#[derive(Debug, Clone)]
pub struct RingsLayout {
    pub width: u8,
    pub height: u8,
    pub pin: Option<u8>,
}

impl Default for RingsLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl RingsLayout {
    pub const fn new() -> Self {
        Self {
            width: 16,
            height: 16,
            pin: None,
        }
    }

    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }

    /// Total number of lights reported
    pub fn nr_of_lights() -> usize {
        RINGS.iter().map(|&(lights, _)| usize::from(lights)).sum()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn add_ring(&self, sink: &mut dyn LayoutSink, lights: u16, radius: u8) {
        let center_x = f32::from(self.width) / 2.0;
        let center_y = f32::from(self.height) / 2.0;
        let radius = f32::from(radius) / 10.0;

        for i in 0..lights {
            let (x, y) = if lights == 1 {
                (center_x, center_y)
            } else {
                let theta = (255 * u32::from(i) / u32::from(lights - 1)) as u8;
                (
                    center_x + unit(sin8(theta)) * radius,
                    center_y + unit(cos8(theta)) * radius,
                )
            };
            // grid cells are whole, negative overshoot lands on zero
            sink.add_light(Coord3D::xy(i32::from(x as u8), i32::from(y as u8)));
        }
    }
}

/// Map an 8-bit wave sample to roughly -1.0..=1.0
fn unit(sample: u8) -> f32 {
    (f32::from(sample) - 127.0) / 127.0
}

impl LightSource for RingsLayout {
    fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
        for (lights, radius) in RINGS {
            self.add_ring(sink, lights, radius);
        }
        sink.next_pin(self.pin);
    }
}
