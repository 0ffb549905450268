use core::f32::consts::PI;

use super::{LayoutSink, LightSource};
use crate::coord::Coord3D;

/// Spokes radiating from a center, each wired outward, all on one pin
#[derive(Debug, Clone)]
pub struct WheelLayout {
    pub nr_of_spokes: u8,
    pub lights_per_spoke: u8,
    pub pin: Option<u8>,
}

impl Default for WheelLayout {
    fn default() -> Self {
        Self::new(12, 16)
    }
}

impl WheelLayout {
    pub const fn new(nr_of_spokes: u8, lights_per_spoke: u8) -> Self {
        Self {
            nr_of_spokes,
            lights_per_spoke,
            pin: None,
        }
    }

    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }
}

impl LightSource for WheelLayout {
    #[allow(clippy::cast_possible_truncation)]
    fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
        let middle = f32::from(self.lights_per_spoke);
        let spokes = u32::from(self.nr_of_spokes.max(1));

        for spoke in 0..u32::from(self.nr_of_spokes) {
            // whole degrees, so spokes of uneven counts keep their spacing
            let degrees = (spoke * 360 / spokes) as u16;
            let radians = f32::from(degrees) * PI / 180.0;
            let (sin, cos) = (libm::sinf(radians), libm::cosf(radians));

            for light in 0..self.lights_per_spoke {
                let radius = f32::from(light) + 1.0;
                let x = radius * sin + middle;
                let y = radius * cos + middle;
                sink.add_light(Coord3D::xy(x as i32, y as i32));
            }
        }
        sink.next_pin(self.pin);
    }
}
