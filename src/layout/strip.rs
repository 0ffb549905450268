use super::{LayoutSink, LightSource};
use crate::coord::Coord3D;

/// Straight line of lights along the x axis, on one pin
#[derive(Debug, Clone)]
pub struct StripLayout {
    pub lights: u16,
    pub pin: Option<u8>,
}

impl StripLayout {
    pub const fn new(lights: u16) -> Self {
        Self { lights, pin: None }
    }

    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }
}

impl LightSource for StripLayout {
    fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
        for x in 0..self.lights {
            sink.add_light(Coord3D::line(i32::from(x)));
        }
        sink.next_pin(self.pin);
    }
}
