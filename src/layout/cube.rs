//! Human sized cube: five LED panels around a box, one pin per face.
//!
//! Faces sit one light outside the inner box so the edges don't overlap.
//! The bottom face is left open.

use heapless::Vec;

use super::{LayoutSink, LightSource};
use crate::coord::Coord3D;

pub const CUBE_FACES: usize = 5;

#[derive(Debug, Clone)]
pub struct CubeLayout {
    pub width: u8,
    pub height: u8,
    pub depth: u8,
    /// Pin per face (front, back, top, left, right); missing entries use
    /// the next pin in discovery order
    pub pins: Vec<u8, CUBE_FACES>,
}

impl Default for CubeLayout {
    fn default() -> Self {
        Self::new(10, 10, 10)
    }
}

impl CubeLayout {
    pub fn new(width: u8, height: u8, depth: u8) -> Self {
        Self {
            width,
            height,
            depth,
            pins: Vec::new(),
        }
    }

    fn close_face(&self, face: usize, sink: &mut dyn LayoutSink) {
        sink.next_pin(self.pins.get(face).copied());
    }
}

impl LightSource for CubeLayout {
    fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
        let width = i32::from(self.width);
        let height = i32::from(self.height);
        let depth = i32::from(self.depth);

        // front
        for x in 0..width {
            for y in 0..height {
                sink.add_light(Coord3D::new(x + 1, y + 1, 0));
            }
        }
        self.close_face(0, sink);

        // back
        for x in 0..width {
            for y in 0..height {
                sink.add_light(Coord3D::new(x + 1, y + 1, depth + 1));
            }
        }
        self.close_face(1, sink);

        // top
        for x in 0..width {
            for z in 0..depth {
                sink.add_light(Coord3D::new(x + 1, 0, z + 1));
            }
        }
        self.close_face(2, sink);

        // left
        for z in 0..depth {
            for y in 0..height {
                sink.add_light(Coord3D::new(0, y + 1, z + 1));
            }
        }
        self.close_face(3, sink);

        // right
        for z in 0..depth {
            for y in 0..height {
                sink.add_light(Coord3D::new(width + 1, y + 1, z + 1));
            }
        }
        self.close_face(4, sink);
    }
}
