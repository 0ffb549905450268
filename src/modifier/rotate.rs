//! Rotate modifier
//!
//! Rotates the rendered image around the layer middle using three shear
//! passes in fixed point. Pixels rotated off the layer are dropped.

use core::f32::consts::{PI, SQRT_2};

use embassy_time::Instant;

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;
use crate::math8::{beat16, phase_to_degrees};

const SCALE_SHIFT: u32 = 10;
const FIXED_SCALE: f32 = (1 << SCALE_SHIFT) as f32;
const ROUND: i64 = 1 << (SCALE_SHIFT - 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Clockwise,
    CounterClockwise,
    /// Change direction after every full turn
    Alternate,
}

#[derive(Debug, Clone)]
pub struct RotateModifier {
    pub direction: RotateDirection,
    /// Turns per minute, 0 keeps `static_angle`
    pub bpm: u8,
    /// Angle in degrees used when `bpm` is 0
    pub static_angle: u16,
    /// Grow the layer to the diagonal so corners are not clipped
    pub expand: bool,
    angle: u16,
    prev_angle: u16,
    reverse: bool,
    flip: bool,
    shear_x: i64,
    shear_y: i64,
    middle: Coord3D,
    bounds: Coord3D,
    offset: Coord3D,
}

impl Default for RotateModifier {
    fn default() -> Self {
        Self::new(RotateDirection::Clockwise, 15)
    }
}

impl RotateModifier {
    pub const fn new(direction: RotateDirection, bpm: u8) -> Self {
        Self {
            direction,
            bpm,
            static_angle: 0,
            expand: false,
            angle: 0,
            prev_angle: 0,
            reverse: false,
            flip: false,
            shear_x: 0,
            shear_y: 0,
            middle: Coord3D::ZERO,
            bounds: Coord3D::ONE,
            offset: Coord3D::ZERO,
        }
    }

    /// Current rotation in degrees
    pub const fn angle(&self) -> u16 {
        self.angle
    }

    /// Jump to a fixed angle (degrees)
    pub fn set_angle(&mut self, angle: u16) {
        self.angle = angle % 360;
        self.update_shear();
    }

    #[allow(clippy::cast_possible_truncation)]
    fn update_shear(&mut self) {
        if self.angle == self.prev_angle {
            return;
        }
        match self.direction {
            RotateDirection::Alternate => {
                if self.angle < self.prev_angle {
                    self.reverse = !self.reverse;
                }
            }
            RotateDirection::Clockwise => self.reverse = false,
            RotateDirection::CounterClockwise => self.reverse = true,
        }

        let mut shear_angle = if self.reverse {
            360 - self.angle
        } else {
            self.angle
        };
        self.flip = shear_angle > 90 && shear_angle < 270;
        if self.flip {
            shear_angle = (shear_angle + 180) % 360;
        }

        let radians = f32::from(shear_angle) * PI / 180.0;
        self.shear_x = (-libm::tanf(radians / 2.0) * FIXED_SCALE) as i64;
        self.shear_y = (libm::sinf(radians) * FIXED_SCALE) as i64;
        self.prev_angle = self.angle;
    }
}

impl Modifier for RotateModifier {
    fn affects_rendering(&self) -> bool {
        true
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        self.offset = Coord3D::ZERO;
        if self.expand {
            let size = geometry.size;
            let longest = size.x.max(size.y).max(size.z);
            let diagonal = ((longest as f32) * SQRT_2) as i32;
            let diagonal = diagonal.saturating_add(1);
            self.offset = Coord3D::xy((diagonal - size.x) / 2, (diagonal - size.y) / 2);
            geometry.size = Coord3D::new(diagonal, diagonal, 1);
        }
        self.middle = geometry.size / 2;
        self.bounds = geometry.size;
    }

    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        *position += self.offset;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn transform_frame(&self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        if self.angle == 0 {
            return;
        }
        let plane = Coord3D::new(self.bounds.x, self.bounds.y, 1);
        if position.is_out_of_bounds(plane) {
            *position = Coord3D::SUPPRESSED;
            return;
        }
        let mut point = *position;
        if self.flip {
            point.x = self.bounds.x - 1 - point.x;
            point.y = self.bounds.y - 1 - point.y;
        }

        let dx = i64::from(point.x - self.middle.x);
        let dy = i64::from(point.y - self.middle.y);
        let x1 = dx + ((self.shear_x * dy + ROUND) >> SCALE_SHIFT);
        let y1 = dy + ((self.shear_y * x1 + ROUND) >> SCALE_SHIFT);
        let x2 = x1 + ((self.shear_x * y1 + ROUND) >> SCALE_SHIFT);

        let x = x2 + i64::from(self.middle.x);
        let y = y1 + i64::from(self.middle.y);
        let inside = (0..i64::from(plane.x)).contains(&x) && (0..i64::from(plane.y)).contains(&y);
        *position = if inside {
            Coord3D::xy(x as i32, y as i32)
        } else {
            Coord3D::SUPPRESSED
        };
    }

    fn tick(&mut self, now: Instant) {
        self.angle = if self.bpm == 0 {
            self.static_angle % 360
        } else {
            phase_to_degrees(beat16(self.bpm, now))
        };
        self.update_shear();
    }
}
