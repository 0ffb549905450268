//! Pinwheel modifier
//!
//! Remaps the plane into petals around the fixture middle: x becomes the
//! petal (angle) and, on 2D fixtures, y becomes the distance to the middle.

use core::f32::consts::PI;

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;

/// Divisors of 360, indexed by symmetry - 1
const FACTORS: [u16; 23] = [
    360, 180, 120, 90, 72, 60, 45, 40, 36, 30, 24, 20, 18, 15, 12, 10, 9, 8, 6, 5, 4, 3, 2,
];

#[derive(Debug, Clone)]
pub struct PinwheelModifier {
    pub petals: u8,
    /// Swirl strength, negative values swirl the other way
    pub swirl: i8,
    pub reverse: bool,
    pub symmetry: u8,
    /// Extra rotation per z plane, in degrees
    pub z_twist: u8,
    petal_width: f32,
    planar: bool,
    middle: Coord3D,
}

impl Default for PinwheelModifier {
    fn default() -> Self {
        Self::new(60, 30, 1)
    }
}

impl PinwheelModifier {
    pub const fn new(petals: u8, swirl: i8, symmetry: u8) -> Self {
        Self {
            petals,
            swirl,
            reverse: false,
            symmetry,
            z_twist: 0,
            petal_width: 6.0,
            planar: false,
            middle: Coord3D::ZERO,
        }
    }

    fn factor(&self) -> u16 {
        match self.symmetry {
            0 => 360,
            s if usize::from(s) > FACTORS.len() => 2,
            s => FACTORS[usize::from(s) - 1],
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn offset(from: i32, to: i32) -> f32 {
    (i64::from(to) - i64::from(from)) as f32
}

impl Modifier for PinwheelModifier {
    #[allow(clippy::cast_possible_truncation)]
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        self.petals = self.petals.max(1);
        self.middle = geometry.middle;
        self.planar = geometry.dimension > 1;

        let petals = i32::from(self.petals);
        if self.planar {
            let size = geometry.size;
            let reach_x = offset(self.middle.x, size.x).max(offset(0, self.middle.x));
            let reach_y = offset(self.middle.y, size.y).max(offset(0, self.middle.y));
            let radius = libm::hypotf(reach_x, reach_y) as i32;
            geometry.size = Coord3D::new(petals, radius.saturating_add(1), 1);
        } else {
            geometry.size = Coord3D::new(petals, 1, 1);
        }

        self.petal_width = f32::from(self.factor()) / f32::from(self.petals);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        let dx = offset(self.middle.x, position.x);
        let dy = offset(self.middle.y, position.y);
        let distance = libm::hypotf(dx, dy);
        let swirl_factor = if self.swirl == 0 {
            0
        } else {
            (distance * f32::from(self.swirl.unsigned_abs())) as i64
        };

        let radians = libm::atan2f(dy, dx);
        let mut angle = (radians * 180.0 / PI) as i64 + 180;
        if self.swirl < 0 {
            angle = 360 - angle;
        }

        let petals = i32::from(self.petals);
        let value = angle + swirl_factor + i64::from(self.z_twist) * i64::from(position.z);
        let mut petal = ((value as f32 / self.petal_width) as i32).rem_euclid(petals);
        if self.reverse {
            petal = petals - petal - 1;
        }

        let radius = if self.planar { distance as i32 } else { 0 };
        *position = Coord3D::new(petal, radius, 0);
    }
}
