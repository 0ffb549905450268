//! Checkerboard modifier
//!
//! Excludes every other square of the fixture from the layer. Excluded
//! lights are blanked during the virtual pass.

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;

#[derive(Debug, Clone)]
pub struct CheckerboardModifier {
    /// Size of one square
    pub square: Coord3D,
    /// Show the other half of the squares
    pub invert: bool,
    /// Collapse every square into a single virtual light
    pub group: bool,
}

impl Default for CheckerboardModifier {
    fn default() -> Self {
        Self::new(Coord3D::new(3, 3, 3), false, false)
    }
}

impl CheckerboardModifier {
    pub const fn new(square: Coord3D, invert: bool, group: bool) -> Self {
        Self {
            square,
            invert,
            group,
        }
    }
}

impl Modifier for CheckerboardModifier {
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        if self.group {
            let square = self.square.at_least_one();
            geometry.middle /= square;
            geometry.size = (geometry.size + square - Coord3D::ONE) / square;
        }
    }

    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        let square = self.square.at_least_one();
        let check = *position / square;
        if self.group {
            *position /= square;
        }

        let even = (check.x + check.y + check.z) % 2 == 0;
        if even == self.invert {
            position.suppress();
        }
    }
}
