//! Mirror modifier
//!
//! Halves the selected axes so the second half of the fixture repeats the
//! first half in reverse.

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;

#[derive(Debug, Clone)]
pub struct MirrorModifier {
    pub mirror_x: bool,
    pub mirror_y: bool,
    pub mirror_z: bool,
    half: Coord3D,
}

impl Default for MirrorModifier {
    fn default() -> Self {
        Self::new(true, false, false)
    }
}

impl MirrorModifier {
    pub const fn new(mirror_x: bool, mirror_y: bool, mirror_z: bool) -> Self {
        Self {
            mirror_x,
            mirror_y,
            mirror_z,
            half: Coord3D::ONE,
        }
    }
}

const fn fold(value: i32, half: i32) -> i32 {
    if value >= half { half * 2 - 1 - value } else { value }
}

impl Modifier for MirrorModifier {
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        let size = &mut geometry.size;
        if self.mirror_x {
            size.x = (size.x + 1) / 2;
        }
        if self.mirror_y {
            size.y = (size.y + 1) / 2;
        }
        if self.mirror_z {
            size.z = (size.z + 1) / 2;
        }
        self.half = *size;
    }

    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        if self.mirror_x {
            position.x = fold(position.x, self.half.x);
        }
        if self.mirror_y {
            position.y = fold(position.y, self.half.y);
        }
        if self.mirror_z {
            position.z = fold(position.z, self.half.z);
        }
    }
}
