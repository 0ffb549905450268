//! Multiply modifier
//!
//! Tiles the fixture into repeated cells, optionally mirroring every other
//! cell.

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;

#[derive(Debug, Clone)]
pub struct MultiplyModifier {
    /// Number of cells per axis
    pub factors: Coord3D,
    /// Mirror odd cells
    pub mirror: bool,
    cell: Coord3D,
}

impl Default for MultiplyModifier {
    fn default() -> Self {
        Self::new(Coord3D::new(2, 2, 2), false)
    }
}

impl MultiplyModifier {
    pub const fn new(factors: Coord3D, mirror: bool) -> Self {
        Self {
            factors,
            mirror,
            cell: Coord3D::ONE,
        }
    }
}

impl Modifier for MultiplyModifier {
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        let factors = self.factors.at_least_one();
        // round up so partial cells still get a slot
        geometry.size = (geometry.size + factors - Coord3D::ONE) / factors;
        self.cell = geometry.size.at_least_one();
    }

    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        let cell = self.cell;
        if !self.mirror {
            *position = *position % cell;
            return;
        }

        let quadrant = *position / cell;
        *position = *position % cell;
        if quadrant.x % 2 != 0 {
            position.x = cell.x - 1 - position.x;
        }
        if quadrant.y % 2 != 0 {
            position.y = cell.y - 1 - position.y;
        }
        if quadrant.z % 2 != 0 {
            position.z = cell.z - 1 - position.z;
        }
    }
}
