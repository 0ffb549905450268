//! Transpose modifier: swaps axes of the layer.

use core::mem::swap;

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;

#[derive(Debug, Clone)]
pub struct TransposeModifier {
    pub xy: bool,
    pub xz: bool,
    pub yz: bool,
}

impl Default for TransposeModifier {
    fn default() -> Self {
        Self {
            xy: true,
            xz: false,
            yz: false,
        }
    }
}

impl TransposeModifier {
    fn apply(&self, point: &mut Coord3D) {
        if self.xy {
            swap(&mut point.x, &mut point.y);
        }
        if self.xz {
            swap(&mut point.x, &mut point.z);
        }
        if self.yz {
            swap(&mut point.y, &mut point.z);
        }
    }
}

impl Modifier for TransposeModifier {
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        self.apply(&mut geometry.size);
    }

    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        self.apply(position);
    }
}
