//! Circle modifier
//!
//! Projects every light onto its distance from the fixture center, so a
//! 1D effect renders as rings (2D) or shells (3D).

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;

#[derive(Debug, Clone, Default)]
pub struct CircleModifier {
    source_size: Coord3D,
}

impl CircleModifier {
    #[allow(clippy::cast_possible_truncation)]
    fn radius(&self, position: Coord3D) -> i32 {
        position.distance(self.source_size / 2) as i32
    }
}

impl Modifier for CircleModifier {
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        self.source_size = geometry.size;
        // the far corner has the largest radius
        let radius = self.radius(geometry.size);
        geometry.size = Coord3D::new(radius.saturating_add(1), 1, 1);
    }

    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        *position = Coord3D::line(self.radius(*position));
    }
}
