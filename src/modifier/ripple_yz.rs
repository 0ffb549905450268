//! Ripple modifier
//!
//! Lets an effect with fewer dimensions than the fixture fill it. With
//! `shrink` the layer collapses onto the first row (or plane) so every
//! light shows the effect's line. Without it the effect draws that line
//! and [`RippleYZModifier::ripple`] pushes older lines further along y or
//! z every frame.

use super::{LayerGeometry, Modifier};
use crate::coord::Coord3D;
use crate::virtual_layer::LayerCanvas;

#[derive(Debug, Clone, Copy)]
pub struct RippleYZModifier {
    pub shrink: bool,
    pub towards_y: bool,
    pub towards_z: bool,
}

impl Default for RippleYZModifier {
    fn default() -> Self {
        Self::new(true, true, false)
    }
}

impl RippleYZModifier {
    pub const fn new(shrink: bool, towards_y: bool, towards_z: bool) -> Self {
        Self {
            shrink,
            towards_y,
            towards_z,
        }
    }

    /// Shift the rendered lines one step along the ripple axes.
    ///
    /// `effect_dimension` is the number of axes the effect draws; only
    /// layers with more axes ripple.
    pub fn ripple(&self, canvas: &mut LayerCanvas<'_>, effect_dimension: u8) {
        let size = canvas.size();
        let layer_dimension = canvas.layer().geometry().dimension;

        if self.towards_y && effect_dimension == 1 && layer_dimension > 1 {
            for y in (1..size.y).rev() {
                for x in 0..size.x {
                    let color = canvas.get_rgb(Coord3D::xy(x, y - 1));
                    canvas.set_rgb(Coord3D::xy(x, y), color);
                }
            }
        }

        if self.towards_z && effect_dimension < 3 && layer_dimension == 3 {
            for z in (1..size.z).rev() {
                for y in 0..size.y {
                    for x in 0..size.x {
                        let color = canvas.get_rgb(Coord3D::new(x, y, z - 1));
                        canvas.set_rgb(Coord3D::new(x, y, z), color);
                    }
                }
            }
        }
    }
}

impl Modifier for RippleYZModifier {
    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        if !self.shrink {
            return;
        }
        if self.towards_y {
            geometry.size.y = 1;
        }
        if self.towards_z {
            geometry.size.z = 1;
        }
    }

    fn transform_placement(&mut self, position: &mut Coord3D, _geometry: &LayerGeometry) {
        if !self.shrink {
            return;
        }
        if self.towards_y {
            position.y = 0;
        }
        if self.towards_z {
            position.z = 0;
        }
    }
}
