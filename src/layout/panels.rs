//! Wall of identical panels, one pin per panel
//!
//! The wall itself is wired like a panel whose cells are whole panels:
//! `grid` gives the panel count per axis and the order the panels are
//! chained in, `panel` the wiring inside each of them.

use heapless::Vec;

use super::{LayoutSink, LightSource, PanelLayout};
use crate::coord::Coord3D;

/// Most panel pins that can be listed
pub const MAX_PANEL_PINS: usize = 16;

#[derive(Debug, Clone)]
pub struct PanelsLayout {
    /// Panels per row and column and the order they are chained in
    pub grid: PanelLayout,
    pub panel: PanelLayout,
    /// Pin per panel in chaining order; missing entries use the next pin
    /// in discovery order
    pub pins: Vec<u8, MAX_PANEL_PINS>,
}

impl Default for PanelsLayout {
    fn default() -> Self {
        Self::new(2, 2, PanelLayout::default())
    }
}

impl PanelsLayout {
    pub fn new(horizontal: u16, vertical: u16, panel: PanelLayout) -> Self {
        Self {
            grid: PanelLayout::new(horizontal, vertical),
            panel,
            pins: Vec::new(),
        }
    }
}

impl LightSource for PanelsLayout {
    fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
        let width = i32::from(self.panel.width);
        let height = i32::from(self.panel.height);
        let mut chained = 0;

        self.grid.for_each_cell(|panel_x, panel_y| {
            let origin = Coord3D::xy(i32::from(panel_x) * width, i32::from(panel_y) * height);
            self.panel.for_each_cell(|x, y| {
                sink.add_light(origin + Coord3D::xy(i32::from(x), i32::from(y)));
            });
            sink.next_pin(self.pins.get(chained).copied());
            chained += 1;
        });
    }
}
