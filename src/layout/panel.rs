//! Single rectangular LED panel
//!
//! Panels are wired along one axis (the inner loop) and step along the
//! other axis (the outer loop). Serpentine panels reverse the inner
//! direction on every odd outer line.

use super::{LayoutSink, LightSource};
use crate::coord::Coord3D;

/// Which axis the wiring follows first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WiringOrder {
    /// Rows: x changes fastest
    RowMajor,
    /// Columns: y changes fastest
    #[default]
    ColumnMajor,
}

#[derive(Debug, Clone)]
pub struct PanelLayout {
    pub width: u16,
    pub height: u16,
    pub wiring: WiringOrder,
    /// First light is on the left
    pub x_increasing: bool,
    /// First light is on the top
    pub y_increasing: bool,
    pub serpentine: bool,
    pub pin: Option<u8>,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self::new(16, 16)
    }
}

impl PanelLayout {
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            wiring: WiringOrder::ColumnMajor,
            x_increasing: true,
            y_increasing: true,
            serpentine: true,
            pin: None,
        }
    }

    #[must_use]
    pub const fn with_wiring(mut self, wiring: WiringOrder, serpentine: bool) -> Self {
        self.wiring = wiring;
        self.serpentine = serpentine;
        self
    }

    #[must_use]
    pub const fn with_pin(mut self, pin: u8) -> Self {
        self.pin = Some(pin);
        self
    }
}

/// Walk `0..len` forwards or backwards
fn walk(len: u16, increasing: bool, mut visit: impl FnMut(u16)) {
    if increasing {
        (0..len).for_each(&mut visit);
    } else {
        (0..len).rev().for_each(&mut visit);
    }
}

impl PanelLayout {
    /// Visit every cell in wiring order
    pub(super) fn for_each_cell(&self, mut visit: impl FnMut(u16, u16)) {
        let (outer_len, outer_inc, inner_len, inner_inc) = match self.wiring {
            WiringOrder::RowMajor => (self.height, self.y_increasing, self.width, self.x_increasing),
            WiringOrder::ColumnMajor => (self.width, self.x_increasing, self.height, self.y_increasing),
        };

        walk(outer_len, outer_inc, |outer| {
            let reversed = self.serpentine && outer % 2 == 1;
            walk(inner_len, inner_inc != reversed, |inner| match self.wiring {
                WiringOrder::RowMajor => visit(inner, outer),
                WiringOrder::ColumnMajor => visit(outer, inner),
            });
        });
    }
}

impl LightSource for PanelLayout {
    fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
        self.for_each_cell(|x, y| sink.add_light(Coord3D::xy(i32::from(x), i32::from(y))));
        sink.next_pin(self.pin);
    }
}
