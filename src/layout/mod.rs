//! Light sources: fixtures that report where their lights are.
//!
//! During both layout passes the physical layer walks every registered
//! source. A source reports each light with [`LayoutSink::add_light`], in
//! wiring order, and closes a pin group with [`LayoutSink::next_pin`].
//! Sources must report the same lights in the same order in both passes.

mod cube;
mod panel;
mod panels;
mod rings;
mod strip;
mod wheel;

use core::fmt;

use alloc::boxed::Box;

pub use cube::{CUBE_FACES, CubeLayout};
pub use panel::{PanelLayout, WiringOrder};
pub use panels::{MAX_PANEL_PINS, PanelsLayout};
pub use rings::RingsLayout;
pub use strip::StripLayout;
pub use wheel::WheelLayout;

use crate::coord::Coord3D;

/// Receiver of discovered lights
pub trait LayoutSink {
    /// Report the next light in wiring order
    fn add_light(&mut self, position: Coord3D);

    /// Close the current pin group, on `pin` or on the next pin in
    /// discovery order
    fn next_pin(&mut self, pin: Option<u8>);
}

/// A fixture that can enumerate its lights
pub trait LightSource {
    fn on_layout(&mut self, sink: &mut dyn LayoutSink);
}

/// Layout slot - enum containing all known fixture layouts
pub enum LayoutSlot {
    Strip(StripLayout),
    Panel(PanelLayout),
    Panels(PanelsLayout),
    Cube(CubeLayout),
    Rings(RingsLayout),
    Wheel(WheelLayout),
    /// Layout implemented outside of this crate
    Custom(Box<dyn LightSource>),
}

impl LightSource for LayoutSlot {
    fn on_layout(&mut self, sink: &mut dyn LayoutSink) {
        match self {
            Self::Strip(layout) => layout.on_layout(sink),
            Self::Panel(layout) => layout.on_layout(sink),
            Self::Panels(layout) => layout.on_layout(sink),
            Self::Cube(layout) => layout.on_layout(sink),
            Self::Rings(layout) => layout.on_layout(sink),
            Self::Wheel(layout) => layout.on_layout(sink),
            Self::Custom(layout) => layout.on_layout(sink),
        }
    }
}

impl fmt::Debug for LayoutSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strip(layout) => f.debug_tuple("Strip").field(layout).finish(),
            Self::Panel(layout) => f.debug_tuple("Panel").field(layout).finish(),
            Self::Panels(layout) => f.debug_tuple("Panels").field(layout).finish(),
            Self::Cube(layout) => f.debug_tuple("Cube").field(layout).finish(),
            Self::Rings(layout) => f.debug_tuple("Rings").field(layout).finish(),
            Self::Wheel(layout) => f.debug_tuple("Wheel").field(layout).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}
